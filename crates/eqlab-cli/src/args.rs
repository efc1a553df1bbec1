use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "eqlab", version, about = "EQLAB CLI")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Artifact store root directory. Most commands work without a store;
    /// passing one enables cross-run archiving and store-backed replay.
    #[arg(long, global = true)]
    pub store_root: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the analysis battery over a set of axioms.
    Run {
        /// Universe spec JSON file.
        #[arg(long)]
        spec: String,

        /// Axiom list file (one `L = R` per line). Without it, every
        /// candidate axiom of the spec is enumerated.
        #[arg(long)]
        axioms: Option<String>,

        /// Output directory for run.json and results.jsonl.
        #[arg(long, default_value = "./out")]
        out: String,

        /// Model search engine: naive|prunable.
        #[arg(long, default_value = "prunable")]
        engine: String,

        /// Maximum model domain size for the spectrum sweep.
        #[arg(long, default_value_t = 3)]
        max_model_size: usize,

        /// Candidate budget per model search.
        #[arg(long, default_value_t = 10_000)]
        max_model_candidates: u64,

        /// Wall-clock budget per model search, in seconds.
        #[arg(long, default_value_t = 1.0)]
        max_model_seconds: f64,

        /// Perturbation neighbor cap.
        #[arg(long, default_value_t = 8)]
        max_neighbors: usize,
    },

    /// Reload a persisted run and summarize it.
    Replay {
        /// Run directory containing run.json (directory replay).
        #[arg(long)]
        run_dir: Option<String>,

        /// Run id to load from the store (requires --store-root).
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Assemble the dossier for one axiom of a persisted run.
    Interpret {
        /// Run directory containing run.json (directory replay).
        #[arg(long)]
        run_dir: Option<String>,

        /// Run id to load from the store (requires --store-root).
        #[arg(long)]
        run_id: Option<String>,

        /// Position of the axiom within the run.
        #[arg(long, default_value_t = 0)]
        index: usize,

        /// Nearest-neighbor count.
        #[arg(long, default_value_t = 3)]
        neighbors: usize,
    },

    /// Run environment checks.
    Doctor,
}
