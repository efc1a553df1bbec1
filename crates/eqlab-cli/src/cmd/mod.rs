use anyhow::Result;

use crate::args::{Cli, Command};

mod doctor;
mod interpret;
mod replay;
mod run;

pub fn dispatch(cli: Cli) -> Result<()> {
    let store_root = cli.store_root.clone();
    match cli.command {
        Command::Run {
            spec,
            axioms,
            out,
            engine,
            max_model_size,
            max_model_candidates,
            max_model_seconds,
            max_neighbors,
        } => run::run(
            store_root.as_deref(),
            &spec,
            axioms.as_deref(),
            &out,
            run::RunOptions {
                engine,
                max_model_size,
                max_model_candidates,
                max_model_seconds,
                max_neighbors,
            },
        ),
        Command::Replay { run_dir, run_id } => {
            replay::run(store_root.as_deref(), run_dir.as_deref(), run_id.as_deref())
        }
        Command::Interpret {
            run_dir,
            run_id,
            index,
            neighbors,
        } => interpret::run(
            store_root.as_deref(),
            run_dir.as_deref(),
            run_id.as_deref(),
            index,
            neighbors,
        ),
        Command::Doctor => doctor::run(store_root.as_deref()),
    }
}
