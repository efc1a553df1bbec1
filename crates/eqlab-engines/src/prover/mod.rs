//! Bounded proof search.
//!
//! The rewriting prover is advisory: it runs only after an implication has
//! been confirmed by model search, to attach a short witness trace. It never
//! contradicts the model-search oracle; a failed proof attempt is a status,
//! not a refutation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use eqlab_core::errors::{EqlabError, EqlabResult};

mod rewriting;

pub use rewriting::prove;

/// Deterministic orderings of the derived rewrite rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOrdering {
    #[default]
    Given,
    Reverse,
    ShortestLhs,
    LongestLhs,
}

impl RuleOrdering {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "given",
            Self::Reverse => "reverse",
            Self::ShortestLhs => "shortest_lhs",
            Self::LongestLhs => "longest_lhs",
        }
    }
}

impl FromStr for RuleOrdering {
    type Err = EqlabError;

    fn from_str(text: &str) -> EqlabResult<Self> {
        match text {
            "given" => Ok(Self::Given),
            "reverse" => Ok(Self::Reverse),
            "shortest_lhs" => Ok(Self::ShortestLhs),
            "longest_lhs" => Ok(Self::LongestLhs),
            other => Err(EqlabError::invalid_argument(format!(
                "unknown rule ordering: {other}"
            ))),
        }
    }
}

/// Budget for one proof search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProofSearchConfig {
    pub max_seconds: f64,
    /// Maximum rewrite path depth.
    pub max_steps: usize,
    /// Maximum distinct terms visited.
    pub max_terms: usize,
    pub rule_ordering: RuleOrdering,
}

impl Default for ProofSearchConfig {
    fn default() -> Self {
        Self {
            max_seconds: 1.0,
            max_steps: 4,
            max_terms: 500,
            rule_ordering: RuleOrdering::Given,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofStatus {
    Proved,
    Timeout,
    Cutoff,
    Unknown,
}

impl ProofStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proved => "proved",
            Self::Timeout => "timeout",
            Self::Cutoff => "cutoff",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rewrite in a proof trace: `left` became `right` by `rule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub rule: String,
    pub left: String,
    pub right: String,
}

/// Result of one proof search. Steps are present only on `proved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofOutcome {
    pub status: ProofStatus,
    pub elapsed_seconds: f64,
    pub steps: Option<Vec<ProofStep>>,
}
