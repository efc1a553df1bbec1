//! Dossier contract validation.
//!
//! A dossier is rejected wholesale when any fact or derived law lacks a
//! `source`, or any narrative line lacks a `[citation]` token. Producing an
//! uncited dossier is a contract breach in the artifact, so this surfaces
//! as an error rather than a status.

use serde_json::Value;

use eqlab_core::errors::{EqlabError, EqlabResult};

/// Does the line contain a `[...]` citation with non-empty body?
fn has_citation(line: &str) -> bool {
    let mut open = None;
    for (idx, ch) in line.char_indices() {
        match ch {
            '[' => open = Some(idx),
            ']' => {
                if let Some(start) = open {
                    if idx > start + 1 {
                        return true;
                    }
                }
                open = None;
            }
            _ => {}
        }
    }
    false
}

fn check_sourced_list(dossier: &Value, field: &str) -> EqlabResult<()> {
    let facts = dossier
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| EqlabError::invariant(format!("dossier {field} must be a list")))?;
    for fact in facts {
        let sourced = fact
            .get("source")
            .and_then(Value::as_str)
            .is_some_and(|source| !source.is_empty());
        if !sourced {
            return Err(EqlabError::invariant(format!(
                "dossier {field} entries must include citation sources"
            )));
        }
    }
    Ok(())
}

/// Validate the citation invariants of a serialized dossier.
pub fn validate_dossier(dossier: &Value) -> EqlabResult<()> {
    check_sourced_list(dossier, "facts")?;
    check_sourced_list(dossier, "derived_laws")?;

    let narrative = dossier
        .get("narrative")
        .and_then(Value::as_array)
        .ok_or_else(|| EqlabError::invariant("dossier narrative must be a list"))?;
    for line in narrative {
        let cited = line.as_str().is_some_and(has_citation);
        if !cited {
            return Err(EqlabError::invariant(
                "dossier narrative lines must include citations",
            ));
        }
    }
    Ok(())
}
