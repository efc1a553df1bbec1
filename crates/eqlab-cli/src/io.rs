//! File inputs: universe specs and axiom lists.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use eqlab_core::canonical::Equation;
use eqlab_core::spec::UniverseSpec;

pub fn read_spec(path: impl AsRef<Path>) -> Result<UniverseSpec> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read spec file {}", path.display()))?;
    UniverseSpec::from_json(&text)
        .with_context(|| format!("invalid universe spec in {}", path.display()))
}

/// One `L = R` equation per line; blank lines and `#` comments are ignored.
pub fn read_axioms(path: impl AsRef<Path>) -> Result<Vec<Equation>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read axiom file {}", path.display()))?;
    let mut axioms = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let equation = Equation::parse(line)
            .with_context(|| format!("invalid axiom at {}:{}", path.display(), line_no + 1))?;
        axioms.push(equation);
    }
    Ok(axioms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axiom_files_skip_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("axioms.txt");
        fs::write(&path, "# header\n\nf(x0,x1) = x0\nf(x0,x0)=x0\n").unwrap();
        let axioms = read_axioms(&path).unwrap();
        assert_eq!(axioms.len(), 2);
        assert_eq!(axioms[0].key(), "f(x0,x1)=x0");
    }

    #[test]
    fn bad_axiom_lines_name_the_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("axioms.txt");
        fs::write(&path, "f(x0,x1 = x0\n").unwrap();
        let err = read_axioms(&path).err().unwrap();
        assert!(format!("{err:#}").contains(":1"));
    }
}
