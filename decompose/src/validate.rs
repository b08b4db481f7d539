//! Validation for `decompose validate`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::io::config::{Settings, load_rules};
use crate::library::Library;

/// A loaded, validated rule library ready to run.
#[derive(Debug, Clone)]
pub struct LoadedRules {
    pub settings: Settings,
    pub library: Library,
    pub outcome: ValidateOutcome,
}

/// Summary of a valid rule library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOutcome {
    pub gates: usize,
    pub intercepts: usize,
    pub fallbacks: usize,
}

/// Load and validate the rule library at `path`.
pub fn validate_rules(path: &Path) -> Result<LoadedRules> {
    let rules = load_rules(path).with_context(|| "load rules")?;
    let library = Library::from_rules(&rules)?;
    let outcome = ValidateOutcome {
        gates: library.gate_count(),
        intercepts: rules.intercept.len(),
        fallbacks: rules.fallback.len(),
    };
    Ok(LoadedRules {
        settings: rules.settings,
        library,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::{RulesFile, write_rules};
    use crate::test_support::temp_file;

    #[test]
    fn validate_counts_sample_library() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("decompose.toml");
        write_rules(&path, &RulesFile::sample()).expect("write");

        let loaded = validate_rules(&path).expect("validate");
        assert_eq!(loaded.settings, RulesFile::sample().settings);
        assert_eq!(
            loaded.outcome,
            ValidateOutcome {
                gates: 8,
                intercepts: 0,
                fallbacks: 0,
            }
        );
    }

    #[test]
    fn validate_rejects_unknown_body_gate() {
        let (_dir, path) = temp_file(
            "decompose.toml",
            "[[gate]]\nname = \"A\"\narity = 1\nbody = [{ gate = \"B\", targets = [0] }]\n",
        )
        .expect("write");
        let err = validate_rules(&path).expect_err("invalid");
        assert!(format!("{err:#}").contains("unknown gate 'B'"));
    }
}
