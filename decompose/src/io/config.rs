//! Rule library stored in `decompose.toml`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default rule library file name, relative to the working directory.
pub const DEFAULT_RULES_PATH: &str = "decompose.toml";

static GATE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Rule library (TOML).
///
/// Intended to be edited by humans. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RulesFile {
    pub settings: Settings,

    /// Gate definitions; `[[gate]]` tables.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gate: Vec<GateSpec>,

    /// Bodies tried before a gate's own body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intercept: Vec<OverrideSpec>,

    /// Bodies tried after a gate declines.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fallback: Vec<OverrideSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Gate names accepted as-is. Absent means "expand until impossible".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep: Option<Vec<String>>,

    /// What to do with operations that are neither kept nor expandable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_stuck: Option<StuckMode>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StuckMode {
    /// Fail on the first stuck operation.
    Error,
    /// Keep stuck operations in the output.
    Keep,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateSpec {
    pub name: String,
    pub arity: usize,

    /// Missing: the gate declines to decompose. Empty: the gate dissolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<Application>>,
}

/// One gate applied to a subset of the enclosing gate's targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    pub gate: String,
    /// Positions into the enclosing gate's targets.
    pub targets: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverrideSpec {
    pub name: String,
    pub body: Vec<Application>,
}

impl RulesFile {
    pub fn validate(&self) -> Result<()> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            return Ok(());
        }
        Err(anyhow!("invalid rules:\n- {}", errors.join("\n- ")))
    }

    /// Semantic checks serde cannot express.
    ///
    /// Rewrite cycles are not detected.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut arities: HashMap<&str, usize> = HashMap::new();

        for gate in &self.gate {
            if !GATE_NAME_RE.is_match(&gate.name) {
                errors.push(format!("gate name '{}' is not an identifier", gate.name));
            }
            if gate.arity == 0 {
                errors.push(format!("gate '{}': arity must be > 0", gate.name));
            }
            if arities.insert(gate.name.as_str(), gate.arity).is_some() {
                errors.push(format!("duplicate gate '{}'", gate.name));
            }
        }

        for gate in &self.gate {
            if let Some(body) = &gate.body {
                let context = format!("gate '{}'", gate.name);
                check_body(&context, gate.arity, body, &arities, &mut errors);
            }
        }

        for (section, overrides) in [("intercept", &self.intercept), ("fallback", &self.fallback)] {
            let mut seen = HashSet::new();
            for spec in overrides {
                let context = format!("{} '{}'", section, spec.name);
                if !seen.insert(spec.name.as_str()) {
                    errors.push(format!("duplicate {context}"));
                }
                match arities.get(spec.name.as_str()) {
                    Some(&arity) => check_body(&context, arity, &spec.body, &arities, &mut errors),
                    None => errors.push(format!("{context}: unknown gate")),
                }
            }
        }

        for name in self.settings.keep.iter().flatten() {
            if !arities.contains_key(name.as_str()) {
                errors.push(format!("settings.keep: unknown gate '{name}'"));
            }
        }

        errors
    }

    /// Starter library written by `decompose init`.
    pub fn sample() -> Self {
        let gate = |name: &str, arity: usize, body: Option<Vec<Application>>| GateSpec {
            name: name.to_string(),
            arity,
            body,
        };
        let app = |name: &str, targets: &[usize]| Application {
            gate: name.to_string(),
            targets: targets.to_vec(),
        };
        RulesFile {
            settings: Settings {
                keep: Some(vec![
                    "H".to_string(),
                    "T".to_string(),
                    "TDAG".to_string(),
                    "CNOT".to_string(),
                ]),
                on_stuck: None,
            },
            gate: vec![
                gate("H", 1, None),
                gate("T", 1, None),
                gate("TDAG", 1, None),
                gate("CNOT", 2, None),
                gate("I", 1, Some(Vec::new())),
                gate(
                    "SWAP",
                    2,
                    Some(vec![app("CNOT", &[0, 1]), app("CNOT", &[1, 0]), app("CNOT", &[0, 1])]),
                ),
                gate(
                    "CCZ",
                    3,
                    Some(vec![
                        app("CNOT", &[1, 2]),
                        app("TDAG", &[2]),
                        app("CNOT", &[0, 2]),
                        app("T", &[2]),
                        app("CNOT", &[1, 2]),
                        app("TDAG", &[2]),
                        app("CNOT", &[0, 2]),
                        app("T", &[1]),
                        app("T", &[2]),
                        app("CNOT", &[0, 1]),
                        app("T", &[0]),
                        app("TDAG", &[1]),
                        app("CNOT", &[0, 1]),
                    ]),
                ),
                gate(
                    "TOFFOLI",
                    3,
                    Some(vec![app("H", &[2]), app("CCZ", &[0, 1, 2]), app("H", &[2])]),
                ),
            ],
            intercept: Vec::new(),
            fallback: Vec::new(),
        }
    }
}

fn check_body(
    context: &str,
    arity: usize,
    body: &[Application],
    arities: &HashMap<&str, usize>,
    errors: &mut Vec<String>,
) {
    for (index, app) in body.iter().enumerate() {
        let Some(&expected) = arities.get(app.gate.as_str()) else {
            errors.push(format!("{context}: body[{index}] uses unknown gate '{}'", app.gate));
            continue;
        };
        if app.targets.len() != expected {
            errors.push(format!(
                "{context}: body[{index}] gives '{}' {} targets, expected {}",
                app.gate,
                app.targets.len(),
                expected
            ));
        }
        if let Some(bad) = app.targets.iter().find(|&&target| target >= arity) {
            errors.push(format!(
                "{context}: body[{index}] target {bad} out of range for arity {arity}"
            ));
        }
    }
}

/// Load and validate a rule library from a TOML file.
pub fn load_rules(path: &Path) -> Result<RulesFile> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let rules: RulesFile =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    rules.validate()?;
    Ok(rules)
}

/// Atomically write a rule library to disk (temp file + rename).
pub fn write_rules(path: &Path, rules: &RulesFile) -> Result<()> {
    rules.validate()?;
    let mut buf = toml::to_string_pretty(rules).context("serialize rules toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("rules path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp rules {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace rules {}", path.display()))?;
    Ok(())
}
