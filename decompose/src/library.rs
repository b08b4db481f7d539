//! Rule-driven gates and the operations that apply them.
//!
//! A [`Gate`] only knows how to decompose once it is told its targets, so it
//! implements [`DecomposeWithTargets`]. An [`Op`] binds a gate to concrete
//! target names and implements [`Decompose`] by delegating to its gate.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

use crate::core::expand::{Decompose, DecomposeWithTargets, Expansion};
use crate::core::tree::OpTree;
use crate::io::config::{Application, GateSpec, OverrideSpec, RulesFile};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error("empty operation")]
    EmptyOp,

    #[error("unknown gate '{0}'")]
    UnknownGate(String),

    #[error("gate '{gate}' takes {expected} targets, got {got}")]
    Arity {
        gate: String,
        expected: usize,
        got: usize,
    },
}

#[derive(Debug, Default)]
struct Tables {
    gates: HashMap<String, GateSpec>,
    intercept: HashMap<String, Vec<Application>>,
    fallback: HashMap<String, Vec<Application>>,
}

/// Shared, immutable index over a rule library.
#[derive(Debug, Clone, Default)]
pub struct Library {
    tables: Arc<Tables>,
}

impl Library {
    /// Validate and index a rule file.
    pub fn from_rules(rules: &RulesFile) -> Result<Self> {
        rules.validate()?;
        let bodies = |specs: &[OverrideSpec]| -> HashMap<String, Vec<Application>> {
            specs
                .iter()
                .map(|spec| (spec.name.clone(), spec.body.clone()))
                .collect()
        };
        let tables = Tables {
            gates: rules
                .gate
                .iter()
                .map(|gate| (gate.name.clone(), gate.clone()))
                .collect(),
            intercept: bodies(&rules.intercept),
            fallback: bodies(&rules.fallback),
        };
        Ok(Self {
            tables: Arc::new(tables),
        })
    }

    pub fn gate(&self, name: &str) -> Option<Gate<'_>> {
        self.tables.gates.get(name).map(|spec| Gate {
            library: self,
            spec,
        })
    }

    /// Fail on the first name that is not a gate of this library.
    pub fn check_known(&self, names: &[String]) -> Result<(), LibraryError> {
        match names.iter().find(|name| self.gate(name).is_none()) {
            Some(name) => Err(LibraryError::UnknownGate(name.clone())),
            None => Ok(()),
        }
    }

    pub fn gate_count(&self) -> usize {
        self.tables.gates.len()
    }

    pub fn has_intercepts(&self) -> bool {
        !self.tables.intercept.is_empty()
    }

    pub fn has_fallbacks(&self) -> bool {
        !self.tables.fallback.is_empty()
    }

    /// Parse `"NAME t1 t2 ..."` into an operation.
    pub fn parse_op(&self, text: &str) -> Result<Op, LibraryError> {
        let mut words = text.split_whitespace();
        let name = words.next().ok_or(LibraryError::EmptyOp)?;
        let targets: Vec<String> = words.map(str::to_string).collect();
        self.op(name, targets)
    }

    /// Bind `name` to `targets`, checking the gate exists and the arity matches.
    pub fn op(&self, name: &str, targets: Vec<String>) -> Result<Op, LibraryError> {
        let gate = self
            .gate(name)
            .ok_or_else(|| LibraryError::UnknownGate(name.to_string()))?;
        if gate.arity() != targets.len() {
            return Err(LibraryError::Arity {
                gate: name.to_string(),
                expected: gate.arity(),
                got: targets.len(),
            });
        }
        Ok(Op {
            library: self.clone(),
            gate: name.to_string(),
            targets,
        })
    }

    /// Strategy consulted before an operation's own gate body.
    pub fn intercepting(&self) -> impl Fn(&Op) -> Option<OpTree<Op>> + '_ {
        move |op: &Op| self.override_body(&self.tables.intercept, op)
    }

    /// Strategy consulted after an operation's own gate declines.
    pub fn fallback(&self) -> impl Fn(&Op) -> Option<OpTree<Op>> + '_ {
        move |op: &Op| self.override_body(&self.tables.fallback, op)
    }

    fn override_body(
        &self,
        bodies: &HashMap<String, Vec<Application>>,
        op: &Op,
    ) -> Option<OpTree<Op>> {
        let body = bodies.get(&op.gate)?;
        Some(self.apply(body, &op.targets))
    }

    fn apply(&self, body: &[Application], targets: &[String]) -> OpTree<Op> {
        OpTree::seq(body.iter().map(|app| Op {
            library: self.clone(),
            gate: app.gate.clone(),
            targets: app
                .targets
                .iter()
                .map(|&index| targets[index].clone())
                .collect(),
        }))
    }
}

/// A gate definition viewed through its library.
#[derive(Clone, Copy)]
pub struct Gate<'l> {
    library: &'l Library,
    spec: &'l GateSpec,
}

impl Gate<'_> {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn arity(&self) -> usize {
        self.spec.arity
    }
}

impl fmt::Debug for Gate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name(), self.arity())
    }
}

impl DecomposeWithTargets<String> for Gate<'_> {
    type Output = Op;

    fn decompose_with_targets(&self, targets: &[String]) -> Expansion<Op> {
        match &self.spec.body {
            Some(body) if targets.len() == self.spec.arity => {
                Expansion::Tree(self.library.apply(body, targets))
            }
            _ => Expansion::Declined,
        }
    }
}

/// A gate applied to named targets.
#[derive(Clone, Serialize)]
pub struct Op {
    #[serde(skip)]
    library: Library,
    gate: String,
    targets: Vec<String>,
}

impl Op {
    pub fn gate_name(&self) -> &str {
        &self.gate
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }
}

impl Decompose for Op {
    type Output = Op;

    fn decompose(&self) -> Expansion<Op> {
        match self.library.gate(&self.gate) {
            Some(gate) => gate.decompose_with_targets(&self.targets),
            None => Expansion::Unsupported,
        }
    }
}

impl PartialEq for Op {
    fn eq(&self, other: &Self) -> bool {
        self.gate == other.gate && self.targets == other.targets
    }
}

impl Eq for Op {}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.gate, self.targets.join(", "))
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
