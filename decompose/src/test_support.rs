//! Test-only work items and builders.

use std::cell::Cell;
use std::rc::Rc;

use crate::core::expand::{Decompose, Expansion};
use crate::core::tree::OpTree;

/// A small work item covering every capability shape the engine cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// No expansion capability.
    Leaf(String),
    /// Has a capability that always declines.
    Declining(String),
    /// Expands into its children (possibly none).
    Composite(String, Vec<Part>),
    /// Expands into a nested tree of its children.
    Nested(String, Vec<Vec<Part>>),
    /// Like `Composite`, but counts how often it was asked to expand.
    Tracked(String, Rc<Cell<u32>>, Vec<Part>),
}

impl Part {
    pub fn name(&self) -> String {
        match self {
            Part::Leaf(name)
            | Part::Declining(name)
            | Part::Composite(name, _)
            | Part::Nested(name, _)
            | Part::Tracked(name, _, _) => name.clone(),
        }
    }
}

impl Decompose for Part {
    type Output = Part;

    fn decompose(&self) -> Expansion<Part> {
        match self {
            Part::Leaf(_) => Expansion::Unsupported,
            Part::Declining(_) => Expansion::Declined,
            Part::Composite(_, children) => Expansion::items(children.clone()),
            Part::Nested(_, groups) => Expansion::Tree(OpTree::Seq(
                groups.iter().cloned().map(OpTree::seq).collect(),
            )),
            Part::Tracked(_, calls, children) => {
                calls.set(calls.get() + 1);
                Expansion::items(children.clone())
            }
        }
    }
}

pub fn leaf(name: &str) -> Part {
    Part::Leaf(name.to_string())
}

pub fn declining(name: &str) -> Part {
    Part::Declining(name.to_string())
}

pub fn composite(name: &str, children: Vec<Part>) -> Part {
    Part::Composite(name.to_string(), children)
}

/// Create a tracked composite and the counter it increments on expansion.
pub fn tracked(name: &str, children: Vec<Part>) -> (Part, Rc<Cell<u32>>) {
    let calls = Rc::new(Cell::new(0));
    (
        Part::Tracked(name.to_string(), Rc::clone(&calls), children),
        calls,
    )
}

/// Names of `parts`, in order.
pub fn names(parts: &[Part]) -> Vec<String> {
    parts.iter().map(Part::name).collect()
}

/// Write `contents` to `name` inside a fresh temp dir.
pub fn temp_file(
    name: &str,
    contents: &str,
) -> std::io::Result<(tempfile::TempDir, std::path::PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(name);
    std::fs::write(&path, contents)?;
    Ok((dir, path))
}
