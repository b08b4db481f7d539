//! Ordered expansion strategies tried for each item.

use tracing::trace;

use crate::core::expand::{Decompose, Expansion};
use crate::core::tree::{OpTree, flatten};

/// A caller-supplied strategy. `None` means "not here, try the next one".
pub type Strategy<'a, T> = dyn Fn(&T) -> Option<OpTree<T>> + 'a;

/// Outcome of running an item through the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Some stage expanded the item. The items are already flat.
    Expanded(Vec<T>),
    /// Every stage declined.
    NotExpandable,
}

enum Stage<'s, 'a, T> {
    Intercepting(&'s Strategy<'a, T>),
    Default,
    Fallback(&'s Strategy<'a, T>),
}

impl<T> Stage<'_, '_, T> {
    fn name(&self) -> &'static str {
        match self {
            Stage::Intercepting(_) => "intercepting",
            Stage::Default => "default",
            Stage::Fallback(_) => "fallback",
        }
    }
}

/// `[intercepting?, default, fallback?]`, tried in that order.
///
/// The first stage returning a tree wins; later stages are never consulted
/// for that item.
pub struct ExpansionChain<'s, 'a, T> {
    stages: Vec<Stage<'s, 'a, T>>,
}

impl<'s, 'a, T> ExpansionChain<'s, 'a, T>
where
    T: Decompose<Output = T>,
{
    pub fn new(
        intercepting: Option<&'s Strategy<'a, T>>,
        fallback: Option<&'s Strategy<'a, T>>,
    ) -> Self {
        let stages = [
            intercepting.map(Stage::Intercepting),
            Some(Stage::Default),
            fallback.map(Stage::Fallback),
        ]
        .into_iter()
        .flatten()
        .collect();
        Self { stages }
    }

    pub fn resolve(&self, item: &T) -> Resolution<T> {
        for stage in &self.stages {
            let tree = match stage {
                Stage::Intercepting(strategy) | Stage::Fallback(strategy) => strategy(item),
                Stage::Default => item.decompose().into_tree(),
            };
            if let Some(tree) = tree {
                let items: Vec<T> = flatten(tree).collect();
                trace!(stage = stage.name(), produced = items.len(), "expanded");
                return Resolution::Expanded(items);
            }
        }
        Resolution::NotExpandable
    }
}

/// Wrap a strategy returning [`Expansion`] so it fits the chain.
pub fn from_expansion<'a, T, F>(strategy: F) -> impl Fn(&T) -> Option<OpTree<T>> + 'a
where
    T: 'a,
    F: Fn(&T) -> Expansion<T> + 'a,
{
    move |item| strategy(item).into_tree()
}
