//! Single-step expansion of one value.
//!
//! A value exposes at most one of two capability shapes:
//!
//! - [`Decompose`]: expands without any outside context.
//! - [`DecomposeWithTargets`]: expands only once told which targets it acts on.
//!
//! Both return an [`Expansion`], which separates "no capability" from "the
//! capability declined" from "expanded (possibly into nothing)".

use std::any::type_name;
use std::fmt::Debug;

use crate::core::error::{Capability, NotExpandable};
use crate::core::tree::{OpTree, flatten};

/// Result of asking a value to expand itself once.
#[derive(Debug)]
pub enum Expansion<T> {
    /// The value has no expansion capability.
    Unsupported,
    /// The value has a capability, but it does not apply here.
    Declined,
    /// The value expanded into this tree. An empty tree dissolves the value.
    Tree(OpTree<T>),
}

impl<T> Expansion<T> {
    /// Expansion into nothing.
    pub fn empty() -> Self {
        Expansion::Tree(OpTree::empty())
    }

    /// Expansion into a flat sequence of items.
    pub fn items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Expansion::Tree(OpTree::seq(items))
    }

    pub fn into_tree(self) -> Option<OpTree<T>> {
        match self {
            Expansion::Tree(tree) => Some(tree),
            Expansion::Unsupported | Expansion::Declined => None,
        }
    }
}

/// Context-free expansion capability.
///
/// Atomic item types implement this with the default method, which reports
/// [`Expansion::Unsupported`].
pub trait Decompose {
    type Output;

    fn decompose(&self) -> Expansion<Self::Output> {
        Expansion::Unsupported
    }
}

/// Expansion capability that needs positional target bindings.
///
/// Implementations must not create cycles: an item that eventually expands
/// back into itself makes full decomposition loop forever.
pub trait DecomposeWithTargets<Q> {
    type Output;

    fn decompose_with_targets(&self, targets: &[Q]) -> Expansion<Self::Output> {
        let _ = targets;
        Expansion::Unsupported
    }
}

/// What to do when a value cannot be expanded once.
///
/// `Raise` is a dedicated state, so a caller passing an empty collection as
/// its default is never mistaken for a caller passing no default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnMissing<D> {
    Raise,
    Return(D),
}

/// Outcome of a single-step expansion with a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Once<T, D> {
    Expanded(Vec<T>),
    Default(D),
}

impl<T, D> Once<T, D> {
    pub fn expanded(self) -> Option<Vec<T>> {
        match self {
            Once::Expanded(items) => Some(items),
            Once::Default(_) => None,
        }
    }
}

impl<T> Once<T, Vec<T>> {
    /// Collapse the two outcomes when the default is itself a sequence.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Once::Expanded(items) | Once::Default(items) => items,
        }
    }
}

/// Expand `val` exactly once, failing if it cannot be expanded.
pub fn decompose_once<V>(val: &V) -> Result<Vec<V::Output>, NotExpandable>
where
    V: Decompose + Debug + ?Sized,
{
    expand_or_raise(val, val.decompose())
}

/// Expand `val` exactly once, returning `default` if it cannot be expanded.
pub fn decompose_once_or<V, D>(
    val: &V,
    default: OnMissing<D>,
) -> Result<Once<V::Output, D>, NotExpandable>
where
    V: Decompose + Debug + ?Sized,
{
    settle(val, val.decompose(), default)
}

/// Expand `val` exactly once against `targets`, failing if it cannot be expanded.
pub fn decompose_once_with_targets<V, Q>(
    val: &V,
    targets: &[Q],
) -> Result<Vec<V::Output>, NotExpandable>
where
    V: DecomposeWithTargets<Q> + Debug + ?Sized,
{
    expand_or_raise(val, val.decompose_with_targets(targets))
}

/// Expand `val` exactly once against `targets`, returning `default` if it
/// cannot be expanded.
pub fn decompose_once_with_targets_or<V, Q, D>(
    val: &V,
    targets: &[Q],
    default: OnMissing<D>,
) -> Result<Once<V::Output, D>, NotExpandable>
where
    V: DecomposeWithTargets<Q> + Debug + ?Sized,
{
    settle(val, val.decompose_with_targets(targets), default)
}

fn settle<V, T, D>(
    val: &V,
    expansion: Expansion<T>,
    default: OnMissing<D>,
) -> Result<Once<T, D>, NotExpandable>
where
    V: Debug + ?Sized,
{
    match default {
        OnMissing::Raise => expand_or_raise(val, expansion).map(Once::Expanded),
        OnMissing::Return(value) => Ok(match expansion.into_tree() {
            Some(tree) => Once::Expanded(flatten(tree).collect()),
            None => Once::Default(value),
        }),
    }
}

fn expand_or_raise<V, T>(val: &V, expansion: Expansion<T>) -> Result<Vec<T>, NotExpandable>
where
    V: Debug + ?Sized,
{
    let capability = match expansion {
        Expansion::Tree(tree) => return Ok(flatten(tree).collect()),
        Expansion::Unsupported => Capability::Missing,
        Expansion::Declined => Capability::Declined,
    };
    Err(NotExpandable {
        item: format!("{val:?}"),
        type_name: type_name::<V>(),
        capability,
    })
}
