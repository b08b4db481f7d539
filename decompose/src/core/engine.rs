//! Worklist-driven recursive decomposition.
//!
//! Items are expanded until each one satisfies `keep` or cannot be expanded
//! any further. Expanded sub-items go to the front of the worklist, so the
//! output is a pre-order, depth-first walk of the final rewrite tree.
//!
//! There is no cycle detection and no iteration cap: a rewrite chain that
//! leads back to an equivalent item never terminates.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt::Debug;

use tracing::debug;

use crate::core::chain::{ExpansionChain, Resolution, Strategy};
use crate::core::error::DecomposeError;
use crate::core::expand::Decompose;
use crate::core::tree::{OpTree, flatten};

/// How an item that is neither kept nor expandable is resolved.
///
/// Only meaningful together with a `keep` predicate.
pub enum StuckPolicy<'a, T, E> {
    /// Fail with [`DecomposeError::Stuck`] describing the item.
    Default,
    /// Fail with this error.
    Raise(E),
    /// Ask the callback; `Some` fails with that error, `None` keeps the item.
    With(Box<dyn Fn(&T) -> Option<E> + 'a>),
    /// Keep the item silently.
    Keep,
}

impl<'a, T, E> StuckPolicy<'a, T, E> {
    pub fn with<F>(callback: F) -> Self
    where
        F: Fn(&T) -> Option<E> + 'a,
    {
        StuckPolicy::With(Box::new(callback))
    }

    fn is_default(&self) -> bool {
        matches!(self, StuckPolicy::Default)
    }

    /// Resolve one stuck item, handing the policy back if the item is kept.
    fn settle(self, item: &T) -> Result<Self, DecomposeError<E>>
    where
        T: Debug,
    {
        match self {
            StuckPolicy::Default => Err(DecomposeError::Stuck {
                item: format!("{item:?}"),
            }),
            StuckPolicy::Raise(error) => Err(DecomposeError::Policy(error)),
            StuckPolicy::With(callback) => match callback(item) {
                Some(error) => Err(DecomposeError::Policy(error)),
                None => Ok(StuckPolicy::With(callback)),
            },
            StuckPolicy::Keep => Ok(StuckPolicy::Keep),
        }
    }
}

impl<T, E> Debug for StuckPolicy<'_, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StuckPolicy::Default => "Default",
            StuckPolicy::Raise(_) => "Raise",
            StuckPolicy::With(_) => "With",
            StuckPolicy::Keep => "Keep",
        };
        f.write_str(name)
    }
}

/// Builder for one decomposition run.
///
/// ```
/// use decompose::core::engine::Decomposer;
/// use decompose::core::expand::{Decompose, Expansion};
/// use decompose::core::tree::OpTree;
///
/// #[derive(Debug, PartialEq)]
/// enum Step { Twice(u8), One(u8) }
///
/// impl Decompose for Step {
///     type Output = Step;
///     fn decompose(&self) -> Expansion<Step> {
///         match self {
///             Step::Twice(n) => Expansion::items([Step::One(*n), Step::One(*n)]),
///             Step::One(_) => Expansion::Unsupported,
///         }
///     }
/// }
///
/// let out = Decomposer::new().decompose(OpTree::Item(Step::Twice(3))).unwrap();
/// assert_eq!(out, vec![Step::One(3), Step::One(3)]);
/// ```
pub struct Decomposer<'a, T, E = Infallible> {
    keep: Option<Box<dyn Fn(&T) -> bool + 'a>>,
    intercepting: Option<Box<Strategy<'a, T>>>,
    fallback: Option<Box<Strategy<'a, T>>>,
    on_stuck: StuckPolicy<'a, T, E>,
}

impl<T> Default for Decomposer<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Decomposer<'_, T> {
    pub fn new() -> Self {
        Self {
            keep: None,
            intercepting: None,
            fallback: None,
            on_stuck: StuckPolicy::Default,
        }
    }
}

impl<'a, T, E> Decomposer<'a, T, E> {
    /// Items satisfying `keep` go straight to the output without expansion.
    pub fn keep<F>(mut self, keep: F) -> Self
    where
        F: Fn(&T) -> bool + 'a,
    {
        self.keep = Some(Box::new(keep));
        self
    }

    /// Tried before the item's own capability.
    pub fn intercepting<F>(mut self, strategy: F) -> Self
    where
        F: Fn(&T) -> Option<OpTree<T>> + 'a,
    {
        self.intercepting = Some(Box::new(strategy));
        self
    }

    /// Tried after the item's own capability declines.
    pub fn fallback<F>(mut self, strategy: F) -> Self
    where
        F: Fn(&T) -> Option<OpTree<T>> + 'a,
    {
        self.fallback = Some(Box::new(strategy));
        self
    }

    pub fn on_stuck<E2>(self, policy: StuckPolicy<'a, T, E2>) -> Decomposer<'a, T, E2> {
        Decomposer {
            keep: self.keep,
            intercepting: self.intercepting,
            fallback: self.fallback,
            on_stuck: policy,
        }
    }

    /// Reject configurations that cannot mean anything.
    pub fn validate(&self) -> Result<(), DecomposeError<E>> {
        if !self.on_stuck.is_default() && self.keep.is_none() {
            return Err(DecomposeError::Configuration);
        }
        Ok(())
    }
}

impl<T, E> Decomposer<'_, T, E>
where
    T: Decompose<Output = T> + Debug,
{
    /// Decompose `root` until every item is kept or cannot be expanded.
    ///
    /// Any error aborts the whole run; no partial output is returned.
    pub fn decompose(self, root: OpTree<T>) -> Result<Vec<T>, DecomposeError<E>> {
        self.validate()?;
        let Decomposer {
            keep,
            intercepting,
            fallback,
            mut on_stuck,
        } = self;
        debug!(
            keep = keep.is_some(),
            intercepting = intercepting.is_some(),
            fallback = fallback.is_some(),
            on_stuck = ?on_stuck,
            "decomposition started"
        );

        let chain = ExpansionChain::new(intercepting.as_deref(), fallback.as_deref());
        let mut worklist = VecDeque::from([root]);
        let mut output = Vec::new();

        while let Some(next) = worklist.pop_front() {
            let item = match next {
                OpTree::Item(item) => item,
                container => {
                    let items: Vec<T> = flatten(container).collect();
                    push_front_all(&mut worklist, items);
                    continue;
                }
            };

            if let Some(keep) = &keep {
                if keep(&item) {
                    output.push(item);
                    continue;
                }
            }

            if let Resolution::Expanded(items) = chain.resolve(&item) {
                push_front_all(&mut worklist, items);
                continue;
            }

            if keep.is_some() {
                debug!(item = ?item, "stuck item");
                on_stuck = on_stuck.settle(&item)?;
            }
            output.push(item);
        }

        debug!(output_len = output.len(), "decomposition finished");
        Ok(output)
    }
}

/// Decompose `root` with no acceptance criterion: expand until impossible.
pub fn decompose<T>(root: OpTree<T>) -> Result<Vec<T>, DecomposeError>
where
    T: Decompose<Output = T> + Debug,
{
    Decomposer::new().decompose(root)
}

/// Insert `items` at the front of `worklist`, keeping their order.
fn push_front_all<T>(worklist: &mut VecDeque<OpTree<T>>, items: Vec<T>) {
    worklist.reserve(items.len());
    for item in items.into_iter().rev() {
        worklist.push_front(OpTree::Item(item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Part, composite, declining, leaf, names, tracked};

    #[derive(Debug, PartialEq, Eq)]
    struct Refused(String);

    impl std::fmt::Display for Refused {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "refused {}", self.0)
        }
    }

    fn is_leaf(part: &Part) -> bool {
        matches!(part, Part::Leaf(_))
    }

    #[test]
    fn nested_input_keeps_order_with_always_keep() {
        let root = OpTree::Seq(vec![
            OpTree::Seq(vec![
                OpTree::Item(leaf("a")),
                OpTree::Seq(vec![OpTree::Item(leaf("b")), OpTree::Item(leaf("c"))]),
            ]),
            OpTree::Item(leaf("d")),
        ]);
        let out = Decomposer::new()
            .keep(|_: &Part| true)
            .decompose(root)
            .expect("decompose");
        assert_eq!(names(&out), vec!["a", "b", "c", "d"]);
    }

    /// Sub-items of an expansion are finished before earlier-queued siblings.
    #[test]
    fn output_is_depth_first_pre_order() {
        let root = OpTree::seq([
            composite("x", vec![composite("y", vec![leaf("a"), leaf("b")]), leaf("c")]),
            leaf("d"),
        ]);
        let out = decompose(root).expect("decompose");
        assert_eq!(names(&out), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn kept_items_are_not_expanded() {
        let (item, calls) = tracked("x", vec![leaf("a")]);
        let out = Decomposer::new()
            .keep(|part: &Part| part.name() == "x")
            .decompose(OpTree::Item(item))
            .expect("decompose");
        assert_eq!(names(&out), vec!["x"]);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn interceptor_result_is_used_exclusively() {
        let (item, calls) = tracked("x", vec![leaf("default")]);
        let out = Decomposer::new()
            .intercepting(|part: &Part| {
                (part.name() == "x").then(|| OpTree::Item(leaf("intercepted")))
            })
            .decompose(OpTree::Item(item))
            .expect("decompose");
        assert_eq!(names(&out), vec!["intercepted"]);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn fallback_expands_what_the_default_declines() {
        let out = Decomposer::new()
            .keep(is_leaf)
            .fallback(|part: &Part| match part {
                Part::Declining(name) => Some(OpTree::Item(leaf(&format!("{name}-fb")))),
                _ => None,
            })
            .decompose(OpTree::Item(declining("x")))
            .expect("decompose");
        assert_eq!(names(&out), vec!["x-fb"]);
    }

    /// A dissolved item is dropped; only the later leaf reaches the stuck policy.
    #[test]
    fn empty_expansion_drops_the_item() {
        let seen = std::cell::RefCell::new(Vec::new());
        let out = Decomposer::new()
            .keep(|part: &Part| {
                seen.borrow_mut().push(part.name());
                false
            })
            .on_stuck(StuckPolicy::Raise(Refused("stuck".to_string())))
            .decompose(OpTree::seq([composite("gone", Vec::new()), leaf("kept")]))
            .map_err(|err| err.to_string());
        assert_eq!(out.expect_err("leaf is stuck"), "refused stuck");
        assert_eq!(*seen.borrow(), vec!["gone".to_string(), "kept".to_string()]);
    }

    /// Validation happens before anything is expanded.
    #[test]
    fn stuck_policy_without_keep_is_a_configuration_error() {
        let (item, calls) = tracked("x", vec![leaf("a")]);
        let err = Decomposer::new()
            .on_stuck(StuckPolicy::<Part, Refused>::Keep)
            .decompose(OpTree::Item(item))
            .expect_err("configuration");
        assert!(matches!(err, DecomposeError::Configuration));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn unexpandable_items_are_kept_without_keep() {
        let root = OpTree::seq([
            composite("x", vec![leaf("a"), declining("b")]),
            leaf("c"),
        ]);
        let out = decompose(root).expect("decompose");
        assert_eq!(out, vec![leaf("a"), declining("b"), leaf("c")]);
    }

    #[test]
    fn default_policy_reports_the_stuck_item() {
        let err = Decomposer::new()
            .keep(|_: &Part| false)
            .decompose(OpTree::Item(leaf("lonely")))
            .expect_err("stuck");
        assert!(matches!(&err, DecomposeError::Stuck { item } if item.contains("lonely")));
    }

    #[test]
    fn silent_policy_keeps_the_stuck_item() {
        let out = Decomposer::new()
            .keep(|_: &Part| false)
            .on_stuck(StuckPolicy::<Part, Refused>::with(|_| None))
            .decompose(OpTree::seq([leaf("a"), leaf("b")]))
            .expect("decompose");
        assert_eq!(names(&out), vec!["a", "b"]);
    }

    #[test]
    fn raising_policy_returns_exactly_that_error() {
        let err = Decomposer::new()
            .keep(|_: &Part| false)
            .on_stuck(StuckPolicy::with(|part: &Part| Some(Refused(part.name()))))
            .decompose(OpTree::seq([leaf("a"), leaf("b")]))
            .expect_err("stuck");
        assert!(matches!(err, DecomposeError::Policy(Refused(name)) if name == "a"));
    }

    #[test]
    fn keep_policy_keeps_everything_stuck() {
        let out = Decomposer::new()
            .keep(is_leaf)
            .on_stuck(StuckPolicy::<Part, Refused>::Keep)
            .decompose(OpTree::Item(composite("x", vec![declining("y"), leaf("z")])))
            .expect("decompose");
        assert_eq!(out, vec![declining("y"), leaf("z")]);
    }

    /// A composite whose children all dissolve leaves nothing and raises nothing.
    #[test]
    fn fully_dissolving_tree_yields_empty_output() {
        let y = composite("y", Vec::new());
        let x = composite("x", vec![y.clone(), y]);
        let out = Decomposer::new()
            .keep(|_: &Part| false)
            .decompose(OpTree::Item(x))
            .expect("decompose");
        assert!(out.is_empty());
    }

    #[test]
    fn lazy_roots_are_flattened_as_pass_through() {
        let root = OpTree::lazy((0..3).map(|n| OpTree::Item(leaf(&n.to_string()))));
        let out = decompose(root).expect("decompose");
        assert_eq!(names(&out), vec!["0", "1", "2"]);
    }
}
