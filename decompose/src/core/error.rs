//! Error taxonomy for single-step expansion and full decomposition.

use std::convert::Infallible;

use thiserror::Error;

/// Why a value could not be expanded even once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The value has no expansion capability at all.
    Missing,
    /// The value has a capability, but it declined for this value.
    Declined,
}

/// Raised by the single-step primitives when no default was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{item} (type '{type_name}') {}", describe_capability(.capability))]
pub struct NotExpandable {
    /// Debug rendering of the value.
    pub item: String,
    pub type_name: &'static str,
    pub capability: Capability,
}

fn describe_capability(capability: &Capability) -> &'static str {
    match capability {
        Capability::Missing => "has no decomposition",
        Capability::Declined => "has a decomposition, but it declined to expand",
    }
}

/// Errors returned by [`crate::core::engine::Decomposer::decompose`].
///
/// `E` is the caller's own stuck error type; it is [`Infallible`] unless a
/// custom [`crate::core::engine::StuckPolicy`] is configured.
#[derive(Debug, Error)]
pub enum DecomposeError<E = Infallible> {
    #[error(
        "must specify `keep` if specifying `on_stuck`, because nothing can get stuck \
         without a criterion for what is acceptable to keep"
    )]
    Configuration,

    #[error("item doesn't satisfy the given `keep` but can't be decomposed: {item}")]
    Stuck { item: String },

    #[error("{0}")]
    Policy(E),
}

impl<E> DecomposeError<E> {
    pub fn is_stuck(&self) -> bool {
        matches!(self, DecomposeError::Stuck { .. } | DecomposeError::Policy(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_expandable_message_distinguishes_missing_from_declined() {
        let missing = NotExpandable {
            item: "Leaf(\"x\")".to_string(),
            type_name: "Leaf",
            capability: Capability::Missing,
        };
        let declined = NotExpandable {
            item: "Leaf(\"x\")".to_string(),
            type_name: "Leaf",
            capability: Capability::Declined,
        };
        assert_eq!(
            missing.to_string(),
            "Leaf(\"x\") (type 'Leaf') has no decomposition"
        );
        assert!(declined.to_string().contains("declined"));
    }

    #[test]
    fn stuck_error_names_the_item() {
        let err: DecomposeError = DecomposeError::Stuck {
            item: "CCZ(a, b, c)".to_string(),
        };
        assert!(err.to_string().contains("CCZ(a, b, c)"));
        assert!(err.is_stuck());
    }
}
