//! Deterministic, pure decomposition logic.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values supplied by the caller and return deterministic outputs for
//! deterministic capabilities.

pub mod chain;
pub mod engine;
pub mod error;
pub mod expand;
pub mod tree;
