//! Type aliases shared across crates.
//!
//! - [`aliases`]: lock wrappers and event callback types.

pub mod aliases;

pub use aliases::*;
