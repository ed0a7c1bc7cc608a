//! Type aliases for commonly used complex types.
//!
//! Nested lock and callback types show up in the bus, the loader and the
//! sequencer. Naming them once keeps signatures readable and lets the
//! underlying lock implementation change in one place.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use assetflow_core::types::*;
//!
//! // Instead of: Arc<RwLock<Items>>
//! let items: ThreadSafeRw<Items> = thread_safe_rw(Items::default());
//! ```

use parking_lot::RwLock;
use std::sync::Arc;

// =============================================================================
// SHARED STATE (Arc<RwLock<T>>)
// =============================================================================

/// A thread-safe reader-writer lock wrapper for read-heavy state.
///
/// The items mapping is the typical case: written by the sequencer,
/// read by any number of collaborators.
pub type ThreadSafeRw<T> = Arc<RwLock<T>>;

// =============================================================================
// CALLBACK TYPES
// =============================================================================

/// A bus callback receiving the published arguments.
///
/// Returning `Some` offers a result to the publisher; the first one wins.
/// Stored behind `Arc` so a publish can snapshot the callbacks and call
/// them without holding the subscription lock.
pub type EventHandler<A, R> = Arc<dyn Fn(&A) -> Option<R> + Send + Sync>;

/// Ordered callbacks registered for one (namespace, event) pair.
pub type HandlerList<A, R> = Vec<EventHandler<A, R>>;

// =============================================================================
// CONSTRUCTOR HELPERS
// =============================================================================

/// Create a new `ThreadSafeRw<T>` from a value.
///
/// # Example
/// ```rust,ignore
/// let items = thread_safe_rw(Items::default());
/// ```
#[inline]
pub fn thread_safe_rw<T>(value: T) -> ThreadSafeRw<T> {
    Arc::new(RwLock::new(value))
}
