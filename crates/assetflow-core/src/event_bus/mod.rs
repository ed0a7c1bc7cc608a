//! # Event Bus Module
//!
//! Namespaced publish/subscribe used to decouple the loader and the
//! sequencer from whatever consumes their progress.
//!
//! ## Overview
//!
//! - Subscribers register callbacks under `event` or `event.namespace`
//!   specifiers; several specifiers can be given at once, separated by
//!   comma, slash or whitespace.
//! - Publishing to the `base` namespace broadcasts to the event in every
//!   namespace. Publishing to any other namespace reaches only that one.
//! - The first callback that returns `Some` provides the publish result.
//! - Async consumers can poll a broadcast receiver instead.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use assetflow_core::event_bus::EventBus;
//!
//! let bus: EventBus<String> = EventBus::new();
//! bus.subscribe("groupEnd", |group| println!("group {group} done"))?
//!     .subscribe("groupEnd.hud", |_| println!("hide loading bar"))?;
//!
//! bus.publish("groupEnd", "base".to_string())?;
//! ```

mod bus;
mod events;
mod key;

pub use bus::*;
pub use events::*;
pub use key::*;
