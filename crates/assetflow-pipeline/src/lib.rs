//! # assetflow pipeline
//!
//! [`GroupSequencer`] loads a manifest group by group through an
//! [`ExtensionLoader`](assetflow_loader::ExtensionLoader), collects the
//! loaded items and reports `progress`, `error`, `groupEnd` and `end` on its
//! own event bus.

pub mod error;
pub mod events;
mod groups;
pub mod items;
pub mod sequencer;
pub mod watchdog;

pub use error::SetupError;
pub use events::PipelineEvent;
pub use items::{Items, ItemsView};
pub use sequencer::{GroupSequencer, SequencerState};
pub use watchdog::{Watchdog, WatchdogHandle};
