//! # assetflow core
//!
//! Core types shared by every assetflow crate:
//! resource and group descriptors, the namespaced event bus,
//! and the error taxonomy of the loading pipeline.

pub mod error;
pub mod event_bus;
pub mod resource;
pub mod types;

pub use error::{Error, LoadError, ManifestError, PipelineError, Result};

pub use event_bus::{
    EventBus, EventBusConfig, EventBusError, EventKey, NamedEvent, Published, BASE_NAMESPACE,
};

pub use resource::{Group, GroupSpec, Manifest, Resource, ResourceKind};

pub use types::{thread_safe_rw, ThreadSafeRw};
