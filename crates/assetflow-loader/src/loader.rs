//! Extension loader.
//!
//! [`ExtensionLoader::dispatch`] starts every resource of a batch at once
//! and returns a [`Batch`] that yields completions in the order they
//! finish. Each completion is counted and published on the loader bus
//! (`fileEnd` or `fileError`); `end` follows the last one.

use assetflow_core::{EventBus, EventBusConfig, LoadError, NamedEvent, Resource};
use assetflow_settings::PipelineConfig;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::asset::Asset;
use crate::extension::extract_extension;
use crate::handler::HandlerRegistry;

/// Events published on the loader bus.
#[derive(Debug, Clone)]
pub enum LoaderEvent {
    /// A handler finished; `item` is `None` for an empty payload
    FileEnd {
        resource: Resource,
        item: Option<Asset>,
    },
    /// The resource could not be loaded at all
    FileError { resource: Resource, error: LoadError },
    /// Every resource of the batch is accounted for
    End { loaded: usize },
}

impl NamedEvent for LoaderEvent {
    fn name(&self) -> &'static str {
        match self {
            LoaderEvent::FileEnd { .. } => "fileEnd",
            LoaderEvent::FileError { .. } => "fileError",
            LoaderEvent::End { .. } => "end",
        }
    }

    fn description(&self) -> String {
        match self {
            LoaderEvent::FileEnd { resource, .. } => format!("fileEnd {}", resource.name),
            LoaderEvent::FileError { resource, error } => {
                format!("fileError {}: {}", resource.name, error)
            }
            LoaderEvent::End { loaded } => format!("end ({} loaded)", loaded),
        }
    }
}

/// Outcome of one resource of a batch.
#[derive(Debug, Clone)]
pub struct Completion {
    pub resource: Resource,
    pub outcome: Result<Option<Asset>, LoadError>,
}

impl Completion {
    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Routes resources to handlers by extension.
pub struct ExtensionLoader {
    registry: HandlerRegistry,
    events: Arc<EventBus<LoaderEvent>>,
    to_load: usize,
    loaded: usize,
    items: HashMap<String, Option<Asset>>,
}

impl ExtensionLoader {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self::with_event_config(registry, EventBusConfig::default())
    }

    pub fn with_event_config(registry: HandlerRegistry, config: EventBusConfig) -> Self {
        Self {
            registry,
            events: Arc::new(EventBus::with_config(config)),
            to_load: 0,
            loaded: 0,
            items: HashMap::new(),
        }
    }

    /// Loader with the built-in handlers configured from `config`
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::with_event_config(
            HandlerRegistry::from_settings(&config.loader),
            config.event_bus_config(),
        )
    }

    /// The loader bus (`fileEnd`, `fileError`, `end`)
    pub fn events(&self) -> &Arc<EventBus<LoaderEvent>> {
        &self.events
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Resources in the current batch
    pub fn to_load(&self) -> usize {
        self.to_load
    }

    /// Completions recorded in the current batch
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Items of the current batch; `None` values are empty payloads
    pub fn items(&self) -> &HashMap<String, Option<Asset>> {
        &self.items
    }

    /// Start loading `resources`, replacing the previous batch.
    ///
    /// Resources without an extension or without a handler become failure
    /// completions; they are still counted. An empty batch publishes `end`
    /// right away.
    pub fn dispatch(&mut self, resources: &[Resource]) -> Batch<'_> {
        self.to_load = resources.len();
        self.loaded = 0;
        self.items.clear();

        let mut ready = VecDeque::new();
        let pending = FuturesUnordered::new();
        for resource in resources {
            match self.start(resource) {
                Ok(future) => pending.push(future),
                Err(error) => {
                    tracing::warn!("Cannot load '{}': {}", resource.name, error);
                    ready.push_back(Completion {
                        resource: resource.clone(),
                        outcome: Err(error),
                    });
                }
            }
        }
        tracing::debug!(
            "Dispatched {} resources ({} unroutable)",
            self.to_load,
            ready.len()
        );

        if self.to_load == 0 {
            self.events.emit(LoaderEvent::End { loaded: 0 });
        }

        Batch {
            loader: self,
            ready,
            pending,
        }
    }

    fn start(&self, resource: &Resource) -> Result<BoxFuture<'static, Completion>, LoadError> {
        let extension = extract_extension(resource)?;
        let handler = self
            .registry
            .find(extension)
            .cloned()
            .ok_or_else(|| LoadError::NoHandler {
                name: resource.name.clone(),
                extension: extension.to_string(),
            })?;
        tracing::debug!("Loading '{}' with '{}'", resource.name, handler.name());

        let resource = resource.clone();
        Ok(async move {
            let outcome = handler.load(&resource).await;
            Completion { resource, outcome }
        }
        .boxed())
    }

    fn record(&mut self, completion: &Completion) {
        self.loaded += 1;
        let resource = completion.resource.clone();
        match &completion.outcome {
            Ok(item) => {
                if self.items.contains_key(&resource.name) {
                    tracing::warn!("Duplicate resource '{}' in batch", resource.name);
                } else {
                    self.items.insert(resource.name.clone(), item.clone());
                }
                self.events.emit(LoaderEvent::FileEnd {
                    resource,
                    item: item.clone(),
                });
            }
            Err(error) => {
                self.events.emit(LoaderEvent::FileError {
                    resource,
                    error: error.clone(),
                });
            }
        }

        if self.loaded == self.to_load {
            tracing::debug!("Batch complete with {} resources", self.loaded);
            self.events.emit(LoaderEvent::End {
                loaded: self.loaded,
            });
        }
    }
}

impl std::fmt::Debug for ExtensionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionLoader")
            .field("registry", &self.registry)
            .field("to_load", &self.to_load)
            .field("loaded", &self.loaded)
            .finish()
    }
}

/// A dispatched batch.
///
/// Handlers only make progress while the batch is polled through
/// [`Batch::next`] or [`Batch::join`].
#[must_use = "a batch does nothing unless polled"]
pub struct Batch<'a> {
    loader: &'a mut ExtensionLoader,
    ready: VecDeque<Completion>,
    pending: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl Batch<'_> {
    /// Next completion, already counted and published; `None` once all
    /// resources are accounted for.
    pub async fn next(&mut self) -> Option<Completion> {
        let completion = match self.ready.pop_front() {
            Some(completion) => completion,
            None => self.pending.next().await?,
        };
        self.loader.record(&completion);
        Some(completion)
    }

    /// Drive the batch to the end, returning completions in finish order.
    pub async fn join(mut self) -> Vec<Completion> {
        let mut completions = Vec::with_capacity(self.remaining());
        while let Some(completion) = self.next().await {
            completions.push(completion);
        }
        completions
    }

    /// Resources not yet completed
    pub fn remaining(&self) -> usize {
        self.ready.len() + self.pending.len()
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }
}
