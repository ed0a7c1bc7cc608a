//! Group sequencer.
//!
//! Loads the groups of a manifest strictly one after another. Within a
//! group every resource is in flight at once; group `k + 1` is only
//! dispatched after `groupEnd` of group `k`.
//!
//! ```text
//! Idle -> Dispatching(0) -> ... -> Dispatching(n - 1) -> AllComplete
//! ```

use assetflow_core::{
    Error, EventBus, EventBusConfig, EventBusError, Manifest, PipelineError, Resource,
    ResourceKind, Result, ThreadSafeRw,
};
use assetflow_loader::{Asset, Completion, ExtensionLoader};
use assetflow_settings::PipelineConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::SetupError;
use crate::events::PipelineEvent;
use crate::groups::GroupQueue;
use crate::items::{into_texture, Items, ItemsView};
use crate::watchdog::{Watchdog, WatchdogHandle};

/// Lifecycle of a sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// Nothing dispatched yet
    Idle,
    /// Loading the group at this position of the manifest
    Dispatching(usize),
    /// Every group loaded and `end` published
    AllComplete,
}

/// Drives an [`ExtensionLoader`] through the groups of a manifest.
pub struct GroupSequencer {
    id: Uuid,
    loader: ExtensionLoader,
    events: Arc<EventBus<PipelineEvent>>,
    groups: GroupQueue,
    items: ThreadSafeRw<Items>,
    view: ItemsView,
    state: SequencerState,
    watchdog: Option<Watchdog>,
    watchdog_handle: Option<WatchdogHandle>,
}

impl GroupSequencer {
    /// Validate `manifest` and prepare the groups. Nothing is loaded until
    /// [`run`](Self::run).
    pub fn new(manifest: Manifest, loader: ExtensionLoader) -> Result<Self> {
        Self::with_event_config(manifest, loader, EventBusConfig::default())
    }

    pub fn with_event_config(
        manifest: Manifest,
        loader: ExtensionLoader,
        config: EventBusConfig,
    ) -> Result<Self> {
        manifest.validate()?;
        let (view, items) = ItemsView::new();
        let id = Uuid::new_v4();
        tracing::debug!(
            "Pipeline {} prepared with {} groups, {} resources",
            id,
            manifest.groups.len(),
            manifest.resource_count()
        );
        Ok(Self {
            id,
            loader,
            events: Arc::new(EventBus::with_config(config)),
            groups: GroupQueue::new(manifest.groups),
            items,
            view,
            state: SequencerState::Idle,
            watchdog: None,
            watchdog_handle: None,
        })
    }

    /// Sequencer with the built-in loader, bus settings and watchdog taken
    /// from `config`.
    pub fn from_config(
        manifest: Manifest,
        config: &PipelineConfig,
    ) -> std::result::Result<Self, SetupError> {
        config.validate()?;
        let mut sequencer = Self::with_event_config(
            manifest,
            ExtensionLoader::from_config(config),
            config.event_bus_config(),
        )?;
        if config.watchdog.enabled {
            sequencer.watchdog = Some(Watchdog::new(config.watchdog.timeout()));
        }
        Ok(sequencer)
    }

    /// Arm a watchdog automatically when [`run`](Self::run) starts.
    pub fn with_watchdog(mut self, timeout: Duration) -> Self {
        self.watchdog = Some(Watchdog::new(timeout));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The sequencer bus (`progress`, `error`, `groupEnd`, `end`)
    pub fn events(&self) -> &Arc<EventBus<PipelineEvent>> {
        &self.events
    }

    pub fn loader(&self) -> &ExtensionLoader {
        &self.loader
    }

    /// Read handle over the loaded items
    pub fn items(&self) -> ItemsView {
        self.view.clone()
    }

    pub fn item(&self, name: &str) -> Option<Asset> {
        self.view.get(name)
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == SequencerState::AllComplete
    }

    /// Names of fully loaded groups, in load order
    pub fn loaded_groups(&self) -> Vec<&str> {
        self.groups.loaded_names()
    }

    /// Names of groups not started yet
    pub fn pending_groups(&self) -> Vec<&str> {
        self.groups.pending_names()
    }

    /// Watchdog armed by the last [`run`](Self::run), if any
    pub fn watchdog(&self) -> Option<&WatchdogHandle> {
        self.watchdog_handle.as_ref()
    }

    /// Take ownership of the armed watchdog, e.g. to await or disarm it.
    pub fn take_watchdog(&mut self) -> Option<WatchdogHandle> {
        self.watchdog_handle.take()
    }

    /// Arm a watchdog on this pipeline's bus and items.
    pub fn arm_watchdog<F>(
        &self,
        timeout: Duration,
        on_timeout: F,
    ) -> std::result::Result<WatchdogHandle, EventBusError>
    where
        F: FnOnce(ItemsView) + Send + 'static,
    {
        Watchdog::new(timeout).arm_with_state(
            &self.events,
            self.items(),
            self.is_complete(),
            on_timeout,
        )
    }

    /// Load every remaining group, then publish `end`.
    ///
    /// Fails with [`PipelineError::AlreadyComplete`] once the pipeline has
    /// finished; nothing is published in that case.
    pub async fn run(&mut self) -> Result<()> {
        self.ensure_not_complete()?;
        let span = tracing::info_span!("pipeline", id = %self.id);
        async {
            if let Some(watchdog) = self.watchdog {
                self.watchdog_handle = Some(watchdog.arm_with_state(
                    &self.events,
                    self.view.clone(),
                    false,
                    |_| {},
                )?);
            }
            tracing::info!("Loading started");
            while !self.is_complete() {
                self.run_next_group().await?;
            }
            Ok::<(), Error>(())
        }
        .instrument(span)
        .await
    }

    /// Load the next group only.
    ///
    /// Returns the name of the loaded group, or `None` when no group was
    /// left; in both cases `end` is published after the last group.
    pub async fn run_next_group(&mut self) -> Result<Option<String>> {
        self.ensure_not_complete()?;

        let (index, name, resources) = match self.start_next_group() {
            Some(started) => started,
            None => {
                self.finish();
                return Ok(None);
            }
        };
        self.state = SequencerState::Dispatching(index);
        tracing::info!("Loading group '{}' ({} resources)", name, resources.len());

        let mut batch = self.loader.dispatch(&resources);
        while let Some(completion) = batch.next().await {
            ingest(&mut self.groups, &self.items, &self.events, completion);
        }
        drop(batch);

        if let Some(group) = self.groups.finish_current().cloned() {
            if !group.is_complete() {
                tracing::error!(
                    "Group '{}' ended with {} of {} resources",
                    name,
                    group.loaded(),
                    group.to_load()
                );
            }
            tracing::info!("Group '{}' loaded", name);
            self.events.emit(PipelineEvent::GroupEnd { group });
        }

        if !self.groups.has_pending() {
            self.finish();
        }
        Ok(Some(name))
    }

    fn start_next_group(&mut self) -> Option<(usize, String, Arc<[Resource]>)> {
        let index = self.groups.loaded_count();
        let group = self.groups.start_next()?;
        Some((index, group.name().to_string(), group.items()))
    }

    fn finish(&mut self) {
        self.state = SequencerState::AllComplete;
        tracing::info!("All groups loaded ({} items)", self.view.len());
        self.events.emit(PipelineEvent::End);
    }

    fn ensure_not_complete(&self) -> Result<()> {
        if self.is_complete() {
            return Err(PipelineError::AlreadyComplete {
                id: self.id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Count one completion against the current group and store its item.
fn ingest(
    groups: &mut GroupQueue,
    items: &ThreadSafeRw<Items>,
    events: &EventBus<PipelineEvent>,
    completion: Completion,
) {
    let Completion { resource, outcome } = completion;
    let Some(group) = groups.current_mut() else {
        tracing::error!("Completion of '{}' without a current group", resource.name);
        return;
    };
    if !group.record() {
        tracing::error!(
            "Group '{}' got more completions than resources ('{}')",
            group.name(),
            resource.name
        );
        return;
    }
    let snapshot = group.clone();

    match outcome {
        Ok(item) => {
            let item = match resource.kind {
                ResourceKind::Texture => Some(into_texture(&resource.name, item)),
                _ => item,
            };
            let stored = items.write().insert(resource.name.clone(), item.clone());
            let item = if stored {
                item
            } else {
                tracing::error!(
                    "Resource '{}' already loaded, keeping the first item",
                    resource.name
                );
                items.read().get(&resource.name).cloned()
            };
            tracing::debug!(
                "Loaded '{}' in group '{}' ({}/{})",
                resource.name,
                snapshot.name(),
                snapshot.loaded(),
                snapshot.to_load()
            );
            events.emit(PipelineEvent::Progress {
                group: snapshot,
                resource,
                item,
            });
        }
        Err(error) => {
            tracing::warn!(
                "Resource '{}' in group '{}' failed: {}",
                resource.name,
                snapshot.name(),
                error
            );
            events.emit(PipelineEvent::Failed {
                group: snapshot,
                resource,
                error,
            });
        }
    }
}

impl std::fmt::Debug for GroupSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupSequencer")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("loaded_groups", &self.groups.loaded_names())
            .field("pending_groups", &self.groups.pending_names())
            .field("items", &self.view.len())
            .finish()
    }
}
