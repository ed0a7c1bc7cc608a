//! # assetflow
//!
//! Grouped asynchronous asset loading with a namespaced event bus.
//!
//! ## Architecture
//!
//! assetflow is organized as a workspace with multiple crates:
//!
//! 1. **assetflow-core** - Resource descriptors, event bus, errors
//! 2. **assetflow-settings** - Pipeline configuration and manifest files
//! 3. **assetflow-loader** - Extension-dispatching loader, image and glTF handlers
//! 4. **assetflow-pipeline** - Group sequencer, items view, watchdog
//! 5. **assetflow** - Re-exports and logging setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut pipeline = assetflow::pipeline_from_files(Path::new("manifest.toml"), None)?;
//! pipeline.events().subscribe("progress", |event| println!("{}", event.description()))?;
//! pipeline.run().await?;
//! let wall = pipeline.item("wall");
//! ```

use anyhow::Context;
use std::path::Path;

pub use assetflow_core::{
    Error, EventBus, EventBusConfig, EventBusError, EventKey, Group, GroupSpec, LoadError,
    Manifest, ManifestError, NamedEvent, PipelineError, Published, Resource, ResourceKind, Result,
    BASE_NAMESPACE,
};

pub use assetflow_settings::{
    load_manifest, parse_manifest, save_manifest, EventSettings, FileFormat, LoaderSettings,
    PipelineConfig, SettingsError, WatchdogSettings,
};

pub use assetflow_loader::{
    extract_extension, Asset, AssetHandler, Batch, Completion, ExtensionLoader, GltfDecoder,
    HandlerRegistry, ImageAsset, ImageHandler, LoaderEvent, ModelAsset, ModelDecoder,
    ModelHandler, Texture,
};

pub use assetflow_pipeline::{
    GroupSequencer, Items, ItemsView, PipelineEvent, SequencerState, SetupError, Watchdog,
    WatchdogHandle,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build a pipeline from a manifest file and an optional config file.
///
/// Without a config file the defaults are used.
pub fn pipeline_from_files(
    manifest_path: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<GroupSequencer> {
    let config = match config_path {
        Some(path) => PipelineConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let manifest = load_manifest(manifest_path)
        .with_context(|| format!("loading manifest {}", manifest_path.display()))?;
    let pipeline = GroupSequencer::from_config(manifest, &config)?;
    Ok(pipeline)
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Initialize logging with JSON output, one event per line
pub fn init_json_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
