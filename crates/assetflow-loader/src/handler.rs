//! Handler trait and registry.

use assetflow_core::{LoadError, Resource};
use assetflow_settings::LoaderSettings;
use async_trait::async_trait;
use std::sync::Arc;

use crate::asset::Asset;
use crate::handlers::{ImageHandler, ModelHandler};

/// Loads resources with particular file extensions.
///
/// `Ok(None)` is a completed load without a payload. `Err` is reported as
/// a failure completion; either way the resource counts as done.
#[async_trait]
pub trait AssetHandler: Send + Sync {
    /// Handler name for logs
    fn name(&self) -> &str;

    /// Lowercase extensions, without the dot
    fn extensions(&self) -> &[String];

    fn handles(&self, extension: &str) -> bool {
        self.extensions().iter().any(|e| e == extension)
    }

    async fn load(&self, resource: &Resource) -> Result<Option<Asset>, LoadError>;
}

/// Ordered set of handlers; the first one accepting an extension wins.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn AssetHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the image and model handlers configured from settings
    pub fn from_settings(settings: &LoaderSettings) -> Self {
        let mut registry = Self::new();
        registry
            .register(
                ImageHandler::new(&settings.asset_root)
                    .with_extensions(settings.image_extensions.clone()),
            )
            .register(
                ModelHandler::new(&settings.asset_root)
                    .with_extensions(settings.model_extensions.clone()),
            );
        registry
    }

    /// Register a handler after the existing ones
    pub fn register<H>(&mut self, handler: H) -> &mut Self
    where
        H: AssetHandler + 'static,
    {
        self.register_shared(Arc::new(handler))
    }

    /// Register an already shared handler
    pub fn register_shared(&mut self, handler: Arc<dyn AssetHandler>) -> &mut Self {
        tracing::debug!(
            "Registered handler '{}' for [{}]",
            handler.name(),
            handler.extensions().join(", ")
        );
        self.handlers.push(handler);
        self
    }

    /// First handler accepting `extension`
    pub fn find(&self, extension: &str) -> Option<&Arc<dyn AssetHandler>> {
        self.handlers.iter().find(|h| h.handles(extension))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handler names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
