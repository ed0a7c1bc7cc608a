use assetflow_core::{LoadError, Resource};
use async_trait::async_trait;
use std::path::PathBuf;

use super::{resolve_source, to_strings};
use crate::asset::{Asset, ImageAsset};
use crate::handler::AssetHandler;

/// Reads and decodes raster images.
///
/// Never fails: unreadable or undecodable files complete with a degraded
/// [`ImageAsset`].
#[derive(Debug, Clone)]
pub struct ImageHandler {
    root: PathBuf,
    extensions: Vec<String>,
}

impl ImageHandler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: to_strings(&["jpg", "png"]),
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    async fn read_and_decode(&self, resource: &Resource) -> ImageAsset {
        let path = resolve_source(&self.root, &resource.source);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return ImageAsset::degraded(
                    &resource.source,
                    LoadError::Io {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    },
                )
            }
        };

        let decoded = tokio::task::spawn_blocking(move || ::image::load_from_memory(&bytes)).await;
        match decoded {
            Ok(Ok(pixels)) => ImageAsset::decoded(&resource.source, pixels),
            Ok(Err(e)) => ImageAsset::degraded(
                &resource.source,
                LoadError::Decode {
                    name: resource.name.clone(),
                    reason: e.to_string(),
                },
            ),
            Err(e) => ImageAsset::degraded(
                &resource.source,
                LoadError::Decode {
                    name: resource.name.clone(),
                    reason: format!("decode task failed: {}", e),
                },
            ),
        }
    }
}

#[async_trait]
impl AssetHandler for ImageHandler {
    fn name(&self) -> &str {
        "image"
    }

    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    async fn load(&self, resource: &Resource) -> Result<Option<Asset>, LoadError> {
        let image = self.read_and_decode(resource).await;
        match image.error() {
            Some(error) => tracing::warn!("Image '{}' degraded: {}", resource.name, error),
            None => tracing::debug!(
                "Image '{}' decoded {:?}",
                resource.name,
                image.dimensions().unwrap_or_default()
            ),
        }
        Ok(Some(image.into()))
    }
}
