use assetflow_core::{LoadError, Resource};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{resolve_source, to_strings};
use crate::asset::{Asset, ModelAsset};
use crate::handler::AssetHandler;

/// Geometry compression extensions. No decoder for them is bundled.
const COMPRESSION_EXTENSIONS: [&str; 2] =
    ["KHR_draco_mesh_compression", "EXT_meshopt_compression"];

/// Turns model bytes into a [`ModelAsset`].
#[async_trait]
pub trait ModelDecoder: Send + Sync {
    fn name(&self) -> &str;

    /// Decode `bytes` of `resource`. Relative URIs resolve against `base`.
    async fn decode(
        &self,
        resource: &Resource,
        bytes: Arc<[u8]>,
        base: &Path,
    ) -> Result<ModelAsset, LoadError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GltfMode {
    Import,
    Document,
}

/// glTF / GLB decoder.
///
/// Documents are validated before use, and documents requiring any
/// extension (compressed geometry included) are refused.
#[derive(Debug, Clone)]
pub struct GltfDecoder {
    mode: GltfMode,
}

impl GltfDecoder {
    /// Loads the document together with every buffer and image it references
    pub fn importing() -> Self {
        Self {
            mode: GltfMode::Import,
        }
    }

    /// Loads the document and its GLB chunk, nothing external
    pub fn document() -> Self {
        Self {
            mode: GltfMode::Document,
        }
    }

    fn label(&self) -> &'static str {
        match self.mode {
            GltfMode::Import => "gltf-import",
            GltfMode::Document => "gltf",
        }
    }

    fn parse(
        &self,
        resource: &Resource,
        bytes: &[u8],
        base: &Path,
    ) -> Result<ModelAsset, LoadError> {
        let model_error = |reason: String| LoadError::ModelLoad {
            name: resource.name.clone(),
            reason,
        };

        let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| model_error(e.to_string()))?;
        check_required_extensions(&gltf.document).map_err(model_error)?;

        match self.mode {
            GltfMode::Document => Ok(ModelAsset::new(
                resource.source.clone(),
                gltf,
                self.label(),
            )),
            GltfMode::Import => {
                let gltf::Gltf { document, blob } = gltf;
                let buffers = gltf::import_buffers(&document, Some(base), blob)
                    .map_err(|e| model_error(format!("buffers: {}", e)))?;
                let images = gltf::import_images(&document, Some(base), &buffers)
                    .map_err(|e| model_error(format!("images: {}", e)))?;
                Ok(ModelAsset::imported(
                    resource.source.clone(),
                    document,
                    buffers,
                    images,
                    self.label(),
                ))
            }
        }
    }
}

fn check_required_extensions(document: &gltf::Document) -> Result<(), String> {
    let required: Vec<String> = document
        .extensions_required()
        .map(|e| e.to_string())
        .collect();
    if required.is_empty() {
        return Ok(());
    }
    let compressed: Vec<&str> = required
        .iter()
        .map(String::as_str)
        .filter(|e| COMPRESSION_EXTENSIONS.contains(e))
        .collect();
    if !compressed.is_empty() {
        return Err(format!(
            "compressed geometry ({}) cannot be decoded",
            compressed.join(", ")
        ));
    }
    Err(format!(
        "unsupported required extensions: {}",
        required.join(", ")
    ))
}

#[async_trait]
impl ModelDecoder for GltfDecoder {
    fn name(&self) -> &str {
        self.label()
    }

    async fn decode(
        &self,
        resource: &Resource,
        bytes: Arc<[u8]>,
        base: &Path,
    ) -> Result<ModelAsset, LoadError> {
        let decoder = self.clone();
        let task_resource = resource.clone();
        let base = base.to_path_buf();
        let parsed =
            tokio::task::spawn_blocking(move || decoder.parse(&task_resource, &bytes, &base)).await;
        match parsed {
            Ok(result) => result,
            Err(e) => Err(LoadError::ModelLoad {
                name: resource.name.clone(),
                reason: format!("decode task failed: {}", e),
            }),
        }
    }
}

/// Loads glTF models with one fallback decoder.
///
/// If both decoders fail the model completes without a payload.
#[derive(Clone)]
pub struct ModelHandler {
    root: PathBuf,
    extensions: Vec<String>,
    primary: Arc<dyn ModelDecoder>,
    fallback: Arc<dyn ModelDecoder>,
}

impl ModelHandler {
    /// Full import first, document only as the fallback.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_decoders(
            root,
            Arc::new(GltfDecoder::importing()),
            Arc::new(GltfDecoder::document()),
        )
    }

    pub fn with_decoders(
        root: impl Into<PathBuf>,
        primary: Arc<dyn ModelDecoder>,
        fallback: Arc<dyn ModelDecoder>,
    ) -> Self {
        Self {
            root: root.into(),
            extensions: to_strings(&["glb", "gltf"]),
            primary,
            fallback,
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }
}

#[async_trait]
impl AssetHandler for ModelHandler {
    fn name(&self) -> &str {
        "model"
    }

    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    async fn load(&self, resource: &Resource) -> Result<Option<Asset>, LoadError> {
        let path = resolve_source(&self.root, &resource.source);
        let bytes: Arc<[u8]> = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes.into(),
            Err(e) => {
                tracing::error!(
                    "Model '{}' could not be read from {}: {}",
                    resource.name,
                    path.display(),
                    e
                );
                return Ok(None);
            }
        };
        let base = path.parent().unwrap_or(self.root.as_path());

        let error = match self.primary.decode(resource, bytes.clone(), base).await {
            Ok(model) => return Ok(Some(model.into())),
            Err(error) => error,
        };
        tracing::warn!(
            "Decoder '{}' failed: {}. Retrying '{}' with '{}'",
            self.primary.name(),
            error,
            resource.name,
            self.fallback.name()
        );

        match self.fallback.decode(resource, bytes, base).await {
            Ok(model) => Ok(Some(model.into())),
            Err(error) => {
                tracing::error!("Model '{}' failed to load: {}", resource.name, error);
                Ok(None)
            }
        }
    }
}
