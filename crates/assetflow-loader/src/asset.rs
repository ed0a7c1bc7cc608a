//! Loaded asset payloads.

use assetflow_core::LoadError;
use image::DynamicImage;
use std::sync::Arc;

/// A loaded item, cheap to clone and share.
#[derive(Debug, Clone)]
pub enum Asset {
    /// Decoded (or degraded) raster image
    Image(Arc<ImageAsset>),
    /// Parsed glTF model
    Model(Arc<ModelAsset>),
    /// Image prepared for GPU upload
    Texture(Arc<Texture>),
}

impl Asset {
    /// Short payload name for logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            Asset::Image(_) => "image",
            Asset::Model(_) => "model",
            Asset::Texture(_) => "texture",
        }
    }

    pub fn as_image(&self) -> Option<&Arc<ImageAsset>> {
        match self {
            Asset::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Arc<ModelAsset>> {
        match self {
            Asset::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&Arc<Texture>> {
        match self {
            Asset::Texture(texture) => Some(texture),
            _ => None,
        }
    }
}

impl From<ImageAsset> for Asset {
    fn from(image: ImageAsset) -> Self {
        Asset::Image(Arc::new(image))
    }
}

impl From<ModelAsset> for Asset {
    fn from(model: ModelAsset) -> Self {
        Asset::Model(Arc::new(model))
    }
}

impl From<Texture> for Asset {
    fn from(texture: Texture) -> Self {
        Asset::Texture(Arc::new(texture))
    }
}

/// A raster image.
///
/// When reading or decoding fails the image is still produced, without
/// pixels and with the failure attached, so consumers always get an item.
pub struct ImageAsset {
    source: String,
    pixels: Option<DynamicImage>,
    error: Option<LoadError>,
}

impl ImageAsset {
    pub fn decoded(source: impl Into<String>, pixels: DynamicImage) -> Self {
        Self {
            source: source.into(),
            pixels: Some(pixels),
            error: None,
        }
    }

    pub fn degraded(source: impl Into<String>, error: LoadError) -> Self {
        Self {
            source: source.into(),
            pixels: None,
            error: Some(error),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pixels(&self) -> Option<&DynamicImage> {
        self.pixels.as_ref()
    }

    pub fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    pub fn is_degraded(&self) -> bool {
        self.pixels.is_none()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.pixels.as_ref().map(|p| (p.width(), p.height()))
    }
}

impl std::fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAsset")
            .field("source", &self.source)
            .field("dimensions", &self.dimensions())
            .field("error", &self.error)
            .finish()
    }
}

/// A validated glTF document with the data it references.
///
/// Imported models carry every buffer and image; a document-only model
/// keeps just the GLB binary chunk.
pub struct ModelAsset {
    source: String,
    document: gltf::Document,
    blob: Option<Vec<u8>>,
    buffers: Vec<gltf::buffer::Data>,
    images: Vec<gltf::image::Data>,
    decoder: String,
}

impl ModelAsset {
    /// Document-only model
    pub fn new(source: impl Into<String>, gltf: gltf::Gltf, decoder: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            document: gltf.document,
            blob: gltf.blob,
            buffers: Vec::new(),
            images: Vec::new(),
            decoder: decoder.into(),
        }
    }

    /// Model with its buffers and images resolved
    pub fn imported(
        source: impl Into<String>,
        document: gltf::Document,
        buffers: Vec<gltf::buffer::Data>,
        images: Vec<gltf::image::Data>,
        decoder: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            document,
            blob: None,
            buffers,
            images,
            decoder: decoder.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn document(&self) -> &gltf::Document {
        &self.document
    }

    /// GLB binary chunk of a document-only model
    pub fn blob(&self) -> Option<&[u8]> {
        self.blob.as_deref()
    }

    /// Buffer contents, indexed like `document().buffers()`
    pub fn buffers(&self) -> &[gltf::buffer::Data] {
        &self.buffers
    }

    /// Decoded images, indexed like `document().images()`
    pub fn images(&self) -> &[gltf::image::Data] {
        &self.images
    }

    /// Name of the decoder that produced the model
    pub fn decoder(&self) -> &str {
        &self.decoder
    }

    pub fn mesh_count(&self) -> usize {
        self.document.meshes().count()
    }

    pub fn node_count(&self) -> usize {
        self.document.nodes().count()
    }
}

impl std::fmt::Debug for ModelAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAsset")
            .field("source", &self.source)
            .field("decoder", &self.decoder)
            .field("meshes", &self.mesh_count())
            .field("nodes", &self.node_count())
            .field("buffers", &self.buffers.len())
            .field("images", &self.images.len())
            .field("blob_len", &self.blob.as_ref().map(Vec::len))
            .finish()
    }
}

/// An image wrapped for GPU upload.
#[derive(Debug)]
pub struct Texture {
    image: Option<Arc<ImageAsset>>,
    needs_update: bool,
}

impl Texture {
    /// Wrap an image and flag it for upload.
    pub fn new(image: Option<Arc<ImageAsset>>) -> Self {
        Self {
            image,
            needs_update: true,
        }
    }

    pub fn image(&self) -> Option<&Arc<ImageAsset>> {
        self.image.as_ref()
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }
}
