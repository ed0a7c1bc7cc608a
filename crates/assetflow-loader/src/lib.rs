//! # assetflow loader
//!
//! Turns resource descriptors into loaded assets. Each resource is routed to
//! a registered [`AssetHandler`] by the extension of its source, all handlers
//! of one dispatch run concurrently, and every completion is reported on the
//! loader's event bus and through the returned [`Batch`].

pub mod asset;
pub mod extension;
pub mod handler;
pub mod handlers;
pub mod loader;

pub use asset::{Asset, ImageAsset, ModelAsset, Texture};
pub use extension::extract_extension;
pub use handler::{AssetHandler, HandlerRegistry};
pub use handlers::{GltfDecoder, ImageHandler, ModelDecoder, ModelHandler};
pub use loader::{Batch, Completion, ExtensionLoader, LoaderEvent};
