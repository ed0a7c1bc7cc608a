//! Built-in handlers for images and glTF models.

mod image;
mod model;

pub use self::image::ImageHandler;
pub use self::model::{GltfDecoder, ModelDecoder, ModelHandler};

use std::path::{Path, PathBuf};

/// Resolve a resource source against the asset root.
///
/// Absolute sources are treated as relative to the root.
pub(crate) fn resolve_source(root: &Path, source: &str) -> PathBuf {
    root.join(source.trim_start_matches('/'))
}

pub(crate) fn to_strings(extensions: &[&str]) -> Vec<String> {
    extensions.iter().map(|e| e.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_source() {
        let root = Path::new("public");
        assert_eq!(
            resolve_source(root, "/textures/wall.jpg"),
            PathBuf::from("public/textures/wall.jpg")
        );
        assert_eq!(
            resolve_source(root, "models/room.glb"),
            PathBuf::from("public/models/room.glb")
        );
    }
}
