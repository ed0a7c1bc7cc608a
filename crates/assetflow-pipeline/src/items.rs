//! Loaded items mapping and its read-only view.

use assetflow_core::{thread_safe_rw, ThreadSafeRw};
use assetflow_loader::{Asset, Texture};
use std::collections::HashMap;

/// Resource name to loaded item. Write-once per name.
///
/// A `None` value records a resource that completed without a payload.
#[derive(Debug, Default)]
pub struct Items {
    entries: HashMap<String, Option<Asset>>,
}

impl Items {
    /// Store `item` unless `name` is already present. Returns whether it
    /// was stored.
    pub fn insert(&mut self, name: String, item: Option<Asset>) -> bool {
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(name, item);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.entries.get(name).and_then(Option::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Cloneable read handle over the sequencer's items.
///
/// Stays valid while the pipeline runs, so partial results can be
/// inspected at any time.
#[derive(Debug, Clone)]
pub struct ItemsView {
    inner: ThreadSafeRw<Items>,
}

impl ItemsView {
    pub(crate) fn new() -> (Self, ThreadSafeRw<Items>) {
        let inner = thread_safe_rw(Items::default());
        (
            Self {
                inner: inner.clone(),
            },
            inner,
        )
    }

    /// Loaded item for `name`; `None` if absent or loaded without payload
    pub fn get(&self, name: &str) -> Option<Asset> {
        self.inner.read().get(name).cloned()
    }

    /// Whether `name` completed, with or without payload
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().contains(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.inner.read().names()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Wrap a loaded item into a texture flagged for upload.
///
/// Textures pass through unchanged. Models cannot be textures and are
/// returned as they are.
pub(crate) fn into_texture(name: &str, item: Option<Asset>) -> Asset {
    match item {
        Some(Asset::Texture(texture)) => Asset::Texture(texture),
        Some(Asset::Image(image)) => Texture::new(Some(image)).into(),
        Some(model @ Asset::Model(_)) => {
            tracing::warn!("Resource '{}' is a model and cannot be a texture", name);
            model
        }
        None => Texture::new(None).into(),
    }
}
