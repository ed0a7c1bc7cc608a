//! Resource and group descriptors.
//!
//! A [`Manifest`] is the declarative input of a pipeline: an ordered list of
//! [`GroupSpec`]s, each holding the [`Resource`]s loaded together. At run
//! time every spec becomes a [`Group`] that tracks its completion count.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ManifestError;

/// How a loaded resource is consumed downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Image that gets wrapped into a GPU texture
    Texture,
    /// 3D model
    Model,
    /// Anything else, stored as loaded
    #[default]
    Other,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Texture => write!(f, "texture"),
            ResourceKind::Model => write!(f, "model"),
            ResourceKind::Other => write!(f, "other"),
        }
    }
}

/// One named external resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    /// Unique key of the loaded item.
    pub name: String,
    /// Path of the file, ending in its extension.
    pub source: String,
    /// Downstream usage.
    #[serde(default, alias = "type")]
    pub kind: ResourceKind,
}

impl Resource {
    /// Create a resource of the given kind.
    pub fn new(name: impl Into<String>, source: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            kind,
        }
    }

    /// Create a texture resource.
    pub fn texture(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, source, ResourceKind::Texture)
    }

    /// Create a model resource.
    pub fn model(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, source, ResourceKind::Model)
    }

    /// Create a resource with no special handling.
    pub fn other(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, source, ResourceKind::Other)
    }
}

/// Declared group of resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Group name, reported in `groupEnd`.
    pub name: String,
    /// Resources in declaration order.
    #[serde(default)]
    pub items: Vec<Resource>,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>, items: Vec<Resource>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

/// Ordered list of groups making up one pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
}

impl Manifest {
    pub fn new(groups: Vec<GroupSpec>) -> Self {
        Self { groups }
    }

    /// Append a group.
    pub fn with_group(mut self, group: GroupSpec) -> Self {
        self.groups.push(group);
        self
    }

    /// Total number of resources across all groups.
    pub fn resource_count(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }

    /// Check group and resource names.
    ///
    /// Names must be non-empty; resource names must be unique across the
    /// whole manifest since they key the items mapping.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (index, group) in self.groups.iter().enumerate() {
            if group.name.trim().is_empty() {
                return Err(ManifestError::EmptyGroupName { index });
            }
            for resource in &group.items {
                if resource.name.trim().is_empty() {
                    return Err(ManifestError::EmptyResourceName {
                        group: group.name.clone(),
                    });
                }
                if let Some(first_group) = seen.insert(&resource.name, &group.name) {
                    return Err(ManifestError::DuplicateResource {
                        name: resource.name.clone(),
                        first_group: first_group.to_string(),
                        second_group: group.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A group while the pipeline runs.
///
/// `loaded` only moves forward and never passes `to_load`.
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    items: Arc<[Resource]>,
    to_load: usize,
    loaded: usize,
}

impl Group {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to the resources of the group.
    pub fn items(&self) -> Arc<[Resource]> {
        Arc::clone(&self.items)
    }

    pub fn to_load(&self) -> usize {
        self.to_load
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Reset the counters for a fresh dispatch.
    pub fn start(&mut self) {
        self.to_load = self.items.len();
        self.loaded = 0;
    }

    /// Count one completion. Returns `false` if the group was already full.
    pub fn record(&mut self) -> bool {
        if self.loaded >= self.to_load {
            return false;
        }
        self.loaded += 1;
        true
    }

    pub fn is_complete(&self) -> bool {
        self.loaded == self.to_load
    }
}

impl From<GroupSpec> for Group {
    fn from(spec: GroupSpec) -> Self {
        let to_load = spec.items.len();
        Self {
            name: spec.name,
            items: spec.items.into(),
            to_load,
            loaded: 0,
        }
    }
}
