//! Manifest files.
//!
//! A manifest can be written as a bare JSON array of groups, or as a table
//! with a `groups` key in JSON or TOML (`[[groups]]`).

use assetflow_core::{GroupSpec, Manifest, ManifestError};
use serde::Deserialize;
use std::path::Path;

use crate::config::FileFormat;
use crate::error::SettingsResult;

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestRepr {
    Groups(Vec<GroupSpec>),
    Table(Manifest),
}

impl From<ManifestRepr> for Manifest {
    fn from(repr: ManifestRepr) -> Self {
        match repr {
            ManifestRepr::Groups(groups) => Manifest::new(groups),
            ManifestRepr::Table(manifest) => manifest,
        }
    }
}

/// Read and validate a manifest file (`.json` or `.toml`).
pub fn load_manifest(path: &Path) -> SettingsResult<Manifest> {
    let format = FileFormat::from_path(path).map_err(|_| ManifestError::UnsupportedFormat {
        extension: path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default(),
    })?;
    let content = std::fs::read_to_string(path)?;
    let manifest = parse_manifest(&content, format)?;
    tracing::debug!(
        "Loaded manifest {} ({} groups, {} resources)",
        path.display(),
        manifest.groups.len(),
        manifest.resource_count()
    );
    Ok(manifest)
}

/// Parse and validate manifest content.
pub fn parse_manifest(content: &str, format: FileFormat) -> SettingsResult<Manifest> {
    let manifest = match format {
        FileFormat::Json => serde_json::from_str::<ManifestRepr>(content)
            .map(Manifest::from)
            .map_err(|e| ManifestError::InvalidFormat {
                reason: e.to_string(),
            })?,
        FileFormat::Toml => {
            toml::from_str::<Manifest>(content).map_err(|e| ManifestError::InvalidFormat {
                reason: e.to_string(),
            })?
        }
    };
    manifest.validate()?;
    Ok(manifest)
}

/// Validate and write a manifest; JSON files get the table form.
pub fn save_manifest(manifest: &Manifest, path: &Path) -> SettingsResult<()> {
    manifest.validate()?;
    let content = match FileFormat::from_path(path)? {
        FileFormat::Json => serde_json::to_string_pretty(manifest)?,
        FileFormat::Toml => toml::to_string_pretty(manifest)?,
    };
    std::fs::write(path, content)?;
    Ok(())
}
