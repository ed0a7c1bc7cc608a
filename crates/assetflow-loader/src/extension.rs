//! File extension extraction.

use assetflow_core::{LoadError, Resource};
use regex::Regex;
use std::sync::OnceLock;

fn extension_regex() -> &'static Regex {
    static EXTENSION_REGEX: OnceLock<Regex> = OnceLock::new();
    EXTENSION_REGEX.get_or_init(|| Regex::new(r"\.([a-z]+)$").expect("invalid regex pattern"))
}

/// Trailing `.<lowercase letters>` of the resource source, without the dot.
///
/// Uppercase or numeric suffixes do not count as extensions.
pub fn extract_extension(resource: &Resource) -> Result<&str, LoadError> {
    extension_regex()
        .captures(&resource.source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| LoadError::UnresolvedExtension {
            name: resource.name.clone(),
            source_path: resource.source.clone(),
        })
}
