//! Event keys and specifier parsing.

use super::bus::EventBusError;

/// Namespace used when a specifier has none.
///
/// Publishing to it broadcasts across every namespace.
pub const BASE_NAMESPACE: &str = "base";

/// A validated `(event name, namespace)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    name: String,
    namespace: String,
}

impl EventKey {
    /// Build a key from its parts, validating both.
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<Self, EventBusError> {
        let name = name.into();
        let namespace = namespace.into();
        check_segment(&name, &name)?;
        check_segment(&namespace, &namespace)?;
        Ok(Self { name, namespace })
    }

    /// Build a key in the base namespace.
    pub fn base(name: impl Into<String>) -> Result<Self, EventBusError> {
        Self::new(name, BASE_NAMESPACE)
    }

    /// Parse a single `event` or `event.namespace` specifier.
    pub fn parse(specifier: &str) -> Result<Self, EventBusError> {
        let specifier = specifier.trim();
        if specifier.is_empty() {
            return Err(EventBusError::EmptyNames);
        }
        let (name, namespace) = split_specifier(specifier)?;
        let name = name.ok_or_else(|| EventBusError::InvalidSpecifier {
            specifier: specifier.to_string(),
            reason: "missing event name",
        })?;
        Ok(Self {
            name: name.to_string(),
            namespace: namespace.unwrap_or(BASE_NAMESPACE).to_string(),
        })
    }

    /// Parse a list of specifiers separated by comma, slash or whitespace.
    ///
    /// Fails on the first malformed specifier so nothing is half-registered.
    pub fn parse_list(names: &str) -> Result<Vec<Self>, EventBusError> {
        let keys = specifiers(names)
            .map(Self::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if keys.is_empty() {
            return Err(EventBusError::EmptyNames);
        }
        Ok(keys)
    }

    /// Event name part.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace part.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether this key targets the broadcast namespace.
    pub fn is_base(&self) -> bool {
        self.namespace == BASE_NAMESPACE
    }
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_base() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.name, self.namespace)
        }
    }
}

/// What an unsubscribe specifier removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selector {
    /// `event`: the event in every namespace.
    Event(String),
    /// `event.ns`: the event in one namespace.
    Scoped { name: String, namespace: String },
    /// `.ns`: the whole namespace.
    Namespace(String),
}

impl Selector {
    pub(crate) fn parse_list(names: &str) -> Result<Vec<Self>, EventBusError> {
        let mut selectors = Vec::new();
        for specifier in specifiers(names) {
            let selector = match split_specifier(specifier)? {
                (Some(name), None) => Selector::Event(name.to_string()),
                (Some(name), Some(namespace)) => Selector::Scoped {
                    name: name.to_string(),
                    namespace: namespace.to_string(),
                },
                (None, Some(namespace)) => Selector::Namespace(namespace.to_string()),
                (None, None) => continue,
            };
            selectors.push(selector);
        }
        if selectors.is_empty() {
            return Err(EventBusError::EmptyNames);
        }
        Ok(selectors)
    }
}

fn specifiers(names: &str) -> impl Iterator<Item = &str> {
    names
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|part| !part.is_empty())
}

/// Split `name[.namespace]`, either side may be empty.
fn split_specifier(specifier: &str) -> Result<(Option<&str>, Option<&str>), EventBusError> {
    let mut parts = specifier.split('.');
    let name = parts.next().unwrap_or_default();
    let namespace = parts.next().unwrap_or_default();
    if parts.next().is_some() {
        return Err(EventBusError::InvalidSpecifier {
            specifier: specifier.to_string(),
            reason: "more than one namespace separator",
        });
    }

    let name = (!name.is_empty()).then_some(name);
    let namespace = (!namespace.is_empty()).then_some(namespace);
    if let Some(name) = name {
        check_segment(name, specifier)?;
    }
    if let Some(namespace) = namespace {
        check_segment(namespace, specifier)?;
    }
    Ok((name, namespace))
}

fn check_segment(segment: &str, specifier: &str) -> Result<(), EventBusError> {
    if segment.is_empty() {
        return Err(EventBusError::InvalidSpecifier {
            specifier: specifier.to_string(),
            reason: "empty segment",
        });
    }
    if !segment.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(EventBusError::InvalidSpecifier {
            specifier: specifier.to_string(),
            reason: "only ASCII letters and digits are allowed",
        });
    }
    Ok(())
}
