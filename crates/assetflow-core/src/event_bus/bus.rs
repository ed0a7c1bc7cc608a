//! Event Bus implementation.
//!
//! Provides the namespaced [`EventBus`] embedded by the loader and the
//! sequencer.

use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use super::events::{NamedEvent, Published};
use super::key::{EventKey, Selector, BASE_NAMESPACE};
use crate::types::{EventHandler, HandlerList};

/// Configuration for the event bus
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Channel capacity for async receivers.
    pub channel_capacity: usize,
    /// Whether to keep event history.
    pub enable_history: bool,
    /// Maximum number of events to retain in history.
    pub max_history_size: usize,
    /// How long to retain events in history.
    pub history_retention: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            enable_history: false,
            max_history_size: 1000,
            history_retention: Duration::from_secs(300),
        }
    }
}

/// Event with timestamp for history
#[derive(Debug, Clone)]
struct TimestampedEvent<A> {
    event: Published<A>,
    timestamp: Instant,
}

/// Error types for event bus operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventBusError {
    /// No event specifier was given
    #[error("No event names given")]
    EmptyNames,
    /// A specifier could not be parsed
    #[error("Invalid event specifier '{specifier}': {reason}")]
    InvalidSpecifier {
        /// The offending specifier.
        specifier: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Callbacks of one namespace, keyed by event name.
struct Namespace<A, R> {
    name: String,
    events: HashMap<String, HandlerList<A, R>>,
}

impl<A, R> Namespace<A, R> {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            events: HashMap::new(),
        }
    }

    fn callback_count(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }
}

/// Namespaced publish/subscribe bus.
///
/// `A` is the argument payload handed to every callback, `R` the optional
/// value a callback can return to the publisher.
pub struct EventBus<A, R = ()> {
    /// Broadcast channel sender
    sender: broadcast::Sender<Published<A>>,
    /// Namespaces in creation order, `base` first
    namespaces: RwLock<Vec<Namespace<A, R>>>,
    /// Event history (optional)
    history: RwLock<VecDeque<TimestampedEvent<A>>>,
    /// Configuration
    config: EventBusConfig,
}

impl<A, R> EventBus<A, R>
where
    A: Clone + Send + Sync + 'static,
    R: 'static,
{
    /// Create a new event bus with default configuration
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create a new event bus with custom configuration
    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            namespaces: RwLock::new(vec![Namespace::new(BASE_NAMESPACE)]),
            history: RwLock::new(VecDeque::new()),
            config,
        }
    }

    /// Register `callback` for every specifier in `names`.
    ///
    /// Returns the bus so registrations can be chained with `?`.
    pub fn subscribe<F>(&self, names: &str, callback: F) -> Result<&Self, EventBusError>
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        self.subscribe_with_result(names, move |args| {
            callback(args);
            None
        })
    }

    /// Register a callback that may hand a result back to the publisher.
    pub fn subscribe_with_result<F>(
        &self,
        names: &str,
        callback: F,
    ) -> Result<&Self, EventBusError>
    where
        F: Fn(&A) -> Option<R> + Send + Sync + 'static,
    {
        let keys = EventKey::parse_list(names)
            .inspect_err(|e| tracing::warn!("Rejected subscription '{}': {}", names, e))?;

        let handler: EventHandler<A, R> = Arc::new(callback);
        let mut namespaces = self.namespaces.write();
        for key in &keys {
            namespace_mut(&mut namespaces, key.namespace())
                .events
                .entry(key.name().to_string())
                .or_default()
                .push(handler.clone());
            tracing::debug!("Subscription to {} added", key);
        }
        Ok(self)
    }

    /// Publish `args` under the first specifier of `name`.
    ///
    /// Returns the first `Some` produced by a callback.
    pub fn publish(&self, name: &str, args: A) -> Result<Option<R>, EventBusError> {
        let keys = EventKey::parse_list(name)
            .inspect_err(|e| tracing::warn!("Rejected publish '{}': {}", name, e))?;
        if keys.len() > 1 {
            tracing::debug!("Publish '{}' only honours its first specifier", name);
        }
        let key = keys.into_iter().next().ok_or(EventBusError::EmptyNames)?;
        Ok(self.publish_key(&key, args))
    }

    /// Publish `args` under an already validated key.
    ///
    /// A base key reaches the event in every namespace, in namespace
    /// creation order; any other key reaches its own namespace only.
    /// Callbacks run on a snapshot taken before the first call, so they may
    /// subscribe, unsubscribe or publish themselves.
    pub fn publish_key(&self, key: &EventKey, args: A) -> Option<R> {
        if self.config.enable_history {
            self.add_to_history(key, &args);
        }

        let handlers = self.matching_handlers(key);
        let mut result = None;
        for handler in &handlers {
            let value = handler(&args);
            if result.is_none() {
                result = value;
            }
        }

        // An error here only means no async receiver is alive.
        let _ = self.sender.send(Published {
            key: key.clone(),
            args,
        });
        result
    }

    /// Publish an event under its own name in the base namespace.
    pub fn emit(&self, event: A) -> Option<R>
    where
        A: NamedEvent,
    {
        match EventKey::base(event.name()) {
            Ok(key) => {
                tracing::trace!("Emitting {}", event.description());
                self.publish_key(&key, event)
            }
            Err(e) => {
                tracing::warn!("Cannot emit '{}': {}", event.name(), e);
                None
            }
        }
    }

    /// Remove callbacks.
    ///
    /// `event` clears the event in every namespace, `event.ns` in `ns`
    /// only, `.ns` drops the whole namespace. The base namespace is only
    /// ever emptied, never dropped. Returns the number of removed callbacks.
    pub fn unsubscribe(&self, names: &str) -> Result<usize, EventBusError> {
        let selectors = Selector::parse_list(names)
            .inspect_err(|e| tracing::warn!("Rejected unsubscribe '{}': {}", names, e))?;

        let mut namespaces = self.namespaces.write();
        let mut removed = 0;
        for selector in selectors {
            match selector {
                Selector::Event(name) => {
                    for namespace in namespaces.iter_mut() {
                        removed += namespace.events.remove(&name).map_or(0, |list| list.len());
                    }
                }
                Selector::Scoped { name, namespace } => {
                    if let Some(target) = namespaces.iter_mut().find(|ns| ns.name == namespace) {
                        removed += target.events.remove(&name).map_or(0, |list| list.len());
                    }
                }
                Selector::Namespace(namespace) if namespace == BASE_NAMESPACE => {
                    if let Some(base) = namespaces.iter_mut().find(|ns| ns.name == namespace) {
                        removed += base.callback_count();
                        base.events.clear();
                    }
                }
                Selector::Namespace(namespace) => {
                    if let Some(index) = namespaces.iter().position(|ns| ns.name == namespace) {
                        removed += namespaces.remove(index).callback_count();
                    }
                }
            }
        }
        tracing::debug!("Unsubscribe '{}' removed {} callbacks", names, removed);
        Ok(removed)
    }

    /// Get a receiver for manual event polling
    ///
    /// Useful in async contexts where a task wants to await events rather
    /// than register a callback.
    pub fn receiver(&self) -> broadcast::Receiver<Published<A>> {
        self.sender.subscribe()
    }

    /// Total number of registered callbacks across all namespaces
    pub fn subscriber_count(&self) -> usize {
        self.namespaces
            .read()
            .iter()
            .map(Namespace::callback_count)
            .sum()
    }

    /// Namespace names in iteration order
    pub fn namespaces(&self) -> Vec<String> {
        self.namespaces
            .read()
            .iter()
            .map(|ns| ns.name.clone())
            .collect()
    }

    /// Get recent event history (if enabled)
    ///
    /// Returns events since the given instant, or all history if None.
    pub fn history(&self, since: Option<Instant>) -> Vec<Published<A>> {
        if !self.config.enable_history {
            return Vec::new();
        }

        let history = self.history.read();
        match since {
            Some(since) => history
                .iter()
                .filter(|e| e.timestamp >= since)
                .map(|e| e.event.clone())
                .collect(),
            None => history.iter().map(|e| e.event.clone()).collect(),
        }
    }

    /// Clear event history
    pub fn clear_history(&self) {
        self.history.write().clear();
    }

    /// Get the current configuration
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    fn matching_handlers(&self, key: &EventKey) -> HandlerList<A, R> {
        let namespaces = self.namespaces.read();
        if key.is_base() {
            namespaces
                .iter()
                .filter_map(|ns| ns.events.get(key.name()))
                .flatten()
                .cloned()
                .collect()
        } else {
            namespaces
                .iter()
                .find(|ns| ns.name == key.namespace())
                .and_then(|ns| ns.events.get(key.name()))
                .cloned()
                .unwrap_or_default()
        }
    }

    /// Add an event to history, maintaining size and age limits
    fn add_to_history(&self, key: &EventKey, args: &A) {
        let mut history = self.history.write();
        let now = Instant::now();

        history.push_back(TimestampedEvent {
            event: Published {
                key: key.clone(),
                args: args.clone(),
            },
            timestamp: now,
        });

        let retention = self.config.history_retention;
        while history
            .front()
            .is_some_and(|e| now.duration_since(e.timestamp) > retention)
        {
            history.pop_front();
        }

        while history.len() > self.config.max_history_size {
            history.pop_front();
        }
    }
}

fn namespace_mut<'a, A, R>(
    namespaces: &'a mut Vec<Namespace<A, R>>,
    name: &str,
) -> &'a mut Namespace<A, R> {
    let index = match namespaces.iter().position(|ns| ns.name == name) {
        Some(index) => index,
        None => {
            namespaces.push(Namespace::new(name));
            namespaces.len() - 1
        }
    };
    &mut namespaces[index]
}

impl<A, R> Default for EventBus<A, R>
where
    A: Clone + Send + Sync + 'static,
    R: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> std::fmt::Debug for EventBus<A, R>
where
    A: Clone + Send + Sync + 'static,
    R: 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("namespaces", &self.namespaces())
            .field("subscribers", &self.subscriber_count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&u32) + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |label: &str| {
            let sink = sink.clone();
            let label = label.to_string();
            Box::new(move |value: &u32| sink.lock().push(format!("{label}:{value}")))
                as Box<dyn Fn(&u32) + Send + Sync>
        };
        (log, make)
    }

    #[test]
    fn test_event_bus_creation() {
        let bus: EventBus<u32> = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.namespaces(), vec![BASE_NAMESPACE.to_string()]);
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus: EventBus<u32> = EventBus::new();

        bus.subscribe("progress", |_| {}).unwrap();
        assert_eq!(bus.subscriber_count(), 1);

        assert_eq!(bus.unsubscribe("progress").unwrap(), 1);
        assert_eq!(bus.subscriber_count(), 0);

        // Double unsubscribe removes nothing
        assert_eq!(bus.unsubscribe("progress").unwrap(), 0);
    }

    #[test]
    fn test_chained_subscriptions() {
        let bus: EventBus<u32> = EventBus::new();
        bus.subscribe("progress", |_| {})
            .and_then(|bus| bus.subscribe("groupEnd", |_| {}))
            .and_then(|bus| bus.subscribe("end.hud", |_| {}))
            .unwrap();
        assert_eq!(bus.subscriber_count(), 3);
        assert_eq!(
            bus.namespaces(),
            vec![BASE_NAMESPACE.to_string(), "hud".to_string()]
        );
    }

    #[test]
    fn test_multiple_specifiers_share_callback() {
        let bus: EventBus<u32> = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        bus.subscribe("groupEnd, end/progress", move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(bus.subscriber_count(), 3);

        bus.publish("groupEnd", 0).unwrap();
        bus.publish("end", 0).unwrap();
        bus.publish("progress", 0).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_base_publish_broadcasts_to_all_namespaces() {
        let bus: EventBus<u32> = EventBus::new();
        let (log, make) = recorder();

        bus.subscribe("foo.bar", make("bar")).unwrap();
        bus.subscribe("foo", make("base-1")).unwrap();
        bus.subscribe("foo", make("base-2")).unwrap();
        bus.subscribe("other", make("other")).unwrap();

        bus.publish("foo", 7).unwrap();

        // base namespace is always iterated first
        assert_eq!(*log.lock(), vec!["base-1:7", "base-2:7", "bar:7"]);
    }

    #[test]
    fn test_scoped_publish_reaches_only_its_namespace() {
        let bus: EventBus<u32> = EventBus::new();
        let (log, make) = recorder();

        bus.subscribe("foo", make("base")).unwrap();
        bus.subscribe("foo.bar", make("bar")).unwrap();
        bus.subscribe("foo.baz", make("baz")).unwrap();

        bus.publish("foo.bar", 1).unwrap();
        assert_eq!(*log.lock(), vec!["bar:1"]);
    }

    #[test]
    fn test_publish_honours_first_specifier_only() {
        let bus: EventBus<u32> = EventBus::new();
        let (log, make) = recorder();

        bus.subscribe("first", make("first")).unwrap();
        bus.subscribe("second", make("second")).unwrap();

        bus.publish("first second", 3).unwrap();
        assert_eq!(*log.lock(), vec!["first:3"]);
    }

    #[test]
    fn test_first_result_wins() {
        let bus: EventBus<u32, String> = EventBus::new();
        bus.subscribe("resolve", |_| {}).unwrap();
        bus.subscribe_with_result("resolve", |value| Some(format!("first {value}")))
            .unwrap();
        bus.subscribe_with_result("resolve.late", |value| Some(format!("second {value}")))
            .unwrap();

        let result = bus.publish("resolve", 4).unwrap();
        assert_eq!(result.as_deref(), Some("first 4"));

        assert_eq!(bus.publish("unknown", 4).unwrap(), None);
    }

    #[test]
    fn test_malformed_names_are_rejected() {
        let bus: EventBus<u32> = EventBus::new();
        assert_eq!(
            bus.subscribe("", |_| {}).err(),
            Some(EventBusError::EmptyNames)
        );
        assert!(matches!(
            bus.subscribe("load-end", |_| {}),
            Err(EventBusError::InvalidSpecifier { .. })
        ));
        assert!(bus.publish("", 1).is_err());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_selectors() {
        let bus: EventBus<u32> = EventBus::new();
        bus.subscribe("foo foo.hud bar.hud baz", |_| {}).unwrap();
        assert_eq!(bus.subscriber_count(), 4);

        assert_eq!(bus.unsubscribe("foo.hud").unwrap(), 1);
        assert_eq!(bus.subscriber_count(), 3);

        assert_eq!(bus.unsubscribe(".hud").unwrap(), 1);
        assert_eq!(bus.namespaces(), vec![BASE_NAMESPACE.to_string()]);

        assert_eq!(bus.unsubscribe(".base").unwrap(), 2);
        assert_eq!(bus.namespaces(), vec![BASE_NAMESPACE.to_string()]);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_reentrant_subscribe_applies_to_next_publish() {
        let bus: Arc<EventBus<u32>> = Arc::new(EventBus::new());
        let late = Arc::new(AtomicUsize::new(0));

        let inner = bus.clone();
        let late_clone = late.clone();
        bus.subscribe("load", move |_| {
            let counter = late_clone.clone();
            inner
                .subscribe("load.late", move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .ok();
        })
        .unwrap();

        bus.publish("load", 1).unwrap();
        assert_eq!(late.load(Ordering::SeqCst), 0);

        bus.publish("load", 2).unwrap();
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_publish() {
        let bus: Arc<EventBus<u32>> = Arc::new(EventBus::new());
        let (log, make) = recorder();

        let inner = bus.clone();
        bus.subscribe("groupEnd", move |value| {
            if *value == 1 {
                inner.publish("end", 99).ok();
            }
        })
        .unwrap();
        bus.subscribe("end", make("end")).unwrap();

        bus.publish("groupEnd", 1).unwrap();
        assert_eq!(*log.lock(), vec!["end:99"]);
    }

    #[test]
    fn test_event_history() {
        let config = EventBusConfig {
            enable_history: true,
            max_history_size: 10,
            ..Default::default()
        };
        let bus: EventBus<u32> = EventBus::with_config(config);

        for i in 0..5 {
            bus.publish("progress", i).unwrap();
        }

        let history = bus.history(None);
        assert_eq!(history.len(), 5);
        assert_eq!(history[4].args, 4);
        assert_eq!(history[4].key.name(), "progress");

        bus.clear_history();
        assert_eq!(bus.history(None).len(), 0);
    }

    #[test]
    fn test_history_max_size() {
        let config = EventBusConfig {
            enable_history: true,
            max_history_size: 5,
            ..Default::default()
        };
        let bus: EventBus<u32> = EventBus::with_config(config);

        for i in 0..10 {
            bus.publish("progress", i).unwrap();
        }

        let history = bus.history(None);
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].args, 5);
    }

    #[test]
    fn test_history_disabled_by_default() {
        let bus: EventBus<u32> = EventBus::new();
        bus.publish("progress", 1).unwrap();
        assert!(bus.history(None).is_empty());
    }

    #[tokio::test]
    async fn test_async_receiver() {
        let bus: EventBus<u32> = EventBus::new();
        let mut receiver = bus.receiver();

        bus.publish("groupEnd.hud", 12).unwrap();

        let received = receiver.try_recv().expect("event should be buffered");
        assert_eq!(received.key.to_string(), "groupEnd.hud");
        assert_eq!(received.args, 12);
    }
}
