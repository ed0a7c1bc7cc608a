//! Event payload helpers.

use super::key::EventKey;

/// A payload that knows which event name it is published under.
///
/// Lets producers call [`EventBus::emit`](super::EventBus::emit) without
/// repeating the name at every call site.
pub trait NamedEvent {
    /// Event name in the base namespace.
    fn name(&self) -> &'static str;

    /// Short description for logs.
    fn description(&self) -> String {
        self.name().to_string()
    }
}

/// A published event as seen by async receivers and the history.
#[derive(Debug, Clone)]
pub struct Published<A> {
    /// Key the event was published under.
    pub key: EventKey,
    /// Published arguments.
    pub args: A,
}
