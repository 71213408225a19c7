//! Event source abstraction — the keyboard the engine listens to.
//!
//! The engine never reads a device itself. A platform adapter (or the
//! in-memory [`LocalTarget`]) implements [`EventSource`]; the manager
//! attaches key-down and key-up listeners to it and the replay helper
//! dispatches synthetic events through it.

pub mod local;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use local::LocalTarget;

/// Which listener list an event is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeyDown,
    KeyUp,
}

/// What happened on the keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// A single key went down.
    Down { key: String },
    /// Several keys went down at once. The held-key state is replaced
    /// by exactly these keys.
    BatchDown { keys: Vec<String> },
    /// A single key went up.
    Up { key: String },
}

impl KeyAction {
    pub fn kind(&self) -> EventKind {
        match self {
            KeyAction::Down { .. } | KeyAction::BatchDown { .. } => EventKind::KeyDown,
            KeyAction::Up { .. } => EventKind::KeyUp,
        }
    }
}

impl fmt::Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAction::Down { key } => write!(f, "down {key}"),
            KeyAction::BatchDown { keys } => write!(f, "down {}", keys.join("+")),
            KeyAction::Up { key } => write!(f, "up {key}"),
        }
    }
}

/// A key event as delivered to listeners.
///
/// Listeners share the event by reference; the default-prevented flag
/// is the only mutable part.
#[derive(Debug)]
pub struct KeyEvent {
    action: KeyAction,
    default_prevented: Cell<bool>,
}

impl KeyEvent {
    pub fn new(action: KeyAction) -> Self {
        Self {
            action,
            default_prevented: Cell::new(false),
        }
    }

    pub fn down(key: impl Into<String>) -> Self {
        Self::new(KeyAction::Down { key: key.into() })
    }

    pub fn up(key: impl Into<String>) -> Self {
        Self::new(KeyAction::Up { key: key.into() })
    }

    pub fn batch_down<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(KeyAction::BatchDown {
            keys: keys.into_iter().map(Into::into).collect(),
        })
    }

    pub fn action(&self) -> &KeyAction {
        &self.action
    }

    pub fn kind(&self) -> EventKind {
        self.action.kind()
    }

    /// Suppress the source's default handling of this event.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Handle returned by [`EventSource::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener callback attached to an event source.
pub type Listener = Rc<dyn Fn(&KeyEvent)>;

/// A keyboard event source.
///
/// Implementations deliver events in temporal order and run each
/// listener to completion before delivering the next event.
pub trait EventSource {
    /// Register a listener for one event kind.
    fn add_listener(&self, kind: EventKind, listener: Listener) -> ListenerId;

    /// Remove a listener. Returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Deliver an event to every listener of its kind.
    fn dispatch(&self, event: &KeyEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kinds() {
        assert_eq!(KeyEvent::down("a").kind(), EventKind::KeyDown);
        assert_eq!(KeyEvent::batch_down(["a", "b"]).kind(), EventKind::KeyDown);
        assert_eq!(KeyEvent::up("a").kind(), EventKind::KeyUp);
    }

    #[test]
    fn prevent_default_sticks() {
        let event = KeyEvent::down("a");
        assert!(!event.default_prevented());
        event.prevent_default();
        event.prevent_default();
        assert!(event.default_prevented());
    }

    #[test]
    fn action_display() {
        assert_eq!(KeyEvent::down("K").action().to_string(), "down K");
        assert_eq!(
            KeyEvent::batch_down(["control", "k"]).action().to_string(),
            "down control+k"
        );
        assert_eq!(KeyEvent::up("k").action().to_string(), "up k");
    }

    #[test]
    fn listener_ids_are_unique() {
        assert_ne!(ListenerId::new(), ListenerId::new());
    }
}
