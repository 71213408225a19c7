//! In-process event target.
//!
//! Plays the role of a window or document: holds listener lists and
//! delivers dispatched events synchronously. Used by the replay driver
//! and by tests; platform adapters implement [`EventSource`] directly.

use std::cell::RefCell;

use super::{EventKind, EventSource, KeyEvent, Listener, ListenerId};

/// In-memory [`EventSource`].
#[derive(Default)]
pub struct LocalTarget {
    listeners: RefCell<Vec<(ListenerId, EventKind, Listener)>>,
}

impl LocalTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of listeners currently attached for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }
}

impl EventSource for LocalTarget {
    fn add_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.borrow_mut().push((id, kind, listener));
        tracing::trace!(?id, ?kind, "listener added");
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _, _)| *lid != id);
        let removed = listeners.len() != before;
        tracing::trace!(?id, removed, "listener removed");
        removed
    }

    fn dispatch(&self, event: &KeyEvent) {
        let kind = event.kind();
        // Snapshot so listeners may add or remove listeners while running.
        let targets: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, l)| Listener::clone(l))
            .collect();

        for listener in targets {
            listener(event);
        }
    }
}

impl std::fmt::Debug for LocalTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTarget")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}
