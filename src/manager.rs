//! Hotkeys manager — owns the registry and wires subscriptions to an
//! event source.
//!
//! Single-threaded: the manager, its hotkeys and its subscriptions are
//! `Rc`-based and must stay on the thread that drives the event source.
//! Each subscription owns an independent [`PressMachine`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::hotkey::{
    BindOptions, Callback, EnabledGroups, Fired, Hotkey, HotkeyError, HotkeyEvent,
    ManagerOptions, PressMachine, Registry,
};
use crate::replay::{self, KeyState};
use crate::source::{EventKind, EventSource, KeyEvent, Listener, ListenerId};

struct Shared<P> {
    registry: RefCell<Registry<P>>,
    target: Rc<dyn EventSource>,
    options: ManagerOptions,
}

/// Entry point: register hotkeys, choose enabled groups, subscribe.
///
/// Cloning is cheap and yields a handle to the same registry.
pub struct HotkeysManager<P> {
    shared: Rc<Shared<P>>,
}

impl<P> Clone for HotkeysManager<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<P: 'static> HotkeysManager<P> {
    /// Create a manager on `target` with default options
    /// (`once` and `prevent_default` both on).
    pub fn new(target: Rc<dyn EventSource>) -> Self {
        Self::with_options(target, ManagerOptions::default())
    }

    pub fn with_options(target: Rc<dyn EventSource>, options: ManagerOptions) -> Self {
        Self {
            shared: Rc::new(Shared {
                registry: RefCell::new(Registry::new(options)),
                target,
                options,
            }),
        }
    }

    /// The event source this manager listens to and replays through.
    pub fn target(&self) -> &Rc<dyn EventSource> {
        &self.shared.target
    }

    pub fn options(&self) -> ManagerOptions {
        self.shared.options
    }

    /// Register a key combination. See [`Registry::set`].
    pub fn set<I, S>(&self, keys: I, options: BindOptions<P>) -> Result<Rc<Hotkey<P>>, HotkeyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.shared.registry.borrow_mut().set(keys, options)
    }

    pub fn enable_all_groups(&self) {
        self.shared.registry.borrow_mut().enable_all_groups();
    }

    /// Restrict matching to exactly `groups`. Returns the enabled list.
    pub fn enable_groups<I, S>(&self, groups: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared.registry.borrow_mut().enable_groups(groups)
    }

    pub fn enabled_groups(&self) -> EnabledGroups {
        self.shared.registry.borrow().enabled_groups().clone()
    }

    pub fn registered_groups(&self) -> Vec<String> {
        self.shared
            .registry
            .borrow()
            .registered_groups()
            .map(str::to_string)
            .collect()
    }

    /// Resolve the hotkey that `keys` would trigger right now.
    pub fn find<I, S>(&self, keys: I) -> Option<Rc<Hotkey<P>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.shared.registry.borrow().find(keys)
    }

    /// Distinct registered hotkeys in registration order.
    pub fn hotkeys(&self) -> Vec<Rc<Hotkey<P>>> {
        self.shared.registry.borrow().hotkeys()
    }

    /// Start listening. `callback` fires for every hotkey that has no
    /// callback of its own for the transition.
    pub fn subscribe<F>(&self, callback: F) -> Subscription<P>
    where
        F: Fn(&HotkeyEvent<'_, P>) + 'static,
    {
        self.attach(Some(Rc::new(callback)))
    }

    /// Start listening with no fallback; only per-hotkey callbacks fire.
    pub fn listen(&self) -> Subscription<P> {
        self.attach(None)
    }

    /// Replay `keys` through the event source. See [`replay::execute`].
    pub fn execute<I, S>(&self, keys: I, state: Option<KeyState>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        replay::execute(&*self.shared.target, keys, state);
    }

    fn attach(&self, callback: Option<Callback<P>>) -> Subscription<P> {
        let machine = Rc::new(RefCell::new(PressMachine::new()));

        let listener = {
            let shared = Rc::downgrade(&self.shared);
            let machine = Rc::clone(&machine);
            let callback = callback.clone();
            Rc::new(move |event: &KeyEvent| {
                handle_event(&shared, &machine, callback.as_ref(), event);
            })
        };
        let listener: Listener = listener;

        let target = &self.shared.target;
        let down = target.add_listener(EventKind::KeyDown, Rc::clone(&listener));
        let up = target.add_listener(EventKind::KeyUp, listener);
        tracing::debug!(?down, ?up, "subscribed");

        Subscription {
            manager: self.clone(),
            callback,
            machine,
            down,
            up,
        }
    }
}

// Listeners hold the manager weakly so the source does not keep the
// registry alive; events after the manager is gone are ignored.
fn handle_event<P>(
    shared: &Weak<Shared<P>>,
    machine: &RefCell<PressMachine<P>>,
    callback: Option<&Callback<P>>,
    event: &KeyEvent,
) {
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let fired = {
        let registry = shared.registry.borrow();
        machine.borrow_mut().handle(&registry, event)
    };

    if let Some(fired) = fired {
        invoke(fired, callback, event);
    }
}

fn invoke<P>(fired: Fired<P>, fallback: Option<&Callback<P>>, event: &KeyEvent) {
    let own = if fired.on {
        fired.hotkey.on_callback()
    } else {
        fired.hotkey.off_callback()
    };
    let Some(callback) = own.or_else(|| fallback.cloned()) else {
        return;
    };
    callback(&HotkeyEvent {
        event,
        hotkey: &fired.hotkey,
        on: fired.on,
    });
}

/// A live subscription. Listeners stay attached until
/// [`unsubscribe`](Self::unsubscribe) is called; dropping the handle
/// does not detach them.
#[must_use = "listeners stay attached; keep the handle to unsubscribe later"]
pub struct Subscription<P> {
    manager: HotkeysManager<P>,
    callback: Option<Callback<P>>,
    machine: Rc<RefCell<PressMachine<P>>>,
    down: ListenerId,
    up: ListenerId,
}

impl<P: 'static> Subscription<P> {
    /// Remove both listeners. The returned handle can subscribe again
    /// with the same callback.
    pub fn unsubscribe(self) -> Detached<P> {
        let target = self.manager.target();
        target.remove_listener(self.up);
        target.remove_listener(self.down);
        tracing::debug!(down = ?self.down, up = ?self.up, "unsubscribed");
        Detached {
            manager: self.manager,
            callback: self.callback,
        }
    }

    /// Whether a hotkey is currently engaged for this subscription.
    pub fn is_active(&self) -> bool {
        self.machine.borrow().is_active()
    }

    /// Keys this subscription currently sees as held.
    pub fn held_keys(&self) -> Vec<String> {
        self.machine
            .borrow()
            .held_keys()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// An unsubscribed subscription, ready to be re-attached.
pub struct Detached<P> {
    manager: HotkeysManager<P>,
    callback: Option<Callback<P>>,
}

impl<P: 'static> Detached<P> {
    /// Subscribe again on the same manager with the same callback.
    /// Key state starts fresh.
    pub fn resubscribe(self) -> Subscription<P> {
        self.manager.attach(self.callback)
    }
}
