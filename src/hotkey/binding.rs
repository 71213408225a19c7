//! Hotkey record — a registered binding plus its per-entry callbacks.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::signature::KeySignature;
use crate::source::KeyEvent;

/// Group assigned to bindings registered without explicit groups.
pub const WILDCARD_GROUP: &str = "*";

/// Process-unique hotkey identifier.
///
/// A hotkey registered under several groups occupies several registry
/// slots but keeps one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HotkeyId(u64);

impl HotkeyId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HotkeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resolved per-hotkey options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyOptions {
    /// Higher wins when several hotkeys match the same keys.
    pub priority: i32,
    /// Suppress repeated "on" firing while the combination stays held.
    pub once: bool,
    /// Mark matching key-down events as default-prevented.
    pub prevent_default: bool,
}

/// Record handed to every fired callback.
pub struct HotkeyEvent<'a, P> {
    /// The key event that caused the transition.
    pub event: &'a KeyEvent,
    /// The matched hotkey.
    pub hotkey: &'a Rc<Hotkey<P>>,
    /// `true` on press, `false` on release.
    pub on: bool,
}

/// Shared callback type for hotkey and subscription callbacks.
pub type Callback<P> = Rc<dyn Fn(&HotkeyEvent<'_, P>)>;

/// Registration parameters for [`Registry::set`](super::Registry::set).
///
/// `once` and `prevent_default` left as `None` inherit the manager
/// defaults.
#[derive(Debug, Clone)]
pub struct BindOptions<P> {
    pub payload: P,
    pub groups: Vec<String>,
    pub priority: i32,
    pub once: Option<bool>,
    pub prevent_default: Option<bool>,
}

impl<P> BindOptions<P> {
    pub fn new(payload: P) -> Self {
        Self {
            payload,
            groups: Vec::new(),
            priority: 0,
            once: None,
            prevent_default: None,
        }
    }

    /// Add one group.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Add several groups.
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn once(mut self, once: bool) -> Self {
        self.once = Some(once);
        self
    }

    pub fn prevent_default(mut self, prevent_default: bool) -> Self {
        self.prevent_default = Some(prevent_default);
        self
    }
}

impl<P: Default> Default for BindOptions<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

/// A registered key binding.
///
/// Immutable after creation except for callback attachment.
pub struct Hotkey<P> {
    id: HotkeyId,
    signature: KeySignature,
    groups: Vec<String>,
    options: HotkeyOptions,
    payload: P,
    on: RefCell<Option<Callback<P>>>,
    off: RefCell<Option<Callback<P>>>,
}

impl<P> Hotkey<P> {
    pub(crate) fn new(
        signature: KeySignature,
        groups: Vec<String>,
        options: HotkeyOptions,
        payload: P,
    ) -> Self {
        Self {
            id: HotkeyId::next(),
            signature,
            groups,
            options,
            payload,
            on: RefCell::new(None),
            off: RefCell::new(None),
        }
    }

    /// Attach the press callback, replacing any previous one.
    pub fn on<F>(&self, f: F) -> &Self
    where
        F: Fn(&HotkeyEvent<'_, P>) + 'static,
    {
        *self.on.borrow_mut() = Some(Rc::new(f));
        self
    }

    /// Attach the release callback, replacing any previous one.
    pub fn off<F>(&self, f: F) -> &Self
    where
        F: Fn(&HotkeyEvent<'_, P>) + 'static,
    {
        *self.off.borrow_mut() = Some(Rc::new(f));
        self
    }

    pub fn id(&self) -> HotkeyId {
        self.id
    }

    pub fn signature(&self) -> &KeySignature {
        &self.signature
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn options(&self) -> HotkeyOptions {
        self.options
    }

    pub fn priority(&self) -> i32 {
        self.options.priority
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Whether this hotkey belongs to at least one of `groups`.
    pub fn in_any_group(&self, groups: &IndexSet<String>) -> bool {
        self.groups.iter().any(|g| groups.contains(g))
    }

    // Callbacks are cloned out so the RefCell is released before the
    // call; a callback may re-attach callbacks on its own hotkey.
    pub(crate) fn on_callback(&self) -> Option<Callback<P>> {
        self.on.borrow().clone()
    }

    pub(crate) fn off_callback(&self) -> Option<Callback<P>> {
        self.off.borrow().clone()
    }
}

impl<P: fmt::Debug> fmt::Debug for Hotkey<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hotkey")
            .field("id", &self.id)
            .field("signature", &self.signature)
            .field("groups", &self.groups)
            .field("options", &self.options)
            .field("payload", &self.payload)
            .field("has_on", &self.on.borrow().is_some())
            .field("has_off", &self.off.borrow().is_some())
            .finish()
    }
}
