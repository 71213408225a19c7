//! Press/release state machine.
//!
//! One machine per subscription. It tracks which keys are held and which
//! hotkey, if any, is currently engaged, and reports the callbacks to fire.
//! It never invokes callbacks itself; the caller does that after releasing
//! any borrows on the registry.
//!
//! ```text
//!   Idle ──key down, match──────────────▶ Active
//!   Active ──key down, new match──────▶ Active   (re-fires "on")
//!   Active ──key down, same sig + once─▶ Active   (suppressed)
//!   Active ──any key up───────────────▶ Idle     (fires "off")
//! ```

use std::rc::Rc;

use indexmap::IndexMap;

use super::binding::Hotkey;
use super::registry::Registry;
use super::signature::KeySignature;
use crate::source::{KeyAction, KeyEvent};

/// The engaged hotkey and the exact key signature that engaged it.
pub struct ActiveMatch<P> {
    pub hotkey: Rc<Hotkey<P>>,
    pub signature: KeySignature,
}

/// A callback the caller must fire.
pub struct Fired<P> {
    pub hotkey: Rc<Hotkey<P>>,
    /// `true` for press, `false` for release.
    pub on: bool,
}

/// Held-key tracking plus the active match.
pub struct PressMachine<P> {
    held: IndexMap<String, bool>,
    active: Option<ActiveMatch<P>>,
}

impl<P> PressMachine<P> {
    pub fn new() -> Self {
        Self {
            held: IndexMap::new(),
            active: None,
        }
    }

    /// Apply one key event.
    ///
    /// Key-down events are resolved against `registry` using its current
    /// group enablement. Key-up events never consult the registry.
    pub fn handle(&mut self, registry: &Registry<P>, event: &KeyEvent) -> Option<Fired<P>> {
        match event.action() {
            KeyAction::Down { key } => {
                self.hold(key);
                self.resolve_press(registry, event)
            }
            KeyAction::BatchDown { keys } => {
                self.held.clear();
                for key in keys {
                    self.hold(key);
                }
                self.resolve_press(registry, event)
            }
            KeyAction::Up { key } => {
                self.held.insert(key.to_lowercase(), false);
                self.release()
            }
        }
    }

    // Key-down, key-up and matching all use the same lower-cased form.
    fn hold(&mut self, key: &str) {
        self.held.insert(key.to_lowercase(), true);
    }

    fn resolve_press(&mut self, registry: &Registry<P>, event: &KeyEvent) -> Option<Fired<P>> {
        let signature = KeySignature::try_normalize(self.held_keys())?;
        let Some(hotkey) = registry.find_signature(&signature) else {
            tracing::trace!(%signature, "no match");
            return None;
        };

        let options = hotkey.options();
        if options.prevent_default {
            event.prevent_default();
        }

        if options.once
            && self
                .active
                .as_ref()
                .is_some_and(|active| active.signature == signature)
        {
            tracing::trace!(id = %hotkey.id(), %signature, "suppressed repeat press");
            return None;
        }

        tracing::debug!(id = %hotkey.id(), %signature, "hotkey pressed");
        self.active = Some(ActiveMatch {
            hotkey: Rc::clone(&hotkey),
            signature,
        });
        Some(Fired { hotkey, on: true })
    }

    // Any key-up ends the active match, whether or not the key belongs to
    // the engaged combination.
    fn release(&mut self) -> Option<Fired<P>> {
        let active = self.active.take()?;
        tracing::debug!(
            id = %active.hotkey.id(),
            signature = %active.signature,
            "hotkey released"
        );
        Some(Fired {
            hotkey: active.hotkey,
            on: false,
        })
    }

    /// Keys currently held, in first-pressed order.
    pub fn held_keys(&self) -> Vec<&str> {
        self.held
            .iter()
            .filter(|(_, held)| **held)
            .map(|(key, _)| key.as_str())
            .collect()
    }

    pub fn active(&self) -> Option<&ActiveMatch<P>> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl<P> Default for PressMachine<P> {
    fn default() -> Self {
        Self::new()
    }
}
