//! Command replay — synthesize key events for a literal key sequence.
//!
//! A press is dispatched as a single batch key-down so the state machine
//! sees one atomic multi-key press; a release is one key-up per key.

use std::fmt;
use std::str::FromStr;

use crate::source::{EventSource, KeyEvent};

/// Which half of a key sequence to replay. `None` means both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    On,
    Off,
}

impl FromStr for KeyState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(KeyState::On),
            "off" => Ok(KeyState::Off),
            _ => Err(format!("unknown key state: {s:?} (expected on or off)")),
        }
    }
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyState::On => f.write_str("on"),
            KeyState::Off => f.write_str("off"),
        }
    }
}

/// Dispatch `keys` through `target` as a press, a release, or both.
pub fn execute<I, S>(target: &dyn EventSource, keys: I, state: Option<KeyState>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let keys: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();

    if matches!(state, None | Some(KeyState::On)) {
        let event = KeyEvent::batch_down(keys.iter().map(|k| k.to_lowercase()));
        tracing::trace!(?keys, "replay press");
        target.dispatch(&event);
    }

    if matches!(state, None | Some(KeyState::Off)) {
        tracing::trace!(?keys, "replay release");
        for key in &keys {
            target.dispatch(&KeyEvent::up(key.as_str()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{EventKind, KeyAction, LocalTarget};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_target() -> (LocalTarget, Rc<RefCell<Vec<KeyAction>>>) {
        let target = LocalTarget::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for kind in [EventKind::KeyDown, EventKind::KeyUp] {
            let log = Rc::clone(&log);
            target.add_listener(
                kind,
                Rc::new(move |e: &KeyEvent| log.borrow_mut().push(e.action().clone())),
            );
        }
        (target, log)
    }

    #[test]
    fn on_dispatches_one_batch_press() {
        let (target, log) = recording_target();
        execute(&target, ["Control", "K"], Some(KeyState::On));
        assert_eq!(
            *log.borrow(),
            vec![KeyAction::BatchDown {
                keys: vec!["control".into(), "k".into()]
            }]
        );
    }

    #[test]
    fn off_dispatches_one_release_per_key() {
        let (target, log) = recording_target();
        execute(&target, ["Control", "K"], Some(KeyState::Off));
        assert_eq!(
            *log.borrow(),
            vec![
                KeyAction::Up {
                    key: "Control".into()
                },
                KeyAction::Up { key: "K".into() },
            ]
        );
    }

    #[test]
    fn none_presses_then_releases() {
        let (target, log) = recording_target();
        execute(&target, ["a", "b"], None);
        let log = log.borrow();
        assert_eq!(log.len(), 3);
        assert!(matches!(log[0], KeyAction::BatchDown { .. }));
        assert!(matches!(log[1], KeyAction::Up { .. }));
        assert!(matches!(log[2], KeyAction::Up { .. }));
    }

    #[test]
    fn key_state_parses() {
        assert_eq!("on".parse::<KeyState>(), Ok(KeyState::On));
        assert_eq!("OFF".parse::<KeyState>(), Ok(KeyState::Off));
        assert!("toggle".parse::<KeyState>().is_err());
        assert_eq!(KeyState::On.to_string(), "on");
    }
}
