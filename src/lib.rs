//! Key-combination resolution engine.
//!
//! Register hotkeys as sets of keys in named groups, choose which groups
//! are live, and subscribe to an [`EventSource`](source::EventSource).
//! Each subscription tracks held keys and fires press/release callbacks
//! for the highest-priority matching hotkey.

pub mod hotkey;
pub mod manager;
pub mod replay;
pub mod report;
pub mod run;
pub mod script;
pub mod source;

pub use hotkey::{
    BindOptions, Hotkey, HotkeyError, HotkeyEvent, HotkeyId, HotkeyOptions, KeySignature,
    ManagerOptions, WILDCARD_GROUP,
};
pub use manager::{Detached, HotkeysManager, Subscription};
pub use replay::KeyState;
pub use source::{EventSource, KeyEvent, LocalTarget};
