//! Hotkey core — key signatures, the binding registry and the
//! press/release state machine.
//!
//! Nothing in here touches an event source; see [`crate::manager`] for
//! the wiring between a source and these types.

mod binding;
mod machine;
mod registry;
mod signature;

pub use binding::{BindOptions, Callback, Hotkey, HotkeyEvent, HotkeyId, HotkeyOptions, WILDCARD_GROUP};
pub use machine::{ActiveMatch, Fired, PressMachine};
pub use registry::{EnabledGroups, ManagerOptions, Registry};
pub use signature::KeySignature;

/// Registration-time errors.
///
/// Matching never fails; a key set without a binding is simply no match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeyError {
    #[error("invalid key sequence: {0}")]
    InvalidInput(String),
    #[error("hotkey already defined: [{group},{signature}]")]
    DuplicateBinding { group: String, signature: String },
}
