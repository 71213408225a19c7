//! Replay script — a line-oriented description of bindings and key events.
//!
//! ```text
//! # comment
//! bind editor:Control+K@5
//! groups editor,nav
//! down Control
//! down K
//! up K
//! press Shift+A        # batch key-down
//! release Shift+A      # one key-up per key
//! tap Shift+A          # press then release
//! groups all
//! ```

use std::rc::Rc;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::hotkey::{BindOptions, Hotkey, HotkeyError};
use crate::manager::HotkeysManager;
use crate::replay::KeyState;
use crate::source::KeyEvent;

/// `[group[,group...]:]Key+Key[@priority]`
static BIND_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<groups>[^:@]+):)?(?P<keys>[^:@]+)(?:@(?P<priority>-?\d+))?$")
        .expect("bind spec regex is valid")
});

/// `<directive> <argument>`
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<cmd>[a-z]+)\s+(?P<arg>\S+)$").expect("directive regex is valid")
});

/// Script parse errors.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: unrecognized directive: {text:?}")]
    Syntax { line: usize, text: String },
    #[error("invalid binding spec {spec:?}: {reason}")]
    InvalidBind { spec: String, reason: String },
}

/// A parsed `bind` specification.
///
/// The raw spec string doubles as the hotkey payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindSpec {
    pub groups: Vec<String>,
    pub keys: Vec<String>,
    pub priority: i32,
    pub raw: String,
}

impl BindSpec {
    /// Register this spec on `manager`.
    pub fn register(&self, manager: &HotkeysManager<String>) -> Result<Rc<Hotkey<String>>, HotkeyError> {
        manager.set(
            &self.keys,
            BindOptions::new(self.raw.clone())
                .groups(self.groups.iter().cloned())
                .priority(self.priority),
        )
    }
}

impl FromStr for BindSpec {
    type Err = ScriptError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();
        let invalid = |reason: &str| ScriptError::InvalidBind {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let caps = BIND_SPEC
            .captures(spec)
            .ok_or_else(|| invalid("expected [groups:]Key+Key[@priority]"))?;

        let groups = caps
            .name("groups")
            .map(|m| split_list(m.as_str(), ','))
            .unwrap_or_default();
        let keys = split_list(&caps["keys"], '+');
        if keys.is_empty() {
            return Err(invalid("no keys"));
        }
        let priority = match caps.name("priority") {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| invalid("priority out of range"))?,
            None => 0,
        };

        Ok(Self {
            groups,
            keys,
            priority,
            raw: spec.to_string(),
        })
    }
}

/// Which groups a `groups` directive enables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSelection {
    All,
    Only(Vec<String>),
}

/// One script directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLine {
    Bind(BindSpec),
    Down(String),
    Up(String),
    Replay {
        keys: Vec<String>,
        state: Option<KeyState>,
    },
    Groups(GroupSelection),
}

impl ScriptLine {
    /// Parse one line. Blank lines and comments yield `None`.
    ///
    /// `line` is the 1-based line number used in errors.
    pub fn parse(line: usize, text: &str) -> Result<Option<Self>, ScriptError> {
        let content = match text.split_once('#') {
            Some((before, _)) => before,
            None => text,
        }
        .trim();
        if content.is_empty() {
            return Ok(None);
        }

        let syntax = || ScriptError::Syntax {
            line,
            text: text.to_string(),
        };
        let caps = DIRECTIVE.captures(content).ok_or_else(syntax)?;
        let arg = &caps["arg"];

        let parsed = match &caps["cmd"] {
            "bind" => ScriptLine::Bind(arg.parse()?),
            "down" => ScriptLine::Down(arg.to_string()),
            "up" => ScriptLine::Up(arg.to_string()),
            "press" => replay(arg, Some(KeyState::On)),
            "release" => replay(arg, Some(KeyState::Off)),
            "tap" => replay(arg, None),
            "groups" if arg.eq_ignore_ascii_case("all") => ScriptLine::Groups(GroupSelection::All),
            "groups" => ScriptLine::Groups(GroupSelection::Only(split_list(arg, ','))),
            _ => return Err(syntax()),
        };
        Ok(Some(parsed))
    }

    /// Apply the directive to `manager`.
    pub fn apply(&self, manager: &HotkeysManager<String>) -> Result<(), HotkeyError> {
        match self {
            ScriptLine::Bind(spec) => {
                spec.register(manager)?;
            }
            ScriptLine::Down(key) => manager.target().dispatch(&KeyEvent::down(key.as_str())),
            ScriptLine::Up(key) => manager.target().dispatch(&KeyEvent::up(key.as_str())),
            ScriptLine::Replay { keys, state } => manager.execute(keys, *state),
            ScriptLine::Groups(GroupSelection::All) => manager.enable_all_groups(),
            ScriptLine::Groups(GroupSelection::Only(groups)) => {
                manager.enable_groups(groups.iter().cloned());
            }
        }
        Ok(())
    }
}

fn replay(arg: &str, state: Option<KeyState>) -> ScriptLine {
    ScriptLine::Replay {
        keys: split_list(arg, '+'),
        state,
    }
}

fn split_list(s: &str, sep: char) -> Vec<String> {
    s.split(sep)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
