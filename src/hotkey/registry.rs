//! Hotkey registry — `(group, signature)` table, group enablement and
//! priority-ordered match resolution.
//!
//! All methods are pure state transitions with no I/O.

use std::cmp::Reverse;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::HotkeyError;
use super::binding::{BindOptions, Hotkey, HotkeyOptions, WILDCARD_GROUP};
use super::signature::KeySignature;

/// Manager-wide defaults for options a registration leaves unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerOptions {
    pub once: bool,
    pub prevent_default: bool,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            once: true,
            prevent_default: true,
        }
    }
}

/// Which groups are currently eligible for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnabledGroups {
    /// Every registered hotkey is eligible.
    All,
    /// Only hotkeys belonging to at least one of these groups.
    Only(IndexSet<String>),
}

/// Registered hotkeys keyed by `(group, signature)`.
///
/// Iteration follows insertion order, which is the tie-breaker among
/// equal priorities.
pub struct Registry<P> {
    entries: IndexMap<(String, KeySignature), Rc<Hotkey<P>>>,
    registered_groups: IndexSet<String>,
    enabled: EnabledGroups,
    defaults: ManagerOptions,
}

impl<P> Registry<P> {
    pub fn new(defaults: ManagerOptions) -> Self {
        Self {
            entries: IndexMap::new(),
            registered_groups: IndexSet::new(),
            enabled: EnabledGroups::All,
            defaults,
        }
    }

    /// Register a hotkey under every group in `options.groups`
    /// (the wildcard group if none).
    ///
    /// Groups are recorded as registered before anything is validated.
    /// On `DuplicateBinding`, entries already written for earlier groups
    /// of the same call are kept.
    pub fn set<I, S>(&mut self, keys: I, options: BindOptions<P>) -> Result<Rc<Hotkey<P>>, HotkeyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let BindOptions {
            payload,
            groups,
            priority,
            once,
            prevent_default,
        } = options;

        let groups = if groups.is_empty() {
            vec![WILDCARD_GROUP.to_string()]
        } else {
            groups
        };
        self.registered_groups.extend(groups.iter().cloned());

        let signature = KeySignature::normalize(keys)?;
        let hotkey = Rc::new(Hotkey::new(
            signature.clone(),
            groups.clone(),
            HotkeyOptions {
                priority,
                once: once.unwrap_or(self.defaults.once),
                prevent_default: prevent_default.unwrap_or(self.defaults.prevent_default),
            },
            payload,
        ));

        for group in groups {
            let slot = (group, signature.clone());
            if self.entries.contains_key(&slot) {
                let (group, signature) = slot;
                return Err(HotkeyError::DuplicateBinding {
                    group,
                    signature: signature.to_string(),
                });
            }
            self.entries.insert(slot, Rc::clone(&hotkey));
        }

        tracing::debug!(
            id = %hotkey.id(),
            signature = %hotkey.signature(),
            groups = ?hotkey.groups(),
            priority,
            "hotkey registered"
        );
        Ok(hotkey)
    }

    /// Make every registered hotkey eligible.
    pub fn enable_all_groups(&mut self) {
        self.enabled = EnabledGroups::All;
        tracing::debug!("all groups enabled");
    }

    /// Make exactly `groups` eligible. Returns the enabled list.
    pub fn enable_groups<I, S>(&mut self, groups: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: IndexSet<String> = groups.into_iter().map(Into::into).collect();
        let listed = set.iter().cloned().collect();
        tracing::debug!(groups = ?set, "groups enabled");
        self.enabled = EnabledGroups::Only(set);
        listed
    }

    pub fn enabled_groups(&self) -> &EnabledGroups {
        &self.enabled
    }

    /// Every group ever named in a registration, in first-seen order.
    pub fn registered_groups(&self) -> impl Iterator<Item = &str> {
        self.registered_groups.iter().map(String::as_str)
    }

    /// Resolve the best hotkey for the given held keys.
    ///
    /// Returns `None` for an empty key set.
    pub fn find<I, S>(&self, keys: I) -> Option<Rc<Hotkey<P>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let signature = KeySignature::try_normalize(keys)?;
        self.find_signature(&signature)
    }

    /// Resolve the best hotkey for an already normalized signature.
    ///
    /// Highest priority first; equal priorities resolve to the first
    /// inserted entry.
    pub fn find_signature(&self, signature: &KeySignature) -> Option<Rc<Hotkey<P>>> {
        let mut candidates: Vec<&Rc<Hotkey<P>>> = self.entries.values().collect();
        // Stable sort keeps insertion order within a priority.
        candidates.sort_by_key(|h| Reverse(h.priority()));

        candidates
            .into_iter()
            .find(|h| {
                h.signature() == signature
                    && match &self.enabled {
                        EnabledGroups::All => true,
                        EnabledGroups::Only(set) => h.in_any_group(set),
                    }
            })
            .cloned()
    }

    /// Distinct hotkeys in registration order.
    pub fn hotkeys(&self) -> Vec<Rc<Hotkey<P>>> {
        let mut seen = IndexSet::new();
        self.entries
            .values()
            .filter(|h| seen.insert(h.id()))
            .cloned()
            .collect()
    }

    /// Number of `(group, signature)` entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P> Default for Registry<P> {
    fn default() -> Self {
        Self::new(ManagerOptions::default())
    }
}
