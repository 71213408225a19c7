//! Report record types.
//!
//! Records are MessagePack maps tagged on the `type` field.

use serde::{Deserialize, Serialize};

/// Maximum encoded record size (1 MiB).
pub const MAX_RECORD_SIZE: usize = 1024 * 1024;

/// One hotkey transition as observed by the fallback callback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FiredReport {
    /// 1-based position in the stream.
    pub seq: u64,
    pub hotkey_id: u64,
    pub signature: String,
    pub groups: Vec<String>,
    pub priority: i32,
    /// `true` for press, `false` for release.
    pub on: bool,
    /// The key action that caused the transition, e.g. `down k`.
    pub trigger: String,
    #[serde(default)]
    pub default_prevented: bool,
    /// The binding spec the hotkey was registered from.
    #[serde(default)]
    pub payload: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Record {
    #[serde(rename = "fired")]
    Fired(FiredReport),

    /// Written once after the script has been fully replayed.
    #[serde(rename = "summary")]
    Summary { lines: u64, fired: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FiredReport {
        FiredReport {
            seq: 1,
            hotkey_id: 7,
            signature: "control,k".into(),
            groups: vec!["editor".into()],
            priority: 5,
            on: true,
            trigger: "down k".into(),
            default_prevented: true,
            payload: "editor:Control+K@5".into(),
        }
    }

    #[test]
    fn fired_is_tagged_map() {
        #[derive(Deserialize)]
        struct Tag {
            #[serde(rename = "type")]
            ty: String,
            signature: String,
        }
        let bytes = rmp_serde::to_vec_named(&Record::Fired(sample())).unwrap();
        let tag: Tag = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(tag.ty, "fired");
        assert_eq!(tag.signature, "control,k");
    }

    #[test]
    fn missing_optional_fields_default() {
        #[derive(Serialize)]
        struct Legacy<'a> {
            #[serde(rename = "type")]
            ty: &'a str,
            seq: u64,
            hotkey_id: u64,
            signature: &'a str,
            groups: Vec<&'a str>,
            priority: i32,
            on: bool,
            trigger: &'a str,
        }
        let bytes = rmp_serde::to_vec_named(&Legacy {
            ty: "fired",
            seq: 1,
            hotkey_id: 2,
            signature: "a",
            groups: vec!["*"],
            priority: 0,
            on: false,
            trigger: "up a",
        })
        .unwrap();
        match rmp_serde::from_slice::<Record>(&bytes).unwrap() {
            Record::Fired(report) => {
                assert!(!report.default_prevented);
                assert!(report.payload.is_empty());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
