//! Output formatting for the `hotkeys` commands.
//!
//! Fired callbacks go to stdout one per line so a replay can be piped
//! or diffed; diagnostics stay on stderr via `tracing`.

use std::rc::Rc;

use crate::hotkey::Hotkey;
use crate::report::{FiredReport, Record};

/// One line per fired callback: `#seq on|off signature [groups] payload`.
pub fn fired_line(report: &FiredReport) -> String {
    format!(
        "#{} {:<3} {} [{}] {}",
        report.seq,
        if report.on { "on" } else { "off" },
        report.signature,
        report.groups.join(","),
        report.payload,
    )
}

pub fn print_fired(report: &FiredReport) {
    println!("{}", fired_line(report));
}

/// Print registered bindings as a table.
pub fn print_bindings(hotkeys: &[Rc<Hotkey<String>>]) {
    println!("{:<6} {:<24} {:>8} GROUPS", "ID", "SIGNATURE", "PRIORITY");
    println!("{}", "-".repeat(50));
    for hotkey in hotkeys {
        println!(
            "{:<6} {:<24} {:>8} {}",
            hotkey.id().to_string(),
            hotkey.signature().to_string(),
            hotkey.priority(),
            hotkey.groups().join(","),
        );
    }
}

/// Print the contents of a report file.
pub fn print_records(records: &[Record]) {
    if records.is_empty() {
        println!("Empty report");
        return;
    }
    for record in records {
        match record {
            Record::Fired(report) => {
                println!("{}  ({})", fired_line(report), report.trigger);
            }
            Record::Summary { lines, fired } => {
                println!("-- {lines} lines, {fired} fired");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fired_line_layout() {
        let report = FiredReport {
            seq: 3,
            hotkey_id: 1,
            signature: "control,k".into(),
            groups: vec!["editor".into(), "nav".into()],
            priority: 5,
            on: false,
            trigger: "up k".into(),
            default_prevented: false,
            payload: "editor,nav:Control+K@5".into(),
        };
        assert_eq!(
            fired_line(&report),
            "#3 off control,k [editor,nav] editor,nav:Control+K@5"
        );
    }
}
