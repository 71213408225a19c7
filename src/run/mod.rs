//! Replay driver — the `hotkeys` binary's commands.
//!
//! `replay` builds a manager on an in-memory [`LocalTarget`], registers
//! the command-line bindings, then feeds the script through it line by
//! line. Every fired callback is printed and, with `--report`, sent to a
//! writer task that frames it onto disk.

mod format;

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use futures::{SinkExt, StreamExt};
use tokio::fs::File;
use tokio::io::AsyncRead;
use tokio::signal::unix::{SignalKind, signal as tokio_signal};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use crate::hotkey::{Hotkey, HotkeyError, HotkeyEvent, ManagerOptions};
use crate::manager::HotkeysManager;
use crate::report::{self, CodecError, FiredReport, Record, ReportCodec};
use crate::script::{BindSpec, ScriptError, ScriptLine};
use crate::source::{EventSource, LocalTarget};

/// Longest accepted script line.
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Driver errors.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("script: {0}")]
    Lines(#[from] LinesCodecError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("{0}")]
    Bind(#[from] HotkeyError),
    #[error("line {line}: {source}")]
    Line { line: u64, source: HotkeyError },
    #[error("report: {0}")]
    Report(#[from] CodecError),
    #[error("report writer failed: {0}")]
    Writer(#[from] tokio::task::JoinError),
}

/// Settings for one `replay` run.
#[derive(Debug, Clone, Default)]
pub struct ReplayConfig {
    /// Script file; stdin when `None`.
    pub script: Option<PathBuf>,
    /// Binding specs registered before the script runs.
    pub binds: Vec<String>,
    /// Groups to enable before the script runs; all when `None`.
    pub groups: Option<Vec<String>>,
    pub options: ManagerOptions,
    /// Report file to write.
    pub report: Option<PathBuf>,
}

/// What a replay did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Script lines read, including blanks and comments.
    pub lines: u64,
    /// Callbacks fired.
    pub fired: u64,
}

/// Run a replay until the script ends or a signal arrives.
pub async fn replay(config: ReplayConfig) -> Result<ReplaySummary, RunError> {
    let target: Rc<dyn EventSource> = Rc::new(LocalTarget::new());
    let manager = HotkeysManager::with_options(target, config.options);

    register_all(&manager, &config.binds)?;
    if let Some(groups) = &config.groups {
        let enabled = manager.enable_groups(groups.iter().cloned());
        tracing::info!(?enabled, "groups enabled");
    }

    let writer = match &config.report {
        Some(path) => {
            let file = File::create(path).await.map_err(|source| RunError::Open {
                path: path.clone(),
                source,
            })?;
            let (tx, rx) = mpsc::unbounded_channel();
            Some((tx, tokio::spawn(write_records(file, rx))))
        }
        None => None,
    };

    let fired = Rc::new(Cell::new(0u64));
    let subscription = {
        let fired = Rc::clone(&fired);
        let records = writer.as_ref().map(|(tx, _)| tx.clone());
        manager.subscribe(move |e| {
            let seq = fired.get() + 1;
            fired.set(seq);
            let report = fired_report(seq, e);
            format::print_fired(&report);
            if let Some(tx) = &records {
                if tx.send(Record::Fired(report)).is_err() {
                    tracing::warn!(seq, "report writer gone; record dropped");
                }
            }
        })
    };

    let result = feed_script(&manager, config.script.as_deref()).await;
    subscription.unsubscribe();
    let lines = result?;

    let summary = ReplaySummary {
        lines,
        fired: fired.get(),
    };
    tracing::info!(lines = summary.lines, fired = summary.fired, "replay finished");

    if let Some((tx, handle)) = writer {
        // The receiver only ends once every sender is gone; the
        // subscription's clone went with `unsubscribe`.
        let _ = tx.send(Record::Summary {
            lines: summary.lines,
            fired: summary.fired,
        });
        drop(tx);
        let written = handle.await??;
        tracing::debug!(written, "report written");
    }

    Ok(summary)
}

/// Register `binds` and print the resulting table.
pub fn check(binds: &[String], options: ManagerOptions) -> Result<(), RunError> {
    let target: Rc<dyn EventSource> = Rc::new(LocalTarget::new());
    let manager = HotkeysManager::with_options(target, options);
    let hotkeys = register_all(&manager, binds)?;
    format::print_bindings(&hotkeys);
    Ok(())
}

/// Print the records of a report file.
pub async fn dump(path: &Path) -> Result<(), RunError> {
    let records = report::read_records(path).await?;
    format::print_records(&records);
    Ok(())
}

fn register_all(
    manager: &HotkeysManager<String>,
    binds: &[String],
) -> Result<Vec<Rc<Hotkey<String>>>, RunError> {
    let mut hotkeys = Vec::with_capacity(binds.len());
    for raw in binds {
        let spec: BindSpec = raw.parse()?;
        let hotkey = spec.register(manager)?;
        tracing::info!(
            id = %hotkey.id(),
            signature = %hotkey.signature(),
            groups = ?hotkey.groups(),
            priority = hotkey.priority(),
            "bound"
        );
        hotkeys.push(hotkey);
    }
    Ok(hotkeys)
}

fn fired_report(seq: u64, e: &HotkeyEvent<'_, String>) -> FiredReport {
    FiredReport {
        seq,
        hotkey_id: e.hotkey.id().get(),
        signature: e.hotkey.signature().to_string(),
        groups: e.hotkey.groups().to_vec(),
        priority: e.hotkey.priority(),
        on: e.on,
        trigger: e.event.action().to_string(),
        default_prevented: e.event.default_prevented(),
        payload: e.hotkey.payload().clone(),
    }
}

async fn feed_script(
    manager: &HotkeysManager<String>,
    script: Option<&Path>,
) -> Result<u64, RunError> {
    let reader: Box<dyn AsyncRead + Unpin> = match script {
        Some(path) => Box::new(File::open(path).await.map_err(|source| RunError::Open {
            path: path.to_path_buf(),
            source,
        })?),
        None => Box::new(tokio::io::stdin()),
    };
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    let mut sig_term = tokio_signal(SignalKind::terminate())?;
    let mut sig_int = tokio_signal(SignalKind::interrupt())?;

    let mut count = 0u64;
    loop {
        tokio::select! {
            next = lines.next() => {
                let Some(text) = next else {
                    break;
                };
                let text = text?;
                count += 1;
                let Some(line) = ScriptLine::parse(count as usize, &text)? else {
                    continue;
                };
                tracing::trace!(line = count, ?line, "apply");
                line.apply(manager)
                    .map_err(|source| RunError::Line { line: count, source })?;
            }
            _ = sig_int.recv() => {
                tracing::info!(line = count, "interrupted");
                break;
            }
            _ = sig_term.recv() => {
                tracing::info!(line = count, "terminated");
                break;
            }
        }
    }
    Ok(count)
}

async fn write_records(
    file: File,
    mut rx: mpsc::UnboundedReceiver<Record>,
) -> Result<u64, RunError> {
    let mut sink = FramedWrite::new(file, ReportCodec::new());
    let mut written = 0u64;
    while let Some(record) = rx.recv().await {
        sink.send(record).await?;
        written += 1;
    }
    sink.close().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn script_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn config(script: &tempfile::NamedTempFile) -> ReplayConfig {
        ReplayConfig {
            script: Some(script.path().to_path_buf()),
            ..ReplayConfig::default()
        }
    }

    #[tokio::test]
    async fn replay_counts_lines_and_fired() {
        let script = script_file(
            "# bind then press
bind editor:Control+K@5

press Control+K
release Control+K
",
        );
        let summary = replay(config(&script)).await.unwrap();
        assert_eq!(summary, ReplaySummary { lines: 5, fired: 2 });
    }

    #[tokio::test]
    async fn command_line_binds_and_groups_apply() {
        let script = script_file("tap Control+Z\ntap J\n");
        let summary = replay(ReplayConfig {
            binds: vec!["edit:Control+Z".into(), "nav:J".into()],
            groups: Some(vec!["nav".into()]),
            ..config(&script)
        })
        .await
        .unwrap();
        assert_eq!(summary.fired, 2);
    }

    #[tokio::test]
    async fn report_file_holds_fired_records_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("report.bin");
        let script = script_file(
            "bind Shift+A@1
bind power:Shift+A@10
down shift
down a
down a
up a
",
        );
        let summary = replay(ReplayConfig {
            report: Some(report_path.clone()),
            ..config(&script)
        })
        .await
        .unwrap();
        assert_eq!(summary.fired, 2);

        let records = report::read_records(&report_path).await.unwrap();
        assert_eq!(records.len(), 3);
        match &records[0] {
            Record::Fired(r) => {
                assert_eq!(r.seq, 1);
                assert!(r.on);
                assert_eq!(r.priority, 10);
                assert_eq!(r.signature, "a,shift");
                assert_eq!(r.groups, vec!["power"]);
                assert_eq!(r.trigger, "down a");
                assert!(r.default_prevented);
                assert_eq!(r.payload, "power:Shift+A@10");
            }
            other => panic!("unexpected: {other:?}"),
        }
        match &records[1] {
            Record::Fired(r) => {
                assert_eq!(r.seq, 2);
                assert!(!r.on);
                assert_eq!(r.trigger, "up a");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(records[2], Record::Summary { lines: 6, fired: 2 });
    }

    #[tokio::test]
    async fn without_once_repeats_are_reported() {
        let script = script_file("bind x\ndown x\ndown x\nup x\n");
        let summary = replay(ReplayConfig {
            options: ManagerOptions {
                once: false,
                prevent_default: true,
            },
            ..config(&script)
        })
        .await
        .unwrap();
        assert_eq!(summary.fired, 3);
    }

    #[tokio::test]
    async fn syntax_error_stops_replay() {
        let script = script_file("bind a\nfrobnicate a\n");
        match replay(config(&script)).await {
            Err(RunError::Script(ScriptError::Syntax { line, .. })) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_bind_in_script_reports_line() {
        let script = script_file("bind a+b\n\nbind B+A\n");
        match replay(config(&script)).await {
            Err(RunError::Line { line, source }) => {
                assert_eq!(line, 3);
                assert!(matches!(source, HotkeyError::DuplicateBinding { .. }));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_script_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = replay(ReplayConfig {
            script: Some(dir.path().join("absent.txt")),
            ..ReplayConfig::default()
        })
        .await
        .unwrap_err();
        assert!(matches!(err, RunError::Open { .. }));
    }

    #[test]
    fn check_rejects_duplicates() {
        let binds = vec!["g:Control+K".to_string(), "g:k+control".to_string()];
        assert!(matches!(
            check(&binds, ManagerOptions::default()),
            Err(RunError::Bind(HotkeyError::DuplicateBinding { .. }))
        ));
    }

    #[test]
    fn check_rejects_malformed_spec() {
        let binds = vec!["a:b:c".to_string()];
        assert!(matches!(
            check(&binds, ManagerOptions::default()),
            Err(RunError::Script(ScriptError::InvalidBind { .. }))
        ));
    }

    #[test]
    fn register_all_returns_hotkeys_in_order() {
        let target: Rc<dyn EventSource> = Rc::new(LocalTarget::new());
        let manager = HotkeysManager::new(target);
        let hotkeys =
            register_all(&manager, &["Escape".to_string(), "nav:J@3".to_string()]).unwrap();
        assert_eq!(hotkeys.len(), 2);
        assert_eq!(hotkeys[0].signature().to_string(), "escape");
        assert_eq!(hotkeys[1].priority(), 3);
        assert_eq!(hotkeys[1].groups(), ["nav".to_string()]);
    }

    #[tokio::test]
    async fn dump_reads_back_report() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("r.bin");
        let script = script_file("bind q\ntap q\n");
        replay(ReplayConfig {
            report: Some(report_path.clone()),
            ..config(&script)
        })
        .await
        .unwrap();
        dump(&report_path).await.unwrap();
    }
}
