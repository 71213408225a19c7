//! Fired-hotkey report stream — MessagePack records behind a length prefix.
//!
//! `hotkeys replay --report FILE` writes one [`Record::Fired`] per callback
//! and a closing [`Record::Summary`]; `hotkeys dump FILE` reads them back.

pub mod codec;
pub mod protocol;

use std::path::Path;

use futures::StreamExt;
use tokio_util::codec::FramedRead;

pub use codec::{CodecError, ReportCodec};
pub use protocol::{FiredReport, MAX_RECORD_SIZE, Record};

/// Read every record from a report file.
pub async fn read_records(path: &Path) -> Result<Vec<Record>, CodecError> {
    let file = tokio::fs::File::open(path).await?;
    let mut frames = FramedRead::new(file, ReportCodec::new());
    let mut records = Vec::new();
    while let Some(record) = frames.next().await {
        records.push(record?);
    }
    Ok(records)
}
