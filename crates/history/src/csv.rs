//! CSV persistence for the sample history.
//!
//! One sample per line, LF-terminated:
//! `<rfc3339 utc>,<total_download_bytes>,<total_upload_bytes>,<download_kbps:3dp>,<upload_kbps:3dp>`
//!
//! Decoding is deliberately tolerant: a malformed line (too few fields, or
//! a field that fails to parse) is skipped so a partially corrupted or
//! hand-edited file degrades to a shorter history instead of blocking
//! startup.

use chrono::{DateTime, SecondsFormat, Utc};
use pulse_core::{Result, Sample};
use std::path::Path;
use tracing::{debug, warn};

use crate::store::dedup_coalesce;

/// Header written on exported copies (the live store file has none).
pub const EXPORT_HEADER: &str =
    "timestamp_utc,total_download_bytes,total_upload_bytes,download_kbps,upload_kbps";

/// Serialize a snapshot to the line format. A full-state checkpoint: the
/// caller overwrites the previous file wholesale, never appends.
pub fn encode(samples: &[Sample]) -> String {
    let mut out = String::with_capacity(samples.len() * 64);
    for s in samples {
        out.push_str(&encode_line(s));
        out.push('\n');
    }
    out
}

fn encode_line(s: &Sample) -> String {
    format!(
        "{},{},{},{:.3},{:.3}",
        s.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        s.total_download_bytes,
        s.total_upload_bytes,
        s.download_kbps,
        s.upload_kbps,
    )
}

/// Parse the line format back into samples, skipping anything malformed,
/// then sort by timestamp and coalesce near-duplicates — the same rule
/// `append` applies, in case the file was edited by hand.
pub fn decode(raw: &str) -> Vec<Sample> {
    let mut samples: Vec<Sample> = Vec::new();
    let mut skipped = 0usize;

    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(s) => samples.push(s),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "skipped malformed history lines");
    }

    samples.sort_by_key(|s| s.timestamp);
    dedup_coalesce(&mut samples);
    samples
}

fn parse_line(line: &str) -> Option<Sample> {
    let mut fields = line.split(',');

    let timestamp = DateTime::parse_from_rfc3339(fields.next()?.trim())
        .ok()?
        .with_timezone(&Utc);
    let total_download_bytes = fields.next()?.trim().parse::<u64>().ok()?;
    let total_upload_bytes = fields.next()?.trim().parse::<u64>().ok()?;
    let download_kbps = fields.next()?.trim().parse::<f64>().ok()?;
    let upload_kbps = fields.next()?.trim().parse::<f64>().ok()?;

    Some(Sample::new(
        timestamp,
        total_download_bytes,
        total_upload_bytes,
        download_kbps,
        upload_kbps,
    ))
}

/// Overwrite `path` with the encoded snapshot, creating parent directories
/// as needed. I/O failures surface to the caller; the in-memory store is
/// untouched either way.
pub fn save(path: impl AsRef<Path>, samples: &[Sample]) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, encode(samples))?;
    debug!(samples = samples.len(), path = %path.display(), "history saved");
    Ok(())
}

/// Read and decode `path`. A missing file is an empty history, not an
/// error — first launch has nothing to restore.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no history file; starting empty");
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(decode(&raw))
}

/// Write a user-facing copy of the history with a header row. Feeding an
/// exported file back through [`load`] works — the header line simply
/// fails the timestamp parse and is skipped.
pub fn export(path: impl AsRef<Path>, samples: &[Sample]) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut out = String::with_capacity(EXPORT_HEADER.len() + 1 + samples.len() * 64);
    out.push_str(EXPORT_HEADER);
    out.push('\n');
    out.push_str(&encode(samples));
    std::fs::write(path, out)?;
    Ok(())
}
