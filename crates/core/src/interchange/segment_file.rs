use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::segments::domain::segment::{RawSegment, Segment};
use crate::shared::constants::{
    DATASET_ARCHIVE_EXTENSION, SEGMENT_EXPORT_SUFFIX, SEGMENT_EXPORT_TIMESTAMP_FORMAT,
};

#[derive(Error, Debug)]
pub enum InterchangeError {
    #[error("invalid segments JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("segment {index} is invalid: {reason}")]
    InvalidSegment { index: usize, reason: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parses an exported segment list.
///
/// The whole document must be a JSON array of `{start, end, text}` objects;
/// ids and other fields are ignored. A single bad entry rejects the lot.
pub fn parse_segments(json: &str) -> Result<Vec<RawSegment>, InterchangeError> {
    let segments: Vec<RawSegment> = serde_json::from_str(json)?;
    for (index, segment) in segments.iter().enumerate() {
        segment
            .validate()
            .map_err(|reason| InterchangeError::InvalidSegment { index, reason })?;
    }
    Ok(segments)
}

/// Pretty-printed `[{id, start, end, text}, ...]` in store order.
pub fn to_json(segments: &[Segment]) -> Result<String, InterchangeError> {
    Ok(serde_json::to_string_pretty(segments)?)
}

pub fn read_segments_file(path: &Path) -> Result<Vec<RawSegment>, InterchangeError> {
    let json = fs::read_to_string(path).map_err(|e| InterchangeError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_segments(&json)
}

pub fn write_segments_file(path: &Path, segments: &[Segment]) -> Result<(), InterchangeError> {
    let json = to_json(segments)?;
    fs::write(path, json).map_err(|e| InterchangeError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Audio display name without its last extension.
pub fn file_stem(original_name: &str) -> &str {
    match original_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => original_name,
    }
}

/// `<stem>_segments_<YYYYMMDDHHMMSS>.json`
pub fn export_file_name(original_name: &str, at: &NaiveDateTime) -> String {
    format!(
        "{}{SEGMENT_EXPORT_SUFFIX}{}.json",
        file_stem(original_name),
        at.format(SEGMENT_EXPORT_TIMESTAMP_FORMAT)
    )
}

/// `<stem>.zip`
pub fn dataset_archive_name(original_name: &str) -> String {
    format!("{}.{DATASET_ARCHIVE_EXTENSION}", file_stem(original_name))
}
