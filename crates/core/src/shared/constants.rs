use std::time::Duration;

/// Decimal places used when times are shown in a region label or table cell.
pub const DISPLAY_PRECISION: usize = 2;

/// Fixed delay between transcription status requests. No backoff.
pub const TRANSCRIPTION_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "large-v3";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

pub const UPLOAD_ROUTE: &str = "upload";
pub const TRANSCRIPT_ROUTE: &str = "transcript";
pub const TRANSCRIPT_RESULT_ROUTE: &str = "transcript_result";
pub const DATASET_EXPORT_ROUTE: &str = "export_speech_dataset";

pub const SEGMENT_EXPORT_SUFFIX: &str = "_segments_";
pub const SEGMENT_EXPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
pub const DATASET_ARCHIVE_EXTENSION: &str = "zip";
