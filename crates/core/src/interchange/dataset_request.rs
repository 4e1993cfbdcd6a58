use serde::{Deserialize, Serialize};

use crate::segments::domain::segment::Segment;

/// Payload for the speech-dataset export: the segments plus the original
/// display name of the audio they were cut from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetExportRequest {
    pub segments: Vec<Segment>,
    #[serde(rename = "original-file-name")]
    pub original_file_name: String,
}
