use std::fmt;

use serde::{Deserialize, Serialize};

use crate::segments::domain::segment::RawSegment;
use crate::shared::constants::DEFAULT_TRANSCRIPTION_MODEL;

pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// Speech recognizer the transcription server should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranscriptionTool {
    #[default]
    FasterWhisper,
    NemoAsr,
}

impl TranscriptionTool {
    pub const ALL: &[TranscriptionTool] =
        &[TranscriptionTool::FasterWhisper, TranscriptionTool::NemoAsr];

    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptionTool::FasterWhisper => "faster-whisper",
            TranscriptionTool::NemoAsr => "nemo-asr",
        }
    }
}

impl fmt::Display for TranscriptionTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TranscriptionTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TranscriptionTool::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown transcription tool '{s}'"))
    }
}

/// Job parameters, sent to the server as `{tool, model, lang, prompt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionParams {
    pub tool: TranscriptionTool,
    pub model: String,
    pub lang: Option<String>,
    pub prompt: Option<String>,
}

impl Default for TranscriptionParams {
    fn default() -> Self {
        Self {
            tool: TranscriptionTool::default(),
            model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            lang: None,
            prompt: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    Failed,
    Ready(Vec<RawSegment>),
}

/// Domain interface for a remote transcription backend.
///
/// Submission is fire-and-forget; completion is observed by polling.
pub trait TranscriptionService: Send + Sync {
    fn submit(
        &self,
        audio_file: &str,
        params: &TranscriptionParams,
    ) -> Result<JobId, ServiceError>;

    fn poll(&self, job: &JobId) -> Result<JobStatus, ServiceError>;
}
