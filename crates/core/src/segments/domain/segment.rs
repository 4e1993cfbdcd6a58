use serde::{Deserialize, Serialize};

use crate::shared::segment_id::SegmentId;

/// One labeled time-span of the loaded audio.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Segment {
    /// Builds a segment with a fresh id. Insertion is up to the caller.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id: SegmentId::new(),
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Checks the time invariants: finite, non-negative start, `end > start`.
    pub fn validate(&self) -> Result<(), String> {
        validate_times(self.start, self.end)
    }

    pub fn apply(&mut self, patch: &SegmentPatch) {
        if let Some(start) = patch.start {
            self.start = start;
        }
        if let Some(end) = patch.end {
            self.end = end;
        }
        if let Some(ref text) = patch.text {
            self.text = text.clone();
        }
    }
}

/// Partial update for a stored segment. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentPatch {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub text: Option<String>,
}

impl SegmentPatch {
    pub fn times(start: f64, end: f64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.text.is_none()
    }
}

/// A `{start, end, text}` triple as produced by a transcription job or read
/// from an import file. Any id or extra field in the source is ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl RawSegment {
    /// Stamps a fresh id, admitting the triple as a session segment.
    pub fn into_segment(self) -> Segment {
        Segment::new(self.start, self.end, self.text)
    }

    /// Returns a description of the first shape violation, if any.
    pub fn validate(&self) -> Result<(), String> {
        validate_times(self.start, self.end)
    }
}

/// Shared by stored segments, drags and incoming triples.
pub fn validate_times(start: f64, end: f64) -> Result<(), String> {
    if !start.is_finite() || !end.is_finite() {
        return Err(format!("times must be finite numbers, got start={start} end={end}"));
    }
    if start < 0.0 {
        return Err(format!("start must not be negative, got {start}"));
    }
    if end <= start {
        return Err(format!("end ({end}) must be greater than start ({start})"));
    }
    Ok(())
}

impl From<&Segment> for RawSegment {
    fn from(segment: &Segment) -> Self {
        Self {
            start: segment.start,
            end: segment.end,
            text: segment.text.clone(),
        }
    }
}
