use crate::segments::domain::segment::SegmentPatch;
use crate::shared::segment_id::SegmentId;

/// A user edit that originated in one of the views.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewEvent {
    /// A region drag or resize finished.
    RegionResized { id: SegmentId, start: f64, end: f64 },
    /// The edit dialog was confirmed with new text.
    TextConfirmed { id: SegmentId, text: String },
}

impl ViewEvent {
    pub fn segment_id(&self) -> &SegmentId {
        match self {
            ViewEvent::RegionResized { id, .. } | ViewEvent::TextConfirmed { id, .. } => id,
        }
    }

    pub fn to_patch(&self) -> SegmentPatch {
        match self {
            ViewEvent::RegionResized { start, end, .. } => SegmentPatch::times(*start, *end),
            ViewEvent::TextConfirmed { text, .. } => SegmentPatch::text(text.clone()),
        }
    }
}
