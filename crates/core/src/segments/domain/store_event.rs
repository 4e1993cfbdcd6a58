use super::segment::Segment;
use crate::shared::segment_id::SegmentId;

/// Change notification published by the segment store after each mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    Inserted { index: usize, segment: Segment },
    Removed { id: SegmentId },
    Updated { segment: Segment },
    Cleared,
}

impl StoreEvent {
    /// Structural events change membership or order; updates do not.
    pub fn is_structural(&self) -> bool {
        !matches!(self, StoreEvent::Updated { .. })
    }
}
