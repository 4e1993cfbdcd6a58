use crate::segments::domain::segment::Segment;
use crate::shared::segment_id::SegmentId;

/// A projection of the segment store, keyed by segment id.
///
/// Views are driven by the sync bridge only. They never read or write the
/// store and never talk to each other.
pub trait SegmentView {
    fn insert(&mut self, index: usize, segment: &Segment);
    fn remove(&mut self, id: &SegmentId);
    fn refresh(&mut self, segment: &Segment);
    fn clear(&mut self);

    /// Ids in display order, used to check the projection against the store.
    fn ids(&self) -> Vec<SegmentId>;
}
