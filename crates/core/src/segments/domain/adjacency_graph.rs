use std::collections::HashMap;

use super::segment::Segment;
use crate::shared::segment_id::SegmentId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub previous: Option<SegmentId>,
    pub next: Option<SegmentId>,
}

/// Previous/next links between time-adjacent segments.
///
/// Derived from store order and rebuilt from scratch after every mutation,
/// so it can never drift from the actual sequence after a merge or removal.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyGraph {
    links: HashMap<SegmentId, Neighbors>,
}

impl AdjacencyGraph {
    /// Builds the graph from an ordered slice. The store keeps segments sorted
    /// by start, so neighbors in the slice are neighbors in time.
    pub fn from_ordered(segments: &[Segment]) -> Self {
        let mut links = HashMap::with_capacity(segments.len());
        for (i, segment) in segments.iter().enumerate() {
            let previous = i.checked_sub(1).map(|p| segments[p].id);
            let next = segments.get(i + 1).map(|n| n.id);
            links.insert(segment.id, Neighbors { previous, next });
        }
        Self { links }
    }

    pub fn recompute(&mut self, segments: &[Segment]) {
        *self = Self::from_ordered(segments);
    }

    pub fn contains(&self, id: &SegmentId) -> bool {
        self.links.contains_key(id)
    }

    pub fn neighbors(&self, id: &SegmentId) -> Option<Neighbors> {
        self.links.get(id).copied()
    }

    pub fn previous(&self, id: &SegmentId) -> Option<SegmentId> {
        self.links.get(id).and_then(|n| n.previous)
    }

    pub fn next(&self, id: &SegmentId) -> Option<SegmentId> {
        self.links.get(id).and_then(|n| n.next)
    }

    /// True iff one of the two is the `next` of the other.
    pub fn is_adjacent(&self, a: &SegmentId, b: &SegmentId) -> bool {
        self.next(a) == Some(*b) || self.next(b) == Some(*a)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
