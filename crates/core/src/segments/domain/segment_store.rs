use std::ops::Range;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use super::adjacency_graph::AdjacencyGraph;
use super::segment::{Segment, SegmentPatch};
use super::store_event::StoreEvent;
use crate::shared::segment_id::SegmentId;

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("insert index {index} out of range for store of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("range {start}..{end} out of bounds for store of length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
    #[error("segment starting at {start} would break start order at index {index}")]
    OutOfOrder { index: usize, start: f64 },
}

/// Ordered collection of segments, sorted by `start`.
///
/// Every mutation rebuilds the adjacency graph and publishes a
/// [`StoreEvent`] to each subscriber. Lookup misses are logged and leave the
/// store untouched.
#[derive(Default)]
pub struct SegmentStore {
    segments: Vec<Segment>,
    adjacency: AdjacencyGraph,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a segment with a fresh id without inserting it.
    pub fn create(start: f64, end: f64, text: impl Into<String>) -> Segment {
        Segment::new(start, end, text)
    }

    /// Registers a new listener. Events are buffered until drained.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Inserts at `index`, which must lie in `[0, len]` and keep the store
    /// sorted by start.
    pub fn insert_at(&mut self, index: usize, segment: Segment) -> Result<(), StoreError> {
        let len = self.segments.len();
        if index > len {
            return Err(StoreError::IndexOutOfRange { index, len });
        }
        if !self.fits_at(index, segment.start) {
            return Err(StoreError::OutOfOrder {
                index,
                start: segment.start,
            });
        }
        self.segments.insert(index, segment.clone());
        self.adjacency.recompute(&self.segments);
        self.publish(StoreEvent::Inserted { index, segment });
        Ok(())
    }

    /// Appends at the position that keeps the store sorted by start.
    pub fn insert_sorted(&mut self, segment: Segment) -> usize {
        let index = self.insertion_index_for(segment.start);
        self.segments.insert(index, segment.clone());
        self.adjacency.recompute(&self.segments);
        self.publish(StoreEvent::Inserted { index, segment });
        index
    }

    /// Index after every segment starting at or before `start`.
    pub fn insertion_index_for(&self, start: f64) -> usize {
        self.segments.partition_point(|s| s.start <= start)
    }

    pub fn remove_by_id(&mut self, id: &SegmentId) -> Option<Segment> {
        let Some(index) = self.index_of(id) else {
            log::warn!("Segment with ID {id} not found, nothing removed");
            return None;
        };
        let removed = self.segments.remove(index);
        self.adjacency.recompute(&self.segments);
        self.publish(StoreEvent::Removed { id: *id });
        Some(removed)
    }

    /// Applies `patch` and returns the updated segment.
    ///
    /// A patch that would break the time invariants is refused. When the new
    /// start moves the segment past a neighbor it is moved to its sorted slot
    /// and published as `Removed` then `Inserted`; otherwise as `Updated`.
    pub fn update_by_id(&mut self, id: &SegmentId, patch: &SegmentPatch) -> Option<Segment> {
        let Some(index) = self.index_of(id) else {
            log::warn!("Segment with ID {id} not found, update ignored");
            return None;
        };
        let mut updated = self.segments[index].clone();
        updated.apply(patch);
        if let Err(reason) = updated.validate() {
            log::warn!("Update of segment {id} refused: {reason}");
            return None;
        }

        self.segments.remove(index);
        if self.fits_at(index, updated.start) {
            self.segments.insert(index, updated.clone());
            self.adjacency.recompute(&self.segments);
            self.publish(StoreEvent::Updated {
                segment: updated.clone(),
            });
        } else {
            let target = self.insertion_index_for(updated.start);
            self.segments.insert(target, updated.clone());
            self.adjacency.recompute(&self.segments);
            log::debug!("Segment {id} moved from index {index} to {target}");
            self.publish(StoreEvent::Removed { id: *id });
            self.publish(StoreEvent::Inserted {
                index: target,
                segment: updated.clone(),
            });
        }
        Some(updated)
    }

    /// Removes `range` and inserts `replacements` at its start.
    ///
    /// Publishes one `Removed` per dropped segment followed by one `Inserted`
    /// per replacement, but rebuilds adjacency only once.
    pub fn replace_range(
        &mut self,
        range: Range<usize>,
        replacements: Vec<Segment>,
    ) -> Result<Vec<Segment>, StoreError> {
        let len = self.segments.len();
        if range.start > range.end || range.end > len {
            return Err(StoreError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        let at = range.start;
        let removed: Vec<Segment> = self
            .segments
            .splice(range, replacements.iter().cloned())
            .collect();
        self.adjacency.recompute(&self.segments);

        for segment in &removed {
            self.publish(StoreEvent::Removed { id: segment.id });
        }
        for (offset, segment) in replacements.into_iter().enumerate() {
            self.publish(StoreEvent::Inserted {
                index: at + offset,
                segment,
            });
        }
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.adjacency.recompute(&self.segments);
        self.publish(StoreEvent::Cleared);
    }

    pub fn find_by_id(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == *id)
    }

    pub fn index_of(&self, id: &SegmentId) -> Option<usize> {
        self.segments.iter().position(|s| s.id == *id)
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Read-only snapshot in store order.
    pub fn all(&self) -> &[Segment] {
        &self.segments
    }

    pub fn adjacency(&self) -> &AdjacencyGraph {
        &self.adjacency
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn fits_at(&self, index: usize, start: f64) -> bool {
        let after_previous = index == 0 || self.segments[index - 1].start <= start;
        let before_next = self
            .segments
            .get(index)
            .map_or(true, |next| start <= next.start);
        after_previous && before_next
    }

    fn publish(&mut self, event: StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
