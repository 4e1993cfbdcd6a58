use thiserror::Error;

use super::adjacency_graph::AdjacencyGraph;
use super::segment::Segment;
use super::segment_store::SegmentStore;
use crate::shared::segment_id::SegmentId;

pub const MAX_SELECTION: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Selected,
    Deselected,
    Rejected(SelectionRejection),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRejection {
    #[error("two regions are already selected")]
    LimitReached,
    #[error("region is not a neighbor of the selected one")]
    NotAdjacent,
    #[error("region does not belong to a stored segment")]
    UnknownSegment,
}

/// At most two selected segments, and a pair only if adjacent.
///
/// Transitions are pure: [`Selection::toggle`] returns the next state
/// instead of mutating shared state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<SegmentId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&self, id: SegmentId, graph: &AdjacencyGraph) -> (Selection, ToggleOutcome) {
        if self.contains(&id) {
            let ids = self.ids.iter().copied().filter(|s| *s != id).collect();
            return (Selection { ids }, ToggleOutcome::Deselected);
        }

        let rejection = if !graph.contains(&id) {
            Some(SelectionRejection::UnknownSegment)
        } else if self.ids.len() >= MAX_SELECTION {
            Some(SelectionRejection::LimitReached)
        } else if !self.ids.iter().all(|s| graph.is_adjacent(s, &id)) {
            Some(SelectionRejection::NotAdjacent)
        } else {
            None
        };

        if let Some(reason) = rejection {
            log::debug!("Selection of {id} refused: {reason:?}");
            return (self.clone(), ToggleOutcome::Rejected(reason));
        }

        let mut ids = self.ids.clone();
        ids.push(id);
        (Selection { ids }, ToggleOutcome::Selected)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &SegmentId) -> bool {
        self.ids.contains(id)
    }

    /// Selected ids in the order they were picked.
    pub fn ids(&self) -> &[SegmentId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected segments ordered by start. Ids no longer stored are skipped.
    pub fn selected_segments<'a>(&self, store: &'a SegmentStore) -> Vec<&'a Segment> {
        let mut segments: Vec<&Segment> = self
            .ids
            .iter()
            .filter_map(|id| store.find_by_id(id))
            .collect();
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        segments
    }

    /// Exactly two selected and adjacent: the condition for offering concat.
    pub fn is_mergeable(&self, graph: &AdjacencyGraph) -> bool {
        matches!(self.ids.as_slice(), [a, b] if graph.is_adjacent(a, b))
    }
}
