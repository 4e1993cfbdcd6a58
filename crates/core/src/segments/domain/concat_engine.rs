use thiserror::Error;

use super::segment::Segment;
use super::segment_store::SegmentStore;
use super::selection::Selection;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatRejection {
    #[error("concat needs exactly two selected segments, got {0}")]
    WrongSelectionSize(usize),
    #[error("a selected segment is no longer stored")]
    StaleSelection,
    #[error("selected segments are not adjacent")]
    NotAdjacent,
}

/// Combines two adjacent selected segments into one.
///
/// The caller only offers concat for a mergeable selection, but the engine
/// checks again and refuses without touching the store.
pub struct ConcatEngine;

impl ConcatEngine {
    /// Replaces the selected pair with a single segment spanning both.
    ///
    /// The pair must sit at consecutive store indices. Text is joined with no
    /// separator, earlier first. The new segment takes the slot of the
    /// earlier original. Clearing the selection is left to the caller.
    pub fn concat(
        store: &mut SegmentStore,
        selection: &Selection,
    ) -> Result<Segment, ConcatRejection> {
        let [a, b] = selection.ids() else {
            log::debug!("Concat refused: {} segments selected", selection.len());
            return Err(ConcatRejection::WrongSelectionSize(selection.len()));
        };
        let (Some(i), Some(j)) = (store.index_of(a), store.index_of(b)) else {
            log::debug!("Concat refused: selection holds a removed segment");
            return Err(ConcatRejection::StaleSelection);
        };
        if i.abs_diff(j) != 1 {
            log::debug!("Concat refused: {a} and {b} are not adjacent");
            return Err(ConcatRejection::NotAdjacent);
        }

        let index = i.min(j);
        let (Some(first), Some(second)) = (store.get(index), store.get(index + 1)) else {
            return Err(ConcatRejection::StaleSelection);
        };
        let merged = SegmentStore::create(
            first.start,
            second.end,
            format!("{}{}", first.text, second.text),
        );
        store
            .replace_range(index..index + 2, vec![merged.clone()])
            .map_err(|_| ConcatRejection::StaleSelection)?;

        log::info!(
            "Concatenated segments into {} ({:.2}-{:.2})",
            merged.id,
            merged.start,
            merged.end
        );
        Ok(merged)
    }
}
