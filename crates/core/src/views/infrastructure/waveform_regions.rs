use crate::segments::domain::segment::{validate_times, Segment};
use crate::segments::domain::selection::Selection;
use crate::shared::segment_id::SegmentId;
use crate::sync::view_event::ViewEvent;
use crate::views::domain::segment_view::SegmentView;

/// A draggable, resizable span drawn over the waveform.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveformRegion {
    pub id: SegmentId,
    pub start: f64,
    pub end: f64,
    pub content: String,
    pub selected: bool,
}

impl WaveformRegion {
    fn from_segment(segment: &Segment) -> Self {
        Self {
            id: segment.id,
            start: segment.start,
            end: segment.end,
            content: segment.text.clone(),
            selected: false,
        }
    }
}

/// Visual projection: the regions overlaid on the waveform.
#[derive(Debug, Default)]
pub struct WaveformRegions {
    regions: Vec<WaveformRegion>,
}

impl WaveformRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regions(&self) -> &[WaveformRegion] {
        &self.regions
    }

    pub fn region(&self, id: &SegmentId) -> Option<&WaveformRegion> {
        self.regions.iter().find(|r| r.id == *id)
    }

    /// Mirrors the selection onto the region highlight flags.
    pub fn show_selection(&mut self, selection: &Selection) {
        for region in &mut self.regions {
            region.selected = selection.contains(&region.id);
        }
    }

    /// Ends a drag or resize gesture.
    ///
    /// The region takes its new geometry immediately; the returned event
    /// carries the change to the store. Inverted, negative or non-finite
    /// geometry is refused and the region keeps its old span.
    pub fn finish_drag(&mut self, id: &SegmentId, start: f64, end: f64) -> Option<ViewEvent> {
        let Some(region) = self.regions.iter_mut().find(|r| r.id == *id) else {
            log::warn!("Region with ID {id} not found, drag ignored");
            return None;
        };
        if let Err(reason) = validate_times(start, end) {
            log::warn!("Drag of region {id} refused: {reason}");
            return None;
        }
        region.start = start;
        region.end = end;
        Some(ViewEvent::RegionResized {
            id: *id,
            start,
            end,
        })
    }

    /// Playback position as a fraction of the audio duration.
    pub fn seek_ratio(&self, id: &SegmentId, audio_duration: f64) -> Option<f64> {
        let Some(region) = self.region(id) else {
            log::warn!("Region with ID {id} not found.");
            return None;
        };
        if audio_duration <= 0.0 {
            return None;
        }
        Some(region.start / audio_duration)
    }

    pub fn play_range(&self, id: &SegmentId) -> Option<(f64, f64)> {
        self.region(id).map(|r| (r.start, r.end))
    }
}

impl SegmentView for WaveformRegions {
    fn insert(&mut self, index: usize, segment: &Segment) {
        let at = index.min(self.regions.len());
        self.regions.insert(at, WaveformRegion::from_segment(segment));
    }

    fn remove(&mut self, id: &SegmentId) {
        let before = self.regions.len();
        self.regions.retain(|r| r.id != *id);
        if self.regions.len() == before {
            log::warn!("Region with ID {id} not found.");
        }
    }

    fn refresh(&mut self, segment: &Segment) {
        match self.regions.iter_mut().find(|r| r.id == segment.id) {
            Some(region) => {
                region.start = segment.start;
                region.end = segment.end;
                region.content = segment.text.clone();
            }
            None => log::warn!("Region with ID {} not found.", segment.id),
        }
    }

    fn clear(&mut self) {
        self.regions.clear();
    }

    fn ids(&self) -> Vec<SegmentId> {
        self.regions.iter().map(|r| r.id).collect()
    }
}
