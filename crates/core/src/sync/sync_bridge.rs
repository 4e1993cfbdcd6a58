use crossbeam_channel::Receiver;

use crate::segments::domain::segment::Segment;
use crate::segments::domain::segment_store::SegmentStore;
use crate::segments::domain::store_event::StoreEvent;
use crate::sync::view_event::ViewEvent;
use crate::views::domain::segment_view::SegmentView;
use crate::views::infrastructure::segment_table::SegmentTable;
use crate::views::infrastructure::waveform_regions::WaveformRegions;

/// Keeps the waveform regions and the table in step with the store.
///
/// Store to views: events from the store subscription are replayed onto both
/// projections. Views to store: a [`ViewEvent`] is written to the store and
/// the resulting events are pumped before control returns, so neither view
/// lags the store by more than one synchronous step.
pub struct SyncBridge {
    events: Receiver<StoreEvent>,
    regions: WaveformRegions,
    table: SegmentTable,
}

impl SyncBridge {
    /// Subscribes to `store`. Segments already stored are projected at once.
    pub fn attach(store: &mut SegmentStore) -> Self {
        let events = store.subscribe();
        let mut bridge = Self {
            events,
            regions: WaveformRegions::new(),
            table: SegmentTable::new(),
        };
        for (index, segment) in store.all().iter().enumerate() {
            bridge.apply(&StoreEvent::Inserted {
                index,
                segment: segment.clone(),
            });
        }
        bridge
    }

    /// Replays pending store events onto both views. Returns how many were
    /// handled and whether any was structural.
    pub fn pump(&mut self) -> PumpSummary {
        let mut summary = PumpSummary::default();
        while let Ok(event) = self.events.try_recv() {
            summary.structural |= event.is_structural();
            summary.handled += 1;
            self.apply(&event);
        }
        summary
    }

    /// Writes a view-originated edit to the store, then refreshes both views.
    ///
    /// If the store refuses the edit, both views are reset to the stored
    /// segment so a rejected drag does not linger on the waveform.
    pub fn apply_view_event(
        &mut self,
        store: &mut SegmentStore,
        event: &ViewEvent,
    ) -> (Option<Segment>, PumpSummary) {
        let id = event.segment_id();
        let updated = store.update_by_id(id, &event.to_patch());
        let summary = self.pump();
        if updated.is_none() {
            if let Some(current) = store.find_by_id(id) {
                self.apply(&StoreEvent::Updated {
                    segment: current.clone(),
                });
            }
        }
        (updated, summary)
    }

    pub fn regions(&self) -> &WaveformRegions {
        &self.regions
    }

    pub fn regions_mut(&mut self) -> &mut WaveformRegions {
        &mut self.regions
    }

    pub fn table(&self) -> &SegmentTable {
        &self.table
    }

    /// True when both views list the store's ids in store order.
    pub fn is_consistent_with(&self, store: &SegmentStore) -> bool {
        let ids: Vec<_> = store.all().iter().map(|s| s.id).collect();
        self.regions.ids() == ids && self.table.ids() == ids
    }

    fn apply(&mut self, event: &StoreEvent) {
        log::debug!("Sync: {event:?}");
        let views: [&mut dyn SegmentView; 2] = [&mut self.regions, &mut self.table];
        for view in views {
            match event {
                StoreEvent::Inserted { index, segment } => view.insert(*index, segment),
                StoreEvent::Removed { id } => view.remove(id),
                StoreEvent::Updated { segment } => view.refresh(segment),
                StoreEvent::Cleared => view.clear(),
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpSummary {
    pub handled: usize,
    pub structural: bool,
}
