use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::context_menu::{self, MenuItem};
use super::edit_dialog::EditDialog;
use crate::interchange::dataset_request::DatasetExportRequest;
use crate::interchange::segment_file::{self, InterchangeError};
use crate::segments::domain::concat_engine::{ConcatEngine, ConcatRejection};
use crate::segments::domain::segment::{RawSegment, Segment};
use crate::segments::domain::segment_store::{SegmentStore, StoreError};
use crate::segments::domain::selection::{Selection, ToggleOutcome};
use crate::shared::constants::TRANSCRIPTION_POLL_INTERVAL;
use crate::shared::segment_id::SegmentId;
use crate::sync::sync_bridge::{PumpSummary, SyncBridge};
use crate::sync::view_event::ViewEvent;
use crate::transcription::domain::transcription_service::{
    JobId, ServiceError, TranscriptionParams, TranscriptionService,
};
use crate::transcription::infrastructure::transcription_poller::{
    self, PollHandle, PollMessage,
};
use crate::views::infrastructure::segment_table::SegmentTable;
use crate::views::infrastructure::waveform_regions::WaveformRegions;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no audio file is loaded")]
    NoAudio,
    #[error("a transcription is already running")]
    TranscriptionRunning,
    #[error("transcription request failed: {0}")]
    Service(ServiceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Interchange(#[from] InterchangeError),
}

/// The audio the session's segments belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    /// Name the user picked the file under, used for export names.
    pub original_name: String,
    /// Name the server stored the upload under, used in API routes.
    pub managed_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionUpdate {
    Idle,
    Running,
    Completed { segments: usize },
    Failed(String),
}

/// Everything one editing session owns: the store, the selection, both
/// views and the loaded audio.
///
/// All mutations go through here. After each one the bridge replays the
/// store events onto the views, and a structural change clears the selection
/// exactly once.
pub struct EditingSession {
    store: SegmentStore,
    selection: Selection,
    bridge: SyncBridge,
    audio: Option<AudioSource>,
    transcription: Option<PollHandle>,
    poll_interval: Duration,
}

impl EditingSession {
    pub fn new() -> Self {
        Self::with_poll_interval(TRANSCRIPTION_POLL_INTERVAL)
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        let mut store = SegmentStore::new();
        let bridge = SyncBridge::attach(&mut store);
        Self {
            store,
            selection: Selection::new(),
            bridge,
            audio: None,
            transcription: None,
            poll_interval,
        }
    }

    // ─── Lifecycle ───

    /// Switches to a new audio file, dropping all segments and any
    /// outstanding transcription.
    pub fn load_audio(&mut self, audio: AudioSource) {
        self.discard_state();
        log::info!(
            "Loaded audio {} (managed as {})",
            audio.original_name,
            audio.managed_name
        );
        self.audio = Some(audio);
    }

    pub fn reset(&mut self) {
        self.discard_state();
        self.audio = None;
    }

    /// Replaces the store wholesale. Input is stable-sorted by start, then
    /// appended one by one.
    pub fn initialize(&mut self, mut segments: Vec<Segment>) {
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        self.store.clear();
        for segment in segments {
            self.store.insert_sorted(segment);
        }
        self.after_mutation();
        log::info!("Initialized session with {} segments", self.store.len());
    }

    /// Admits id-less triples, stamping a fresh id on each.
    pub fn initialize_raw(&mut self, raw: Vec<RawSegment>) {
        self.initialize(raw.into_iter().map(RawSegment::into_segment).collect());
    }

    // ─── Import / export ───

    /// True when importing would replace existing segments.
    pub fn needs_import_confirmation(&self) -> bool {
        !self.store.is_empty()
    }

    /// Replaces the store with the segments in `json`, or leaves it untouched
    /// if any part of the document is malformed.
    pub fn import_json(&mut self, json: &str) -> Result<usize, InterchangeError> {
        let raw = segment_file::parse_segments(json)?;
        let count = raw.len();
        self.initialize_raw(raw);
        Ok(count)
    }

    pub fn import_file(&mut self, path: &Path) -> Result<usize, InterchangeError> {
        let raw = segment_file::read_segments_file(path)?;
        let count = raw.len();
        self.initialize_raw(raw);
        Ok(count)
    }

    /// Segments in store order, ready for serialization.
    pub fn export_segments(&self) -> Vec<Segment> {
        self.store.all().to_vec()
    }

    /// Pretty JSON of the store, or `None` when there is nothing to export.
    pub fn export_json(&self) -> Result<Option<String>, InterchangeError> {
        if self.store.is_empty() {
            return Ok(None);
        }
        segment_file::to_json(self.store.all()).map(Some)
    }

    pub fn export_file_name(&self, at: &chrono::NaiveDateTime) -> Option<String> {
        self.audio
            .as_ref()
            .map(|a| segment_file::export_file_name(&a.original_name, at))
    }

    /// Managed audio name plus the dataset payload. `None` without audio or
    /// without segments.
    pub fn dataset_request(&self) -> Option<(String, DatasetExportRequest)> {
        let audio = self.audio.as_ref()?;
        if self.store.is_empty() {
            return None;
        }
        Some((
            audio.managed_name.clone(),
            DatasetExportRequest {
                segments: self.export_segments(),
                original_file_name: audio.original_name.clone(),
            },
        ))
    }

    // ─── Selection and concat ───

    pub fn toggle_selection(&mut self, id: SegmentId) -> ToggleOutcome {
        let (next, outcome) = self.selection.toggle(id, self.store.adjacency());
        self.selection = next;
        self.bridge.regions_mut().show_selection(&self.selection);
        outcome
    }

    pub fn selected_segments(&self) -> Vec<&Segment> {
        self.selection.selected_segments(&self.store)
    }

    /// Menu for a right-clicked region; empty if the region is unknown.
    pub fn context_menu(&self, id: &SegmentId) -> Vec<MenuItem> {
        if self.bridge.regions().region(id).is_none() {
            return Vec::new();
        }
        context_menu::menu_items(&self.selection, self.store.adjacency())
    }

    pub fn merge_selected(&mut self) -> Result<Segment, ConcatRejection> {
        let merged = ConcatEngine::concat(&mut self.store, &self.selection)?;
        self.after_mutation();
        Ok(merged)
    }

    // ─── Direct edits ───

    /// Inserts at the position that keeps start order.
    pub fn add_segment(&mut self, start: f64, end: f64, text: impl Into<String>) -> SegmentId {
        let segment = SegmentStore::create(start, end, text);
        let id = segment.id;
        self.store.insert_sorted(segment);
        self.after_mutation();
        id
    }

    /// Inserts at an explicit index. Refused if the index is out of range or
    /// would break start order.
    pub fn insert_segment_at(
        &mut self,
        index: usize,
        segment: Segment,
    ) -> Result<(), SessionError> {
        self.store.insert_at(index, segment)?;
        self.after_mutation();
        Ok(())
    }

    pub fn remove_segment(&mut self, id: &SegmentId) -> Option<Segment> {
        let removed = self.store.remove_by_id(id);
        self.after_mutation();
        removed
    }

    /// A region drag/resize finished on the waveform. Moving a segment past a
    /// neighbor re-sorts the store and clears the selection.
    pub fn finish_region_drag(
        &mut self,
        id: &SegmentId,
        start: f64,
        end: f64,
    ) -> Option<Segment> {
        let event = self.bridge.regions_mut().finish_drag(id, start, end)?;
        self.apply_view_event(&event)
    }

    pub fn open_edit_dialog(&self, id: &SegmentId) -> Option<EditDialog> {
        match self.store.find_by_id(id) {
            Some(segment) => Some(EditDialog::open(segment)),
            None => {
                log::warn!("Segment with ID {id} not found, edit dialog not opened");
                None
            }
        }
    }

    pub fn confirm_edit(
        &mut self,
        dialog: EditDialog,
        text: impl Into<String>,
    ) -> Option<Segment> {
        let event = dialog.confirm(text);
        self.apply_view_event(&event)
    }

    pub fn seek_ratio(&self, id: &SegmentId, audio_duration: f64) -> Option<f64> {
        self.bridge.regions().seek_ratio(id, audio_duration)
    }

    // ─── Transcription ───

    /// Submits the loaded audio and starts polling for the result.
    pub fn start_transcription(
        &mut self,
        service: Arc<dyn TranscriptionService>,
        params: &TranscriptionParams,
    ) -> Result<JobId, SessionError> {
        let audio = self.audio.as_ref().ok_or(SessionError::NoAudio)?;
        if self.is_transcribing() {
            return Err(SessionError::TranscriptionRunning);
        }
        let job = service
            .submit(&audio.managed_name, params)
            .map_err(SessionError::Service)?;
        log::info!(
            "Submitted {} for transcription with {} ({}), job {job}",
            audio.managed_name,
            params.tool,
            params.model
        );
        self.transcription = Some(transcription_poller::spawn(
            service,
            job.clone(),
            self.poll_interval,
        ));
        Ok(job)
    }

    pub fn is_transcribing(&self) -> bool {
        self.transcription.is_some()
    }

    /// Applies a finished transcription, if one has arrived. Never blocks.
    pub fn poll_transcription(&mut self) -> TranscriptionUpdate {
        let message = match self.transcription.as_ref() {
            None => return TranscriptionUpdate::Idle,
            Some(handle) => handle.try_result(),
        };
        self.handle_poll_message(message)
    }

    /// Like [`Self::poll_transcription`] but waits up to `timeout`.
    pub fn wait_for_transcription(&mut self, timeout: Duration) -> TranscriptionUpdate {
        let message = match self.transcription.as_ref() {
            None => return TranscriptionUpdate::Idle,
            Some(handle) => handle.wait(timeout),
        };
        self.handle_poll_message(message)
    }

    pub fn cancel_transcription(&mut self) {
        if let Some(handle) = self.transcription.take() {
            log::info!("Cancelled transcription job {}", handle.job());
        }
    }

    // ─── Read access ───

    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn regions(&self) -> &WaveformRegions {
        self.bridge.regions()
    }

    pub fn table(&self) -> &SegmentTable {
        self.bridge.table()
    }

    pub fn audio(&self) -> Option<&AudioSource> {
        self.audio.as_ref()
    }

    /// True when both views mirror the store exactly.
    pub fn views_in_sync(&self) -> bool {
        self.bridge.is_consistent_with(&self.store)
    }

    fn handle_poll_message(&mut self, message: Option<PollMessage>) -> TranscriptionUpdate {
        match message {
            None => TranscriptionUpdate::Running,
            Some(PollMessage::Completed(raw)) => {
                self.transcription = None;
                let invalid = raw
                    .iter()
                    .enumerate()
                    .find_map(|(index, segment)| segment.validate().err().map(|e| (index, e)));
                if let Some((index, reason)) = invalid {
                    let reason = format!("server returned invalid segment {index}: {reason}");
                    log::error!("Transcription rejected: {reason}");
                    return TranscriptionUpdate::Failed(reason);
                }
                let segments = raw.len();
                log::info!("Transcribed successfully: {segments} segments");
                self.initialize_raw(raw);
                TranscriptionUpdate::Completed { segments }
            }
            Some(PollMessage::Failed(reason)) => {
                self.transcription = None;
                log::error!("Transcription failed: {reason}");
                TranscriptionUpdate::Failed(reason)
            }
        }
    }

    fn discard_state(&mut self) {
        self.cancel_transcription();
        self.store.clear();
        self.after_mutation();
    }

    fn apply_view_event(&mut self, event: &ViewEvent) -> Option<Segment> {
        let (updated, summary) = self.bridge.apply_view_event(&mut self.store, event);
        self.settle(summary);
        updated
    }

    fn after_mutation(&mut self) {
        let summary = self.bridge.pump();
        self.settle(summary);
    }

    /// A structural change (insert, remove, move) drops the selection.
    fn settle(&mut self, summary: PumpSummary) {
        if summary.structural {
            self.selection.clear();
            self.bridge.regions_mut().show_selection(&self.selection);
        }
    }
}

impl Default for EditingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::domain::selection::SelectionRejection;
    use crate::transcription::domain::transcription_service::JobStatus;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    // ─── Stubs ───

    struct StubService {
        statuses: Mutex<VecDeque<JobStatus>>,
        submitted: Mutex<Vec<String>>,
        fail_submit: bool,
    }

    impl StubService {
        fn new(statuses: Vec<JobStatus>) -> Arc<Self> {
            Arc::new(Self {
                statuses: Mutex::new(statuses.into()),
                submitted: Mutex::new(Vec::new()),
                fail_submit: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                statuses: Mutex::new(VecDeque::new()),
                submitted: Mutex::new(Vec::new()),
                fail_submit: true,
            })
        }
    }

    impl TranscriptionService for StubService {
        fn submit(&self, audio: &str, _: &TranscriptionParams) -> Result<JobId, ServiceError> {
            if self.fail_submit {
                return Err("server unreachable".into());
            }
            self.submitted.lock().unwrap().push(audio.to_string());
            Ok(JobId("job-1".into()))
        }

        fn poll(&self, _: &JobId) -> Result<JobStatus, ServiceError> {
            Ok(self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(JobStatus::Pending))
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    fn audio() -> AudioSource {
        AudioSource {
            original_name: "talk.wav".into(),
            managed_name: "0f3c.wav".into(),
        }
    }

    fn raw(start: f64, end: f64, text: &str) -> RawSegment {
        RawSegment {
            start,
            end,
            text: text.into(),
        }
    }

    fn session_with(triples: &[(f64, f64, &str)]) -> (EditingSession, Vec<SegmentId>) {
        let mut session = EditingSession::with_poll_interval(Duration::from_millis(1));
        session.initialize_raw(triples.iter().map(|(s, e, t)| raw(*s, *e, t)).collect());
        let ids = session.store().all().iter().map(|s| s.id).collect();
        (session, ids)
    }

    fn is_sorted(session: &EditingSession) -> bool {
        session
            .store()
            .all()
            .windows(2)
            .all(|w| w[0].start <= w[1].start)
    }

    // ─── Initialize ───

    #[test]
    fn test_initialize_projects_into_both_views() {
        let (session, _) = session_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b")]);
        assert_eq!(session.store().len(), 2);
        assert_eq!(session.table().len(), 2);
        assert_eq!(session.regions().regions().len(), 2);
        assert!(session.views_in_sync());
    }

    #[test]
    fn test_initialize_sorts_unsorted_input() {
        let (session, _) =
            session_with(&[(2.0, 3.0, "c"), (0.0, 1.0, "a"), (1.0, 2.0, "b")]);
        assert!(is_sorted(&session));
        assert!(session.views_in_sync());
    }

    #[test]
    fn test_initialize_empty_clears_store_and_selection() {
        let (mut session, ids) = session_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b")]);
        session.toggle_selection(ids[0]);
        session.initialize(Vec::new());
        assert!(session.store().is_empty());
        assert!(session.selection().is_empty());
        assert!(session.table().is_empty());
    }

    #[test]
    fn test_initialize_raw_stamps_fresh_ids() {
        let (mut session, first_ids) = session_with(&[(0.0, 1.0, "a")]);
        session.initialize_raw(vec![raw(0.0, 1.0, "a")]);
        assert_ne!(session.store().all()[0].id, first_ids[0]);
    }

    // ─── Selection ───

    #[test]
    fn test_selection_highlights_regions() {
        let (mut session, ids) = session_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b")]);
        assert_eq!(session.toggle_selection(ids[1]), ToggleOutcome::Selected);
        assert!(session.regions().region(&ids[1]).unwrap().selected);
        assert!(!session.regions().region(&ids[0]).unwrap().selected);
    }

    #[test]
    fn test_third_selection_leaves_selection_unchanged() {
        let (mut session, ids) =
            session_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b"), (2.0, 3.0, "c")]);
        session.toggle_selection(ids[0]);
        session.toggle_selection(ids[1]);
        let before = session.selection().clone();
        assert_eq!(
            session.toggle_selection(ids[2]),
            ToggleOutcome::Rejected(SelectionRejection::LimitReached)
        );
        assert_eq!(session.selection(), &before);
    }

    #[test]
    fn test_structural_mutations_clear_selection() {
        let (mut session, ids) =
            session_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b"), (3.0, 4.0, "c")]);

        session.toggle_selection(ids[0]);
        session.add_segment(5.0, 6.0, "d");
        assert!(session.selection().is_empty());

        session.toggle_selection(ids[0]);
        session.remove_segment(&ids[2]);
        assert!(session.selection().is_empty());
        assert!(session.regions().regions().iter().all(|r| !r.selected));
    }

    #[test]
    fn test_edits_keep_selection() {
        let (mut session, ids) = session_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b")]);
        session.toggle_selection(ids[0]);
        session.finish_region_drag(&ids[0], 0.1, 0.9);
        let dialog = session.open_edit_dialog(&ids[0]).unwrap();
        session.confirm_edit(dialog, "x");
        assert_eq!(session.selection().ids(), &[ids[0]]);
        assert!(session.regions().region(&ids[0]).unwrap().selected);
    }

    // ─── Concat ───

    #[test]
    fn test_merge_hi_there() {
        let (mut session, ids) = session_with(&[(0.0, 2.0, "Hi"), (2.0, 5.0, " there")]);
        session.toggle_selection(ids[0]);
        session.toggle_selection(ids[1]);

        let merged = session.merge_selected().unwrap();

        assert_eq!(session.store().len(), 1);
        assert_eq!(session.store().all()[0], merged);
        assert_relative_eq!(merged.start, 0.0);
        assert_relative_eq!(merged.end, 5.0);
        assert_eq!(merged.text, "Hi there");
        assert!(session.selection().is_empty());
        assert!(session.views_in_sync());
        assert_eq!(session.table().row_at(0).unwrap().text, "Hi there");
    }

    #[test]
    fn test_merge_takes_slot_of_earlier_segment() {
        let (mut session, ids) =
            session_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b"), (2.0, 3.0, "c"), (3.0, 4.0, "d")]);
        session.toggle_selection(ids[2]);
        session.toggle_selection(ids[1]);
        let merged = session.merge_selected().unwrap();
        assert_eq!(session.store().index_of(&merged.id), Some(1));
        assert_eq!(session.store().len(), 3);
        assert!(is_sorted(&session));
    }

    #[test]
    fn test_merge_with_one_selected_is_refused() {
        let (mut session, ids) = session_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b")]);
        session.toggle_selection(ids[0]);
        let before = session.export_segments();
        assert_eq!(
            session.merge_selected(),
            Err(ConcatRejection::WrongSelectionSize(1))
        );
        assert_eq!(session.export_segments(), before);
        assert_eq!(session.selection().len(), 1);
    }

    #[test]
    fn test_context_menu_offers_concat_for_pair() {
        let (mut session, ids) = session_with(&[(0.0, 1.0, "a"), (1.0, 2.0, "b")]);
        assert!(!session.context_menu(&ids[0]).contains(&MenuItem::Concat));
        session.toggle_selection(ids[0]);
        session.toggle_selection(ids[1]);
        assert!(session.context_menu(&ids[0]).contains(&MenuItem::Concat));
        assert!(session.context_menu(&SegmentId::new()).is_empty());
    }

    // ─── Direct edits ───

    #[test]
    fn test_region_drag_updates_store_and_table() {
        let (mut session, ids) = session_with(&[(0.0, 1.0, "a")]);
        let updated = session.finish_region_drag(&ids[0], 0.333, 1.5).unwrap();
        assert_relative_eq!(updated.start, 0.333);
        assert_relative_eq!(session.store().all()[0].start, 0.333);
        assert_eq!(session.table().row_at(0).unwrap().start, "0.33");
    }

    #[test]
    fn test_drag_past_neighbor_then_merge_keeps_unselected_segment() {
        let (mut session, ids) =
            session_with(&[(0.0, 1.0, "A"), (2.0, 3.0, "B"), (4.0, 5.0, "C")]);
        session.toggle_selection(ids[2]);

        session.finish_region_drag(&ids[0], 3.0, 3.5).unwrap();
        assert!(is_sorted(&session));
        assert!(session.views_in_sync());
        assert!(session.selection().is_empty());

        assert_eq!(session.toggle_selection(ids[0]), ToggleOutcome::Selected);
        assert_eq!(session.toggle_selection(ids[1]), ToggleOutcome::Selected);
        let merged = session.merge_selected().unwrap();

        assert_eq!(merged.text, "BA");
        assert_relative_eq!(merged.start, 2.0);
        assert_relative_eq!(merged.end, 3.5);
        let texts: Vec<_> = session
            .store()
            .all()
            .iter()
            .map(|s| s.text.clone())
            .collect();
        assert_eq!(texts, vec!["BA".to_string(), "C".to_string()]);
        assert!(session.store().find_by_id(&ids[2]).is_some());
        assert!(is_sorted(&session));
        assert!(session.views_in_sync());
    }

    #[rstest]
    #[case(3.0, 1.0)]
    #[case(-1.0, 2.5)]
    #[case(f64::NAN, 3.0)]
    fn test_invalid_drag_is_refused(#[case] start: f64, #[case] end: f64) {
        let (mut session, ids) = session_with(&[(0.0, 1.0, "A"), (2.0, 3.0, "B")]);
        let before = session.export_segments();
        assert!(session.finish_region_drag(&ids[1], start, end).is_none());
        assert_eq!(session.export_segments(), before);
        assert_eq!(session.regions().play_range(&ids[1]), Some((2.0, 3.0)));
        assert_eq!(session.table().row_at(1).unwrap().end, "3.00");
    }

    #[test]
    fn test_text_edit_through_dialog() {
        let (mut session, ids) = session_with(&[(0.0, 1.0, "before")]);
        let dialog = session.open_edit_dialog(&ids[0]).unwrap();
        assert_eq!(dialog.initial_text(), "before");
        session.confirm_edit(dialog, "after");
        assert_eq!(session.store().all()[0].text, "after");
        assert_eq!(session.regions().regions()[0].content, "after");
        assert_eq!(session.table().rows()[0].text, "after");
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let (mut session, _) = session_with(&[(0.0, 1.0, "a")]);
        let before = session.export_segments();
        assert!(session.remove_segment(&SegmentId::new()).is_none());
        assert_eq!(session.export_segments(), before);
    }

    #[test]
    fn test_insert_out_of_range_is_an_error() {
        let (mut session, _) = session_with(&[(0.0, 1.0, "a")]);
        let err = session
            .insert_segment_at(3, Segment::new(5.0, 6.0, "x"))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Store(StoreError::IndexOutOfRange { .. })
        ));
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn test_insert_out_of_order_is_refused() {
        let (mut session, _) =
            session_with(&[(0.0, 1.0, "a"), (2.0, 3.0, "b"), (4.0, 5.0, "c")]);
        let before = session.export_segments();
        let err = session
            .insert_segment_at(0, Segment::new(9.0, 10.0, "z"))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Store(StoreError::OutOfOrder { index: 0, .. })
        ));
        assert_eq!(session.export_segments(), before);
        assert!(is_sorted(&session));
        assert!(session.views_in_sync());
    }

    #[test]
    fn test_insert_at_position_reaches_views() {
        let (mut session, _) = session_with(&[(0.0, 1.0, "a"), (2.0, 3.0, "c")]);
        session
            .insert_segment_at(1, Segment::new(1.0, 2.0, "b"))
            .unwrap();
        assert!(session.views_in_sync());
        assert_eq!(session.table().row_at(1).unwrap().text, "b");
    }

    #[test]
    fn test_seek_ratio() {
        let (session, ids) = session_with(&[(5.0, 6.0, "a")]);
        assert_relative_eq!(session.seek_ratio(&ids[0], 10.0).unwrap(), 0.5);
    }

    // ─── Import / export ───

    #[test]
    fn test_export_import_round_trip() {
        let (session, _) = session_with(&[(0.0, 1.25, "a"), (1.25, 2.5, "b"), (3.0, 4.0, "")]);
        let json = session.export_json().unwrap().unwrap();

        let mut other = EditingSession::new();
        assert_eq!(other.import_json(&json).unwrap(), 3);

        let triples = |s: &EditingSession| -> Vec<RawSegment> {
            s.export_segments().iter().map(RawSegment::from).collect()
        };
        assert_eq!(triples(&other), triples(&session));
        assert_ne!(other.store().all()[0].id, session.store().all()[0].id);
    }

    #[test]
    fn test_malformed_import_leaves_store_untouched() {
        let (mut session, _) = session_with(&[(0.0, 1.0, "keep")]);
        let before = session.export_segments();
        assert!(session
            .import_json(r#"[{"start":0.0,"end":1.0,"text":"ok"},{"start":"bad"}]"#)
            .is_err());
        assert_eq!(session.export_segments(), before);
        assert!(session.views_in_sync());
    }

    #[test]
    fn test_import_confirmation_needed_when_not_empty() {
        let mut session = EditingSession::new();
        assert!(!session.needs_import_confirmation());
        session.add_segment(0.0, 1.0, "a");
        assert!(session.needs_import_confirmation());
    }

    #[test]
    fn test_export_empty_is_noop() {
        let session = EditingSession::new();
        assert_eq!(session.export_json().unwrap(), None);
    }

    #[test]
    fn test_dataset_request_needs_audio_and_segments() {
        let mut session = EditingSession::new();
        assert!(session.dataset_request().is_none());
        session.load_audio(audio());
        assert!(session.dataset_request().is_none());
        session.add_segment(0.0, 1.0, "a");
        let (managed, request) = session.dataset_request().unwrap();
        assert_eq!(managed, "0f3c.wav");
        assert_eq!(request.original_file_name, "talk.wav");
        assert_eq!(request.segments.len(), 1);
    }

    #[test]
    fn test_export_file_name_uses_original_name() {
        let mut session = EditingSession::new();
        let at = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert!(session.export_file_name(&at).is_none());
        session.load_audio(audio());
        assert_eq!(
            session.export_file_name(&at).unwrap(),
            "talk_segments_20240102030405.json"
        );
    }

    // ─── Transcription ───

    #[test]
    fn test_transcription_requires_audio() {
        let mut session = EditingSession::new();
        let err = session
            .start_transcription(StubService::new(vec![]), &TranscriptionParams::default())
            .unwrap_err();
        assert!(matches!(err, SessionError::NoAudio));
    }

    #[test]
    fn test_transcription_result_initializes_session() {
        let mut session = EditingSession::with_poll_interval(Duration::from_millis(1));
        session.load_audio(audio());
        let service = StubService::new(vec![
            JobStatus::Pending,
            JobStatus::Ready(vec![raw(1.0, 2.0, "b"), raw(0.0, 1.0, "a")]),
        ]);
        let job = session
            .start_transcription(service.clone(), &TranscriptionParams::default())
            .unwrap();

        assert_eq!(job, JobId("job-1".into()));
        assert_eq!(
            *service.submitted.lock().unwrap(),
            vec!["0f3c.wav".to_string()]
        );
        assert!(session.is_transcribing());

        assert_eq!(
            session.wait_for_transcription(WAIT),
            TranscriptionUpdate::Completed { segments: 2 }
        );
        assert!(!session.is_transcribing());
        assert_eq!(session.store().len(), 2);
        assert_eq!(session.store().all()[0].text, "a");
        assert!(session.views_in_sync());
    }

    #[test]
    fn test_transcription_failure_leaves_store_untouched() {
        let mut session = EditingSession::with_poll_interval(Duration::from_millis(1));
        session.load_audio(audio());
        session.add_segment(0.0, 1.0, "keep");
        let before = session.export_segments();
        let service = StubService::new(vec![JobStatus::Failed]);
        session
            .start_transcription(service, &TranscriptionParams::default())
            .unwrap();
        assert!(matches!(
            session.wait_for_transcription(WAIT),
            TranscriptionUpdate::Failed(_)
        ));
        assert_eq!(session.export_segments(), before);
        assert_eq!(session.poll_transcription(), TranscriptionUpdate::Idle);
    }

    #[test]
    fn test_invalid_transcription_result_is_rejected() {
        let mut session = EditingSession::with_poll_interval(Duration::from_millis(1));
        session.load_audio(audio());
        session.add_segment(0.0, 1.0, "keep");
        let before = session.export_segments();
        let service = StubService::new(vec![JobStatus::Ready(vec![
            raw(0.0, 1.0, "ok"),
            raw(2.0, 1.5, "inverted"),
        ])]);
        session
            .start_transcription(service, &TranscriptionParams::default())
            .unwrap();

        match session.wait_for_transcription(WAIT) {
            TranscriptionUpdate::Failed(reason) => assert!(reason.contains("segment 1")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(session.export_segments(), before);
        assert!(!session.is_transcribing());
    }

    #[test]
    fn test_second_transcription_is_refused_while_running() {
        let mut session = EditingSession::with_poll_interval(Duration::from_millis(1));
        session.load_audio(audio());
        let service = StubService::new(vec![]);
        session
            .start_transcription(service.clone(), &TranscriptionParams::default())
            .unwrap();
        assert_eq!(session.poll_transcription(), TranscriptionUpdate::Running);
        let err = session
            .start_transcription(service, &TranscriptionParams::default())
            .unwrap_err();
        assert!(matches!(err, SessionError::TranscriptionRunning));
    }

    #[test]
    fn test_submit_failure_is_reported() {
        let mut session = EditingSession::new();
        session.load_audio(audio());
        let err = session
            .start_transcription(StubService::failing(), &TranscriptionParams::default())
            .unwrap_err();
        assert!(err.to_string().contains("server unreachable"));
        assert!(!session.is_transcribing());
    }

    #[test]
    fn test_loading_new_audio_cancels_poll() {
        let mut session = EditingSession::with_poll_interval(Duration::from_millis(1));
        session.load_audio(audio());
        session
            .start_transcription(StubService::new(vec![]), &TranscriptionParams::default())
            .unwrap();
        session.add_segment(0.0, 1.0, "a");

        session.load_audio(AudioSource {
            original_name: "next.wav".into(),
            managed_name: "1a2b.wav".into(),
        });

        assert!(!session.is_transcribing());
        assert!(session.store().is_empty());
        assert!(session.table().is_empty());
        assert_eq!(session.audio().unwrap().original_name, "next.wav");
    }

    #[test]
    fn test_reset_forgets_audio() {
        let mut session = EditingSession::new();
        session.load_audio(audio());
        session.add_segment(0.0, 1.0, "a");
        session.reset();
        assert!(session.audio().is_none());
        assert!(session.store().is_empty());
        assert!(session.selection().is_empty());
    }
}
