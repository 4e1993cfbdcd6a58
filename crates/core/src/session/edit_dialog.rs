use crate::segments::domain::segment::Segment;
use crate::shared::segment_id::SegmentId;
use crate::sync::view_event::ViewEvent;

/// An open text editor for one segment.
///
/// Holds the segment id and its text at the time of opening. Confirming
/// turns the edited string into a [`ViewEvent`]; dropping the dialog
/// discards the edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDialog {
    segment_id: SegmentId,
    initial_text: String,
}

impl EditDialog {
    pub fn open(segment: &Segment) -> Self {
        Self {
            segment_id: segment.id,
            initial_text: segment.text.clone(),
        }
    }

    pub fn segment_id(&self) -> &SegmentId {
        &self.segment_id
    }

    pub fn initial_text(&self) -> &str {
        &self.initial_text
    }

    pub fn confirm(self, text: impl Into<String>) -> ViewEvent {
        ViewEvent::TextConfirmed {
            id: self.segment_id,
            text: text.into(),
        }
    }
}
