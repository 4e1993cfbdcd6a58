use crate::segments::domain::segment::Segment;
use crate::shared::segment_id::SegmentId;
use crate::shared::time_format::format_seconds;
use crate::views::domain::segment_view::SegmentView;

/// One table row. Time cells hold display strings rounded to two decimals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow {
    pub id: SegmentId,
    pub start: String,
    pub end: String,
    pub duration: String,
    pub text: String,
}

impl TableRow {
    fn from_segment(segment: &Segment) -> Self {
        Self {
            id: segment.id,
            start: format_seconds(segment.start),
            end: format_seconds(segment.end),
            duration: format_seconds(segment.duration()),
            text: segment.text.clone(),
        }
    }
}

/// Tabular projection of the store.
#[derive(Debug, Default)]
pub struct SegmentTable {
    rows: Vec<TableRow>,
}

impl SegmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row(&self, id: &SegmentId) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.id == *id)
    }

    pub fn row_at(&self, index: usize) -> Option<&TableRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl SegmentView for SegmentTable {
    fn insert(&mut self, index: usize, segment: &Segment) {
        let at = index.min(self.rows.len());
        self.rows.insert(at, TableRow::from_segment(segment));
    }

    fn remove(&mut self, id: &SegmentId) {
        match self.rows.iter().position(|r| r.id == *id) {
            Some(index) => {
                self.rows.remove(index);
            }
            None => log::warn!("Segment row with ID {id} not found."),
        }
    }

    fn refresh(&mut self, segment: &Segment) {
        match self.rows.iter_mut().find(|r| r.id == segment.id) {
            Some(row) => *row = TableRow::from_segment(segment),
            None => log::warn!("Segment row with ID {} not found.", segment.id),
        }
    }

    fn clear(&mut self) {
        self.rows.clear();
    }

    fn ids(&self) -> Vec<SegmentId> {
        self.rows.iter().map(|r| r.id).collect()
    }
}
