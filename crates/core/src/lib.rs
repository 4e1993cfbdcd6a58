//! Segment editing core: an ordered segment store with derived adjacency,
//! pair-only selection and concat, and a sync bridge that keeps the waveform
//! regions and the segment table in step with the store.

pub mod interchange;
pub mod segments;
pub mod session;
pub mod shared;
pub mod sync;
pub mod transcription;
pub mod views;
