pub mod constants;
pub mod segment_id;
pub mod time_format;
