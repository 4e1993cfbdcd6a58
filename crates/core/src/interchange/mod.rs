pub mod dataset_request;
pub mod segment_file;
