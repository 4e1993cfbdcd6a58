pub mod segment_view;
