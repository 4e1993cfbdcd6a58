pub mod segment_table;
pub mod waveform_regions;
