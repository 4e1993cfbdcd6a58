pub mod adjacency_graph;
pub mod concat_engine;
pub mod segment;
pub mod segment_store;
pub mod selection;
pub mod store_event;
