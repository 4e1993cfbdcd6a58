pub mod sync_bridge;
pub mod view_event;
