// Adapters layer: concrete implementations of the view-side ports.

pub mod memory_view;
pub mod view_sync;
