pub mod force_graph;
mod store_signal;

pub use store_signal::{StoreHandle, use_store_selector};
