//! Infrastructure adapters

mod memory_store;
mod transaction;

pub use memory_store::InMemorySegmentStore;
