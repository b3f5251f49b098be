//! # NetSeg In-Memory Storage
//!
//! Storage adapter implementing the `netseg-domain` ports on top of an
//! in-process table, with per-session nested transactions.

pub mod infrastructure;

pub use infrastructure::InMemorySegmentStore;
