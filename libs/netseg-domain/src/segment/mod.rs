//! Segment domain module
//!
//! This module contains the Segment entity, its wire-level requests and
//! views, collection queries, and the manager that orchestrates them.

mod entity;
mod error;
mod ids;
mod query;
mod request;
mod service;

pub use entity::{FieldValue, Segment, SegmentField, SegmentView};
pub use error::{Result, SegmentError};
pub use ids::{NetworkId, SegmentId};
pub use query::{compare, CollectionQuery, Filters, ListOptions, SortDirection, SortKey};
pub use request::{Attr, SegmentSpec, SegmentUpdate};
pub use service::{SegmentManager, SEGMENT_RESOURCE};
