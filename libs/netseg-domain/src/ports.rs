//! Ports (trait definitions) for external dependencies
//!
//! The segment manager owns none of its collaborators' machinery: storage,
//! transactions, marker lookup and id generation are all reached through the
//! traits below and implemented by adapter crates.
//!
//! ## Static Dispatch
//!
//! We use native Rust async traits with `impl Future` return types instead of
//! `async_trait` so the manager is monomorphized over its adapters.

use std::future::Future;

use crate::context::{RequestContext, SessionId};
use crate::segment::{CollectionQuery, Filters, Segment, SegmentError, SegmentId};

/// Port for session-scoped transactions
///
/// A session has at most one open transaction. Beginning again while one is
/// open opens a savepoint inside it, so operations that wrap themselves in a
/// transaction compose with a transaction the caller already holds.
pub trait Transactional: Send + Sync {
    /// Open a transaction for the session, or a savepoint inside the open one
    fn begin(&self, session: &SessionId) -> impl Future<Output = Result<(), SegmentError>> + Send;

    /// Release the innermost savepoint, or commit the outermost transaction
    ///
    /// When committing the outermost transaction fails, the transaction is
    /// discarded and nothing it wrote becomes visible.
    ///
    /// # Errors
    ///
    /// - `SegmentError::TransactionFailure` if the session has nothing open
    /// - constraint errors raised while applying the writes
    fn commit(&self, session: &SessionId) -> impl Future<Output = Result<(), SegmentError>> + Send;

    /// Discard the innermost level
    ///
    /// Synchronous so it can run from `Drop`. A no-op when nothing is open.
    fn rollback(&self, session: &SessionId);
}

/// Port for segment persistence
///
/// Every call takes the request context so that reads inside a transaction
/// observe the session's own uncommitted writes. Writes outside a
/// transaction apply immediately.
pub trait SegmentStore: Transactional {
    /// Fetch one record, `None` when absent
    fn get_by_id(
        &self,
        ctx: &RequestContext,
        id: &SegmentId,
    ) -> impl Future<Output = Result<Option<Segment>, SegmentError>> + Send;

    /// Persist a new record
    ///
    /// # Errors
    ///
    /// - `SegmentError::SegmentAlreadyExists` on a duplicate id
    /// - `SegmentError::NetworkNotFound` when the store enforces network
    ///   references and the network is unknown
    fn insert(
        &self,
        ctx: &RequestContext,
        segment: &Segment,
    ) -> impl Future<Output = Result<(), SegmentError>> + Send;

    /// Overwrite an existing record
    fn update(
        &self,
        ctx: &RequestContext,
        segment: &Segment,
    ) -> impl Future<Output = Result<(), SegmentError>> + Send;

    /// Delete every record matching `filters`, returning how many went away
    fn delete_where(
        &self,
        ctx: &RequestContext,
        filters: &Filters,
    ) -> impl Future<Output = Result<usize, SegmentError>> + Send;

    /// Fetch one page of a collection
    ///
    /// Implementations must slice exactly as `CollectionQuery::slice` does.
    fn query_collection(
        &self,
        ctx: &RequestContext,
        query: &CollectionQuery<'_>,
    ) -> impl Future<Output = Result<Vec<Segment>, SegmentError>> + Send;

    /// Count records matching `filters`
    fn query_count(
        &self,
        ctx: &RequestContext,
        filters: &Filters,
    ) -> impl Future<Output = Result<usize, SegmentError>> + Send;
}

/// Port for turning a pagination marker into the record it names
pub trait MarkerResolver: Send + Sync {
    /// Resolve `marker` for `resource`
    ///
    /// Returns `None` when no limit is set, when no marker is given, or when
    /// the marker names a record that does not exist.
    fn resolve_marker(
        &self,
        ctx: &RequestContext,
        resource: &str,
        limit: Option<usize>,
        marker: Option<&SegmentId>,
    ) -> impl Future<Output = Result<Option<Segment>, SegmentError>> + Send;
}

/// Port for minting segment ids
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    fn generate_id(&self) -> SegmentId;
}

/// Generates time-ordered UUID segment ids
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate_id(&self) -> SegmentId {
        SegmentId::new()
    }
}
