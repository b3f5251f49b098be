//! In-Memory Segment Store
//!
//! This module implements the `SegmentStore`, `Transactional` and
//! `MarkerResolver` ports over a process-local table. Each session may hold
//! one open transaction; its writes are buffered and replayed onto the shared
//! table when the outermost level commits.

use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use netseg_domain::ports::{MarkerResolver, SegmentStore, Transactional};
use netseg_domain::segment::{
    CollectionQuery, Filters, NetworkId, Segment, SegmentError, SegmentId, SEGMENT_RESOURCE,
};
use netseg_domain::{RequestContext, SessionId};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use super::transaction::{SessionTransaction, TxnWrite};

#[derive(Debug, Default)]
struct StoreState {
    committed: BTreeMap<SegmentId, Segment>,
    /// Known networks; `None` leaves network references unchecked
    networks: Option<HashSet<NetworkId>>,
    sessions: HashMap<SessionId, SessionTransaction>,
}

impl StoreState {
    /// The table as `session` sees it
    fn view(&self, session: &SessionId) -> Result<Cow<'_, BTreeMap<SegmentId, Segment>>, SegmentError> {
        match self.sessions.get(session) {
            Some(txn) => txn.overlay(&self.committed).map(Cow::Owned),
            None => Ok(Cow::Borrowed(&self.committed)),
        }
    }

    /// Validate and record a write for `session`
    ///
    /// Inside a transaction the write is checked against the session's view
    /// and buffered; otherwise it applies to the committed table at once.
    fn write(&mut self, session: &SessionId, write: TxnWrite) -> Result<(), SegmentError> {
        match self.sessions.get_mut(session) {
            Some(txn) => {
                let mut view = txn.overlay(&self.committed)?;
                write.apply(&mut view, self.networks.as_ref())?;
                txn.push(write);
            }
            None => write.apply(&mut self.committed, self.networks.as_ref())?,
        }
        Ok(())
    }
}

/// Segment store kept in process memory
///
/// Clones share the same table, so one store can back both the storage and
/// the marker-resolution roles of a `SegmentManager`.
///
/// ## Network references
///
/// A store built with [`InMemorySegmentStore::with_networks`] rejects segments
/// whose network it does not know with `SegmentError::NetworkNotFound`. A
/// store built with [`InMemorySegmentStore::new`] accepts any network id.
#[derive(Debug, Clone, Default)]
pub struct InMemorySegmentStore {
    inner: Arc<Mutex<StoreState>>,
}

impl InMemorySegmentStore {
    /// Create an empty store that accepts any network id
    pub fn new() -> Self {
        info!("Initializing InMemorySegmentStore");
        Self::default()
    }

    /// Create an empty store that only accepts the given networks
    ///
    /// # Example
    ///
    /// ```rust
    /// use netseg_domain::segment::NetworkId;
    /// use netseg_memory::InMemorySegmentStore;
    ///
    /// let network = NetworkId::from_uuid(uuid::Uuid::new_v4());
    /// let store = InMemorySegmentStore::with_networks([network]);
    /// assert!(store.is_empty());
    /// ```
    pub fn with_networks(networks: impl IntoIterator<Item = NetworkId>) -> Self {
        let networks: HashSet<NetworkId> = networks.into_iter().collect();
        info!(networks = networks.len(), "Initializing InMemorySegmentStore with network checks");
        Self {
            inner: Arc::new(Mutex::new(StoreState {
                networks: Some(networks),
                ..StoreState::default()
            })),
        }
    }

    /// Make `network_id` known to a store that checks network references
    ///
    /// Has no effect on a store that accepts any network id.
    pub fn register_network(&self, network_id: NetworkId) {
        if let Some(networks) = self.inner.lock().networks.as_mut() {
            networks.insert(network_id);
        }
    }

    /// Number of committed segments
    pub fn len(&self) -> usize {
        self.inner.lock().committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().committed.is_empty()
    }

    /// Open transaction levels of `session`, zero when none is open
    pub fn transaction_depth(&self, session: &SessionId) -> usize {
        self.inner
            .lock()
            .sessions
            .get(session)
            .map_or(0, SessionTransaction::depth)
    }
}

impl Transactional for InMemorySegmentStore {
    #[instrument(skip(self), fields(session = %session))]
    fn begin(&self, session: &SessionId) -> impl Future<Output = Result<(), SegmentError>> + Send {
        let inner = self.inner.clone();
        let session = *session;

        async move {
            let mut state = inner.lock();
            match state.sessions.entry(session) {
                Entry::Occupied(mut entry) => {
                    let txn = entry.get_mut();
                    txn.savepoint();
                    debug!(depth = txn.depth(), "Opened savepoint");
                }
                Entry::Vacant(entry) => {
                    entry.insert(SessionTransaction::default());
                    debug!("Began transaction");
                }
            }
            Ok(())
        }
    }

    #[instrument(skip(self), fields(session = %session))]
    fn commit(&self, session: &SessionId) -> impl Future<Output = Result<(), SegmentError>> + Send {
        let inner = self.inner.clone();
        let session = *session;

        async move {
            let mut state = inner.lock();

            let mut txn = state.sessions.remove(&session).ok_or_else(|| {
                SegmentError::transaction_failure(format!("no transaction open for session {session}"))
            })?;

            if txn.release_savepoint() {
                debug!(depth = txn.depth(), "Released savepoint");
                state.sessions.insert(session, txn);
                return Ok(());
            }

            let writes = txn.into_writes();
            let mut table = state.committed.clone();
            for write in &writes {
                if let Err(err) = write.apply(&mut table, state.networks.as_ref()) {
                    warn!(error = %err, "Transaction commit failed, discarding writes");
                    return Err(err);
                }
            }
            state.committed = table;

            info!(writes = writes.len(), "Committed transaction");
            Ok(())
        }
    }

    #[instrument(skip(self), fields(session = %session))]
    fn rollback(&self, session: &SessionId) {
        let mut state = self.inner.lock();
        let Some(txn) = state.sessions.get_mut(session) else {
            return;
        };

        if txn.rollback_to_savepoint() {
            debug!(depth = txn.depth(), "Rolled back to savepoint");
        } else {
            state.sessions.remove(session);
            debug!("Rolled back transaction");
        }
    }
}

impl SegmentStore for InMemorySegmentStore {
    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id(), segment_id = %id))]
    fn get_by_id(
        &self,
        ctx: &RequestContext,
        id: &SegmentId,
    ) -> impl Future<Output = Result<Option<Segment>, SegmentError>> + Send {
        let inner = self.inner.clone();
        let session = *ctx.session();
        let id = *id;

        async move {
            let state = inner.lock();
            let found = state.view(&session)?.get(&id).cloned();
            debug!(found = found.is_some(), "Looked up segment");
            Ok(found)
        }
    }

    #[instrument(skip(self, ctx, segment), fields(request_id = %ctx.request_id(), segment_id = %segment.id()))]
    fn insert(
        &self,
        ctx: &RequestContext,
        segment: &Segment,
    ) -> impl Future<Output = Result<(), SegmentError>> + Send {
        let inner = self.inner.clone();
        let session = *ctx.session();
        let segment = segment.clone();

        async move {
            inner.lock().write(&session, TxnWrite::Insert(segment))?;
            debug!("Inserted segment");
            Ok(())
        }
    }

    #[instrument(skip(self, ctx, segment), fields(request_id = %ctx.request_id(), segment_id = %segment.id()))]
    fn update(
        &self,
        ctx: &RequestContext,
        segment: &Segment,
    ) -> impl Future<Output = Result<(), SegmentError>> + Send {
        let inner = self.inner.clone();
        let session = *ctx.session();
        let segment = segment.clone();

        async move {
            let mut state = inner.lock();
            if !state.view(&session)?.contains_key(segment.id()) {
                return Err(SegmentError::not_found(*segment.id()));
            }
            state.write(&session, TxnWrite::Update(segment))?;
            debug!("Updated segment");
            Ok(())
        }
    }

    #[instrument(skip(self, ctx, filters), fields(request_id = %ctx.request_id()))]
    fn delete_where(
        &self,
        ctx: &RequestContext,
        filters: &Filters,
    ) -> impl Future<Output = Result<usize, SegmentError>> + Send {
        let inner = self.inner.clone();
        let session = *ctx.session();
        let filters = filters.clone();

        async move {
            let mut state = inner.lock();
            let doomed: Vec<SegmentId> = state
                .view(&session)?
                .values()
                .filter(|segment| filters.matches(segment))
                .map(|segment| *segment.id())
                .collect();

            for id in &doomed {
                state.write(&session, TxnWrite::Delete(*id))?;
            }

            debug!(deleted = doomed.len(), "Deleted segments");
            Ok(doomed.len())
        }
    }

    #[instrument(
        skip(self, ctx, query),
        fields(request_id = %ctx.request_id(), limit = ?query.limit, page_reverse = query.page_reverse)
    )]
    fn query_collection(
        &self,
        ctx: &RequestContext,
        query: &CollectionQuery<'_>,
    ) -> impl Future<Output = Result<Vec<Segment>, SegmentError>> + Send {
        let inner = self.inner.clone();
        let session = *ctx.session();
        let filters = query.filters.clone();
        let sorts = query.sorts.to_vec();
        let marker = query.marker.cloned();
        let limit = query.limit;
        let page_reverse = query.page_reverse;

        async move {
            let query = CollectionQuery {
                filters: &filters,
                sorts: &sorts,
                limit,
                marker: marker.as_ref(),
                page_reverse,
            };

            let state = inner.lock();
            let rows = query.slice(state.view(&session)?.values().cloned());
            debug!(count = rows.len(), "Queried segment collection");
            Ok(rows)
        }
    }

    #[instrument(skip(self, ctx, filters), fields(request_id = %ctx.request_id()))]
    fn query_count(
        &self,
        ctx: &RequestContext,
        filters: &Filters,
    ) -> impl Future<Output = Result<usize, SegmentError>> + Send {
        let inner = self.inner.clone();
        let session = *ctx.session();
        let filters = filters.clone();

        async move {
            let state = inner.lock();
            let count = state
                .view(&session)?
                .values()
                .filter(|segment| filters.matches(segment))
                .count();
            Ok(count)
        }
    }
}

impl MarkerResolver for InMemorySegmentStore {
    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    fn resolve_marker(
        &self,
        ctx: &RequestContext,
        resource: &str,
        limit: Option<usize>,
        marker: Option<&SegmentId>,
    ) -> impl Future<Output = Result<Option<Segment>, SegmentError>> + Send {
        let inner = self.inner.clone();
        let session = *ctx.session();
        let supported = resource == SEGMENT_RESOURCE;
        let resource = resource.to_string();
        let marker = limit.and(marker.copied());

        async move {
            if !supported {
                return Err(SegmentError::invalid_input(format!(
                    "cannot paginate unknown resource '{resource}'"
                )));
            }
            let Some(marker) = marker else {
                return Ok(None);
            };

            let state = inner.lock();
            let record = state.view(&session)?.get(&marker).cloned();
            if record.is_none() {
                debug!(marker = %marker, "Marker names no segment, ignoring it");
            }
            Ok(record)
        }
    }
}
