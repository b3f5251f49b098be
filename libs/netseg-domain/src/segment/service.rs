//! Segment manager - CRUD orchestration over the ports
//!
//! The manager translates wire-level requests into stored records and stored
//! records into projected views. Writes run inside a `TransactionScope`, so
//! they join any transaction the caller already holds on the context.

use tracing::{debug, info, instrument};

use super::{
    CollectionQuery, Filters, ListOptions, Result, Segment, SegmentError, SegmentField,
    SegmentId, SegmentSpec, SegmentUpdate, SegmentView,
};
use crate::context::RequestContext;
use crate::ports::{IdGenerator, MarkerResolver, SegmentStore, UuidGenerator};
use crate::transaction::TransactionScope;

/// Resource name used for marker resolution
pub const SEGMENT_RESOURCE: &str = "segment";

/// Manager for network segment records
///
/// The manager holds its collaborators explicitly:
/// - a `SegmentStore` for records and transactions
/// - a `MarkerResolver` for pagination markers
/// - an `IdGenerator` for ids the caller did not choose
///
/// ## Static Dispatch
///
/// The manager is generic over its ports; the compiler generates a
/// specialized version per adapter combination.
pub struct SegmentManager<S, P, G = UuidGenerator> {
    store: S,
    pagination: P,
    ids: G,
}

impl<S, P> SegmentManager<S, P, UuidGenerator>
where
    S: SegmentStore,
    P: MarkerResolver,
{
    /// Create a manager that generates UUID ids
    pub fn with_store(store: S, pagination: P) -> Self {
        Self::new(store, pagination, UuidGenerator)
    }
}

impl<S, P, G> SegmentManager<S, P, G>
where
    S: SegmentStore,
    P: MarkerResolver,
    G: IdGenerator,
{
    /// Create a manager over the given collaborators
    pub fn new(store: S, pagination: P, ids: G) -> Self {
        Self {
            store,
            pagination,
            ids,
        }
    }

    /// Open a caller-managed transaction on the manager's store
    ///
    /// Manager operations issued with the same context while the scope is
    /// open join it; nothing is visible to other sessions until the scope
    /// commits.
    pub async fn begin_transaction(&self, ctx: &RequestContext) -> Result<TransactionScope<'_, S>> {
        TransactionScope::begin_or_join(&self.store, ctx).await
    }

    /// Create a segment
    ///
    /// The id is the caller's when supplied, otherwise freshly generated.
    /// Unspecified or null `physical_network` and `segmentation_id` are
    /// stored as null.
    ///
    /// # Returns
    ///
    /// A view of the new record with every canonical field
    ///
    /// # Errors
    ///
    /// Constraint errors from the store (`SegmentAlreadyExists`,
    /// `NetworkNotFound`) are returned unchanged.
    #[instrument(
        skip(self, ctx, spec),
        fields(request_id = %ctx.request_id(), network_id = %spec.network_id)
    )]
    pub async fn create(&self, ctx: &RequestContext, spec: SegmentSpec) -> Result<SegmentView> {
        let segment_id = spec.id.unwrap_or_else(|| self.ids.generate_id());

        let segment = Segment::from_parts(
            segment_id,
            spec.network_id,
            spec.physical_network.into_option(),
            spec.network_type,
            spec.segmentation_id.into_option(),
        );

        let scope = self.begin_transaction(ctx).await?;
        self.store.insert(ctx, &segment).await?;
        scope.commit().await?;

        info!(segment_id = %segment_id, "Created segment");
        Ok(segment.project(&[]))
    }

    /// Fetch one segment, projected onto `fields` (all fields when empty)
    ///
    /// # Errors
    ///
    /// Returns `SegmentError::SegmentNotFound` if no segment has this id
    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id(), segment_id = %id))]
    pub async fn get(
        &self,
        ctx: &RequestContext,
        id: &SegmentId,
        fields: &[SegmentField],
    ) -> Result<SegmentView> {
        let segment = self.fetch(ctx, id).await?;
        Ok(segment.project(fields))
    }

    /// Overwrite the supplied attributes of a segment
    ///
    /// Attributes the update leaves unspecified keep their stored value. An
    /// update supplying no attribute writes nothing and returns the record.
    ///
    /// # Errors
    ///
    /// Returns `SegmentError::SegmentNotFound` if no segment has this id
    #[instrument(skip(self, ctx, update), fields(request_id = %ctx.request_id(), segment_id = %id))]
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &SegmentId,
        update: SegmentUpdate,
    ) -> Result<SegmentView> {
        let scope = self.begin_transaction(ctx).await?;

        let mut segment = self.fetch(ctx, id).await?;
        if update.is_empty() {
            debug!("Update supplies no attributes, nothing written");
        } else {
            segment.apply(update);
            self.store.update(ctx, &segment).await?;
        }

        scope.commit().await?;

        info!("Updated segment");
        Ok(segment.project(&[]))
    }

    /// List segments
    ///
    /// The marker is resolved first; a marker naming a missing record is
    /// treated as no marker. An empty result is not an error.
    #[instrument(
        skip(self, ctx, options),
        fields(request_id = %ctx.request_id(), limit = ?options.limit, marker = ?options.marker)
    )]
    pub async fn list(&self, ctx: &RequestContext, options: &ListOptions) -> Result<Vec<SegmentView>> {
        let limit = options.effective_limit();
        let marker = self
            .pagination
            .resolve_marker(ctx, SEGMENT_RESOURCE, limit, options.marker.as_ref())
            .await?;

        let query = CollectionQuery {
            filters: &options.filters,
            sorts: &options.sorts,
            limit,
            marker: marker.as_ref(),
            page_reverse: options.page_reverse,
        };

        let records = self.store.query_collection(ctx, &query).await?;
        debug!(count = records.len(), "Listed segments");

        Ok(records
            .iter()
            .map(|segment| segment.project(&options.fields))
            .collect())
    }

    /// Count segments matching `filters`; pagination plays no part
    #[instrument(skip(self, ctx, filters), fields(request_id = %ctx.request_id()))]
    pub async fn count(&self, ctx: &RequestContext, filters: &Filters) -> Result<usize> {
        self.store.query_count(ctx, filters).await
    }

    /// Delete a segment
    ///
    /// Deletes by filter and counts affected records; nothing is loaded first.
    ///
    /// # Errors
    ///
    /// Returns `SegmentError::SegmentNotFound` if nothing was deleted
    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id(), segment_id = %id))]
    pub async fn delete(&self, ctx: &RequestContext, id: &SegmentId) -> Result<()> {
        let scope = self.begin_transaction(ctx).await?;

        let deleted = self.store.delete_where(ctx, &Filters::by_id(*id)).await?;
        if deleted == 0 {
            return Err(SegmentError::not_found(*id));
        }

        scope.commit().await?;

        info!("Deleted segment");
        Ok(())
    }

    async fn fetch(&self, ctx: &RequestContext, id: &SegmentId) -> Result<Segment> {
        self.store
            .get_by_id(ctx, id)
            .await?
            .ok_or_else(|| SegmentError::not_found(*id))
    }
}
