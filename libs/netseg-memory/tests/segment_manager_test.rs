//! Integration tests for the segment manager over the in-memory store
//!
//! These tests verify that:
//! 1. Created segments round-trip through get, update and delete
//! 2. Field projection returns exactly the requested fields
//! 3. Paginated listing visits every record once, in both directions
//! 4. Manager operations join a transaction the caller already holds
//! 5. Store constraints surface unchanged through the manager

use std::collections::HashSet;

use netseg_domain::segment::{
    Attr, FieldValue, Filters, ListOptions, NetworkId, SegmentField, SegmentSpec, SegmentUpdate,
    SortKey,
};
use netseg_domain::{RequestContext, SegmentError, SegmentId, SegmentManager, SegmentView};
use netseg_memory::InMemorySegmentStore;
use uuid::Uuid;

type Manager = SegmentManager<InMemorySegmentStore, InMemorySegmentStore>;

fn manager() -> Manager {
    let store = InMemorySegmentStore::new();
    SegmentManager::with_store(store.clone(), store)
}

fn network(n: u128) -> NetworkId {
    NetworkId::from_uuid(Uuid::from_u128(n))
}

fn ids(views: &[SegmentView]) -> Vec<SegmentId> {
    views.iter().filter_map(SegmentView::id).collect()
}

async fn seed(manager: &Manager, ctx: &RequestContext, count: u32) -> Vec<SegmentView> {
    let mut created = Vec::new();
    for n in 0..count {
        let spec = SegmentSpec::new(network(u128::from(n % 2)), "vlan").with_segmentation_id(100 + n);
        created.push(manager.create(ctx, spec).await.expect("create should succeed"));
    }
    created
}

/// Create, update, delete, then get fails with the record's id
#[tokio::test]
async fn test_segment_lifecycle() {
    let manager = manager();
    let ctx = RequestContext::new();
    let net1 = network(1);

    let created = manager
        .create(&ctx, SegmentSpec::new(net1, "vlan").with_segmentation_id(100))
        .await
        .unwrap();
    let id = created.id().expect("view should carry an id");

    assert_eq!(created.len(), 5);
    assert_eq!(created.get(SegmentField::NetworkId), Some(&FieldValue::from(net1)));
    assert_eq!(created.get(SegmentField::PhysicalNetwork), Some(&FieldValue::Null));
    assert_eq!(created.get(SegmentField::NetworkType), Some(&FieldValue::from("vlan")));
    assert_eq!(created.get(SegmentField::SegmentationId), Some(&FieldValue::Int(100)));

    let update = SegmentUpdate {
        segmentation_id: Attr::Value(200),
        ..SegmentUpdate::default()
    };
    let updated = manager.update(&ctx, &id, update).await.unwrap();
    assert_eq!(updated.get(SegmentField::SegmentationId), Some(&FieldValue::Int(200)));
    assert_eq!(updated.get(SegmentField::NetworkType), Some(&FieldValue::from("vlan")));

    manager.delete(&ctx, &id).await.unwrap();

    let err = manager.get(&ctx, &id, &[]).await.unwrap_err();
    assert_eq!(err, SegmentError::SegmentNotFound { segment_id: id });
}

#[tokio::test]
async fn test_get_round_trips_create() {
    let manager = manager();
    let ctx = RequestContext::new();

    let spec = SegmentSpec::new(network(1), "flat").with_physical_network("physnet1");
    let created = manager.create(&ctx, spec).await.unwrap();
    let id = created.id().unwrap();

    assert_eq!(manager.get(&ctx, &id, &[]).await.unwrap(), created);
}

#[tokio::test]
async fn test_caller_supplied_id_is_kept() {
    let manager = manager();
    let ctx = RequestContext::new();
    let id = SegmentId::from_uuid(Uuid::from_u128(42));

    let created = manager
        .create(&ctx, SegmentSpec::new(network(1), "vlan").with_id(id))
        .await
        .unwrap();

    assert_eq!(created.id(), Some(id));
}

#[tokio::test]
async fn test_generated_ids_are_unique() {
    let manager = manager();
    let ctx = RequestContext::new();

    let created = seed(&manager, &ctx, 20).await;
    let unique: HashSet<SegmentId> = ids(&created).into_iter().collect();

    assert_eq!(unique.len(), 20);
}

#[tokio::test]
async fn test_get_projects_requested_fields() {
    let manager = manager();
    let ctx = RequestContext::new();
    let id = seed(&manager, &ctx, 1).await[0].id().unwrap();

    let view = manager.get(&ctx, &id, &[SegmentField::NetworkType]).await.unwrap();

    assert_eq!(view.fields().collect::<Vec<_>>(), vec![SegmentField::NetworkType]);
}

#[tokio::test]
async fn test_update_changes_only_supplied_fields() {
    let manager = manager();
    let ctx = RequestContext::new();
    let spec = SegmentSpec::new(network(1), "vlan")
        .with_physical_network("physnet1")
        .with_segmentation_id(7);
    let before = manager.create(&ctx, spec).await.unwrap();
    let id = before.id().unwrap();

    let update = SegmentUpdate {
        network_type: Some("vxlan".to_string()),
        ..SegmentUpdate::default()
    };
    let after = manager.update(&ctx, &id, update).await.unwrap();

    for field in SegmentField::ALL {
        if field == SegmentField::NetworkType {
            assert_eq!(after.get(field), Some(&FieldValue::from("vxlan")));
        } else {
            assert_eq!(after.get(field), before.get(field), "{field} should be unchanged");
        }
    }
}

#[tokio::test]
async fn test_update_can_clear_nullable_field() {
    let manager = manager();
    let ctx = RequestContext::new();
    let id = seed(&manager, &ctx, 1).await[0].id().unwrap();

    let update = SegmentUpdate {
        segmentation_id: Attr::Null,
        ..SegmentUpdate::default()
    };
    let view = manager.update(&ctx, &id, update).await.unwrap();

    assert_eq!(view.get(SegmentField::SegmentationId), Some(&FieldValue::Null));
}

#[tokio::test]
async fn test_delete_missing_segment_mutates_nothing() {
    let store = InMemorySegmentStore::new();
    let manager = SegmentManager::with_store(store.clone(), store.clone());
    let ctx = RequestContext::new();
    seed(&manager, &ctx, 3).await;

    let missing = SegmentId::from_uuid(Uuid::from_u128(7));
    let err = manager.delete(&ctx, &missing).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(store.len(), 3);
    assert_eq!(store.transaction_depth(ctx.session()), 0);
}

#[tokio::test]
async fn test_count_matches_unpaginated_list() {
    let manager = manager();
    let ctx = RequestContext::new();
    seed(&manager, &ctx, 5).await;

    for filters in [
        Filters::new(),
        Filters::new().with(SegmentField::NetworkId, [network(1)]),
        Filters::new().with(SegmentField::NetworkType, ["vxlan"]),
    ] {
        let listed = manager
            .list(&ctx, &ListOptions::new().with_filters(filters.clone()))
            .await
            .unwrap();
        assert_eq!(manager.count(&ctx, &filters).await.unwrap(), listed.len());
    }
}

#[tokio::test]
async fn test_filter_with_no_accepted_values_matches_nothing() {
    let manager = manager();
    let ctx = RequestContext::new();
    seed(&manager, &ctx, 2).await;

    let filters = Filters::new().with(SegmentField::NetworkType, Vec::<String>::new());

    assert_eq!(manager.count(&ctx, &filters).await.unwrap(), 0);
}

/// Walking forward page by page visits every record exactly once
#[tokio::test]
async fn test_pagination_covers_collection_without_overlap() {
    let manager = manager();
    let ctx = RequestContext::new();
    seed(&manager, &ctx, 7).await;

    let filters = Filters::new().with(SegmentField::NetworkType, ["vlan"]);
    let full = ids(&manager
        .list(&ctx, &ListOptions::new().with_filters(filters.clone()))
        .await
        .unwrap());

    let mut walked = Vec::new();
    let mut marker = None;
    loop {
        let mut options = ListOptions::new().with_filters(filters.clone()).with_limit(2);
        if let Some(marker) = marker {
            options = options.with_marker(marker);
        }
        let page = ids(&manager.list(&ctx, &options).await.unwrap());
        if page.is_empty() {
            break;
        }
        assert!(page.len() <= 2);
        marker = page.last().copied();
        walked.extend(page);
    }

    assert_eq!(walked, full);
}

#[tokio::test]
async fn test_reverse_page_returns_records_before_marker() {
    let manager = manager();
    let ctx = RequestContext::new();
    seed(&manager, &ctx, 5).await;

    let sort = SortKey::asc(SegmentField::SegmentationId);
    let full = manager.list(&ctx, &ListOptions::new().sorted_by(sort)).await.unwrap();
    let marker = full[3].id().unwrap();

    let options = ListOptions::new()
        .sorted_by(sort)
        .with_limit(2)
        .with_marker(marker)
        .reversed();
    let page = manager.list(&ctx, &options).await.unwrap();

    assert_eq!(ids(&page), ids(&full[1..3]));
}

#[tokio::test]
async fn test_sort_descending_with_projection() {
    let manager = manager();
    let ctx = RequestContext::new();
    seed(&manager, &ctx, 3).await;

    let options = ListOptions::new()
        .sorted_by(SortKey::desc(SegmentField::SegmentationId))
        .with_fields([SegmentField::SegmentationId]);
    let views = manager.list(&ctx, &options).await.unwrap();

    let values: Vec<Option<i64>> = views
        .iter()
        .map(|view| view.get(SegmentField::SegmentationId).and_then(FieldValue::as_i64))
        .collect();
    assert_eq!(values, vec![Some(102), Some(101), Some(100)]);
    assert!(views.iter().all(|view| view.len() == 1));
}

#[tokio::test]
async fn test_unknown_marker_lists_from_start() {
    let manager = manager();
    let ctx = RequestContext::new();
    seed(&manager, &ctx, 3).await;

    let options = ListOptions::new()
        .with_limit(10)
        .with_marker(SegmentId::from_uuid(Uuid::from_u128(999)));

    assert_eq!(manager.list(&ctx, &options).await.unwrap().len(), 3);
}

/// Operations issued under a caller transaction commit or roll back with it
#[tokio::test]
async fn test_operations_join_caller_transaction() {
    let store = InMemorySegmentStore::new();
    let manager = SegmentManager::with_store(store.clone(), store.clone());
    let ctx = RequestContext::new();
    let other = RequestContext::new();

    let scope = manager.begin_transaction(&ctx).await.unwrap();
    let created = manager
        .create(&ctx, SegmentSpec::new(network(1), "vlan"))
        .await
        .unwrap();
    let id = created.id().unwrap();

    // Visible to the owning session only
    assert!(manager.get(&ctx, &id, &[]).await.is_ok());
    assert!(manager.get(&other, &id, &[]).await.unwrap_err().is_not_found());
    assert_eq!(store.transaction_depth(ctx.session()), 1);

    scope.commit().await.unwrap();

    assert!(manager.get(&other, &id, &[]).await.is_ok());
}

#[tokio::test]
async fn test_outer_rollback_discards_inner_creates() {
    let store = InMemorySegmentStore::new();
    let manager = SegmentManager::with_store(store.clone(), store.clone());
    let ctx = RequestContext::new();

    {
        let _scope = manager.begin_transaction(&ctx).await.unwrap();
        seed(&manager, &ctx, 3).await;
        assert_eq!(manager.count(&ctx, &Filters::new()).await.unwrap(), 3);
    }

    assert!(store.is_empty());
    assert_eq!(store.transaction_depth(ctx.session()), 0);
}

#[tokio::test]
async fn test_failed_delete_inside_caller_transaction_keeps_earlier_writes() {
    let store = InMemorySegmentStore::new();
    let manager = SegmentManager::with_store(store.clone(), store.clone());
    let ctx = RequestContext::new();

    let scope = manager.begin_transaction(&ctx).await.unwrap();
    seed(&manager, &ctx, 2).await;

    let missing = SegmentId::from_uuid(Uuid::from_u128(5));
    assert!(manager.delete(&ctx, &missing).await.is_err());

    scope.commit().await.unwrap();
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_duplicate_id_is_rejected() {
    let manager = manager();
    let ctx = RequestContext::new();
    let id = SegmentId::from_uuid(Uuid::from_u128(1));
    let spec = SegmentSpec::new(network(1), "vlan").with_id(id);

    manager.create(&ctx, spec.clone()).await.unwrap();
    let err = manager.create(&ctx, spec).await.unwrap_err();

    assert!(matches!(err, SegmentError::SegmentAlreadyExists(_)));
}

#[tokio::test]
async fn test_unknown_network_is_rejected() {
    let store = InMemorySegmentStore::with_networks([network(1)]);
    let manager = SegmentManager::with_store(store.clone(), store.clone());
    let ctx = RequestContext::new();

    let err = manager
        .create(&ctx, SegmentSpec::new(network(2), "vlan"))
        .await
        .unwrap_err();

    assert!(matches!(err, SegmentError::NetworkNotFound(_)));
    assert!(store.is_empty());
}
