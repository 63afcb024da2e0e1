//! Integration tests for the order materializer: the full entity graph on
//! create, the restricted update path on re-sync, and the failure
//! semantics around missing configuration and dedup races.

mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use ordersync::models::{address, customer, order, order_item, package, shipment};
use ordersync::storefront::ExternalOrder;
use ordersync::storefront::types::NoteAttribute;
use ordersync::sync::{MaterializeAction, MaterializeError, OrderMaterializer};
use rust_decimal::Decimal;

use test_utils::{sample_order, seed_hub, seed_tenant, setup_db};

fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

fn materializer(db: &sea_orm::DatabaseConnection) -> OrderMaterializer {
    OrderMaterializer::new(Arc::new(db.clone()), Duration::from_secs(30))
}

#[tokio::test]
async fn end_to_end_pending_order_materializes_the_full_graph() {
    let db = setup_db().await;
    let tenant_id = seed_tenant(&db, "Acme Traders").await;
    seed_hub(&db, tenant_id, true).await;

    let external = sample_order(9001);
    let outcome = materializer(&db)
        .materialize(&external, tenant_id, "acme.example-store.com")
        .await
        .expect("materialization succeeds");

    assert_eq!(outcome.action, MaterializeAction::Created);
    let order_id = outcome.order_id.expect("order id present");

    let order_row = order::Entity::find_by_id(order_id)
        .one(&db)
        .await
        .unwrap()
        .expect("order exists");
    assert_eq!(order_row.payment_method, "COD");
    assert_eq!(order_row.total_amount, dec("500.00"));
    assert_eq!(order_row.amount_to_collect, dec("500.00"));
    assert_eq!(order_row.channel, "storefront");
    assert_eq!(order_row.channel_order_id, "9001");
    assert!(order_row.applicable_weight > 0.0);

    // One package with the weight rule applied
    let package_row = package::Entity::find_by_id(order_row.package_id)
        .one(&db)
        .await
        .unwrap()
        .expect("package exists");
    assert_eq!(package_row.actual_weight, 0.4);
    assert_eq!(
        order_row.applicable_weight,
        package_row.actual_weight.max(package_row.volumetric_weight)
    );

    // One shipment in NEW with a single tracking event
    let shipments = shipment::Entity::find()
        .filter(shipment::Column::OrderId.eq(order_id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(shipments.len(), 1);
    assert_eq!(shipments[0].status, "NEW");
    let events = shipments[0].tracking_events.as_ref().expect("events");
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["description"], "Order Created");

    // One item with two units
    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].units, 2);
    assert_eq!(items[0].name, "Widget");
    assert_eq!(items[0].hsn_code, "0");

    // Customer with normalized phone plus exactly one address
    let customers = customer::Entity::find().all(&db).await.unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].phone.as_deref(), Some("9876543210"));

    let addresses = address::Entity::find()
        .filter(address::Column::CustomerId.eq(customers[0].id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0].pincode, "400050");
}

#[tokio::test]
async fn repeated_materialization_is_idempotent() {
    let db = setup_db().await;
    let tenant_id = seed_tenant(&db, "Acme Traders").await;
    seed_hub(&db, tenant_id, true).await;
    let m = materializer(&db);

    let external = sample_order(9001);
    let first = m
        .materialize(&external, tenant_id, "acme.example-store.com")
        .await
        .unwrap();
    let second = m
        .materialize(&external, tenant_id, "acme.example-store.com")
        .await
        .unwrap();

    assert_eq!(first.action, MaterializeAction::Created);
    assert_eq!(second.action, MaterializeAction::Updated);
    assert_eq!(first.order_id, second.order_id);

    let count = order::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn update_path_recomputes_payment_and_leaves_items_alone() {
    let db = setup_db().await;
    let tenant_id = seed_tenant(&db, "Acme Traders").await;
    seed_hub(&db, tenant_id, true).await;
    let m = materializer(&db);

    let mut external = sample_order(9001);
    let created = m
        .materialize(&external, tenant_id, "acme.example-store.com")
        .await
        .unwrap();
    let order_id = created.order_id.unwrap();

    // The buyer pays; the storefront reports paid with a new total and a
    // changed line item the update path must NOT reconcile.
    external.financial_status = Some("paid".to_string());
    external.total_price = Some("550.00".to_string());
    external.total_outstanding = Some("0.00".to_string());
    external.line_items[0].quantity = 7;

    let updated = m
        .materialize(&external, tenant_id, "acme.example-store.com")
        .await
        .unwrap();
    assert_eq!(updated.action, MaterializeAction::Updated);

    let order_row = order::Entity::find_by_id(order_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order_row.payment_method, "PREPAID");
    assert_eq!(order_row.total_amount, dec("550.00"));
    assert_eq!(order_row.amount_to_collect, Decimal::ZERO);

    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].units, 2, "line items are not reconciled on update");
}

#[tokio::test]
async fn missing_primary_hub_is_fatal_and_leaves_no_partial_rows() {
    let db = setup_db().await;
    let tenant_id = seed_tenant(&db, "Acme Traders").await;
    // Only a non-primary hub exists
    seed_hub(&db, tenant_id, false).await;

    let err = materializer(&db)
        .materialize(&sample_order(9001), tenant_id, "acme.example-store.com")
        .await
        .expect_err("materialization must fail");

    assert!(matches!(err, MaterializeError::MissingHub));
    assert!(!err.is_retryable());

    assert_eq!(order::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(customer::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(package::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn payload_without_id_is_rejected() {
    let db = setup_db().await;
    let tenant_id = seed_tenant(&db, "Acme Traders").await;
    seed_hub(&db, tenant_id, true).await;

    let err = materializer(&db)
        .materialize(&ExternalOrder::default(), tenant_id, "acme.example-store.com")
        .await
        .expect_err("payload without id must fail");

    assert!(matches!(err, MaterializeError::MissingExternalId));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn address_falls_back_to_note_attributes() {
    let db = setup_db().await;
    let tenant_id = seed_tenant(&db, "Acme Traders").await;
    seed_hub(&db, tenant_id, true).await;

    let mut external = sample_order(9002);
    external.shipping_address = None;
    external.note_attributes = vec![
        NoteAttribute {
            name: "Address".to_string(),
            value: Some("7 Lake View".to_string()),
        },
        NoteAttribute {
            name: "City".to_string(),
            value: Some("Pune".to_string()),
        },
    ];

    materializer(&db)
        .materialize(&external, tenant_id, "acme.example-store.com")
        .await
        .unwrap();

    let addresses = address::Entity::find().all(&db).await.unwrap();
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0].line1, "7 Lake View");
    assert_eq!(addresses[0].city, "Pune");
    // No zip anywhere resolves to the sentinel
    assert_eq!(addresses[0].pincode, "000000");
}

#[tokio::test]
async fn customers_are_shared_across_orders_by_phone() {
    let db = setup_db().await;
    let tenant_id = seed_tenant(&db, "Acme Traders").await;
    seed_hub(&db, tenant_id, true).await;
    let m = materializer(&db);

    m.materialize(&sample_order(9001), tenant_id, "acme.example-store.com")
        .await
        .unwrap();
    m.materialize(&sample_order(9002), tenant_id, "acme.example-store.com")
        .await
        .unwrap();

    assert_eq!(order::Entity::find().count(&db).await.unwrap(), 2);
    assert_eq!(customer::Entity::find().count(&db).await.unwrap(), 1);
    assert_eq!(address::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_materialization_of_one_id_yields_one_order() {
    let db = setup_db().await;
    let tenant_id = seed_tenant(&db, "Acme Traders").await;
    seed_hub(&db, tenant_id, true).await;

    let m = Arc::new(materializer(&db));
    let external = sample_order(9001);

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..2 {
        let m = m.clone();
        let external = external.clone();
        tasks.spawn(async move {
            m.materialize(&external, tenant_id, "acme.example-store.com")
                .await
        });
    }

    let mut created = 0;
    while let Some(result) = tasks.join_next().await {
        let outcome = result.unwrap().expect("no attempt may crash");
        if outcome.action == MaterializeAction::Created {
            created += 1;
        }
    }

    assert_eq!(created, 1, "exactly one attempt creates the order");
    assert_eq!(order::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn tenants_do_not_share_dedup_keys() {
    let db = setup_db().await;
    let tenant_a = seed_tenant(&db, "Tenant A").await;
    let tenant_b = seed_tenant(&db, "Tenant B").await;
    seed_hub(&db, tenant_a, true).await;
    seed_hub(&db, tenant_b, true).await;
    let m = materializer(&db);

    let external = sample_order(9001);
    let a = m
        .materialize(&external, tenant_a, "a.example-store.com")
        .await
        .unwrap();
    let b = m
        .materialize(&external, tenant_b, "b.example-store.com")
        .await
        .unwrap();

    assert_eq!(a.action, MaterializeAction::Created);
    assert_eq!(b.action, MaterializeAction::Created);
    assert_eq!(order::Entity::find().count(&db).await.unwrap(), 2);
}

#[tokio::test]
async fn zero_transaction_budget_times_out_as_retryable() {
    let db = setup_db().await;
    let tenant_id = seed_tenant(&db, "Acme Traders").await;
    seed_hub(&db, tenant_id, true).await;

    let m = OrderMaterializer::new(Arc::new(db.clone()), Duration::from_secs(0));
    let err = m
        .materialize(&sample_order(9001), tenant_id, "acme.example-store.com")
        .await
        .expect_err("zero budget must time out");

    assert!(matches!(err, MaterializeError::Timeout { .. }));
    assert!(err.is_retryable());
    assert_eq!(order::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_financial_status_is_cod_with_zero_collection() {
    let db = setup_db().await;
    let tenant_id = seed_tenant(&db, "Acme Traders").await;
    seed_hub(&db, tenant_id, true).await;

    let mut external = sample_order(9003);
    external.financial_status = Some("voided".to_string());

    let outcome = materializer(&db)
        .materialize(&external, tenant_id, "acme.example-store.com")
        .await
        .unwrap();

    let order_row = order::Entity::find_by_id(outcome.order_id.unwrap())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order_row.payment_method, "COD");
    assert_eq!(order_row.amount_to_collect, Decimal::ZERO);
}

#[tokio::test]
async fn seller_snapshot_is_not_rewritten_on_update() {
    let db = setup_db().await;
    let tenant_id = seed_tenant(&db, "Acme Traders").await;
    seed_hub(&db, tenant_id, true).await;
    let m = materializer(&db);

    let external = sample_order(9001);
    let created = m
        .materialize(&external, tenant_id, "acme.example-store.com")
        .await
        .unwrap();
    let order_row = order::Entity::find_by_id(created.order_id.unwrap())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let snapshot_id: Uuid = order_row.seller_details_id;

    m.materialize(&external, tenant_id, "acme.example-store.com")
        .await
        .unwrap();

    let after = order::Entity::find_by_id(order_row.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.seller_details_id, snapshot_id);
}
