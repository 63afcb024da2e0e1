//! Tests for the REST storefront client against a mock HTTP server:
//! query-parameter mapping, payload parsing, and the error taxonomy for
//! rate limits, auth failures, and upstream errors.

mod test_utils;

use chrono::{TimeZone, Utc};
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ordersync::storefront::{
    OrderFilters, RestStorefrontClient, StorefrontClient, StorefrontError,
};

use test_utils::{seed_connection, seed_tenant, setup_db};

async fn client_and_connection(
    server: &MockServer,
) -> (RestStorefrontClient, ordersync::models::connection::Model) {
    let db = setup_db().await;
    let tenant = seed_tenant(&db, "T").await;
    let connection = seed_connection(&db, tenant).await;

    let client = RestStorefrontClient::new("2024-07")
        .with_api_base(Url::parse(&server.uri()).unwrap());

    (client, connection)
}

#[tokio::test]
async fn fetch_orders_maps_filters_to_query_parameters() {
    let server = MockServer::start().await;
    let (client, connection) = client_and_connection(&server).await;

    let created_min = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    Mock::given(method("GET"))
        .and(path("/admin/api/2024-07/orders.json"))
        .and(query_param("status", "any"))
        .and(query_param("created_at_min", created_min.to_rfc3339().as_str()))
        .and(query_param("limit", "250"))
        .and(header("X-Storefront-Access-Token", "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "orders": [
                {
                    "id": 9001,
                    "financial_status": "pending",
                    "total_price": "500.00",
                    "line_items": [{"name": "Widget", "quantity": 2, "price": "250.00"}]
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filters = OrderFilters {
        status: Some("any".to_string()),
        created_at_min: Some(created_min),
        created_at_max: None,
        limit: Some(250),
    };

    let orders = client.fetch_orders(&connection, &filters).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].external_id(), Some("9001"));
    assert_eq!(orders[0].financial_status.as_deref(), Some("pending"));
    assert_eq!(orders[0].line_items.len(), 1);
    assert_eq!(orders[0].line_items[0].quantity, 2);
}

#[tokio::test]
async fn empty_envelope_yields_an_empty_page() {
    let server = MockServer::start().await;
    let (client, connection) = client_and_connection(&server).await;

    Mock::given(method("GET"))
        .and(path("/admin/api/2024-07/orders.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let orders = client
        .fetch_orders(&connection, &OrderFilters::default())
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn rate_limit_carries_the_retry_after_hint() {
    let server = MockServer::start().await;
    let (client, connection) = client_and_connection(&server).await;

    Mock::given(method("GET"))
        .and(path("/admin/api/2024-07/orders.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let err = client
        .fetch_orders(&connection, &OrderFilters::default())
        .await
        .expect_err("rate limited");

    match err {
        StorefrontError::RateLimited { retry_after_secs } => {
            assert_eq!(retry_after_secs, Some(30));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn unauthorized_is_permanent() {
    let server = MockServer::start().await;
    let (client, connection) = client_and_connection(&server).await;

    Mock::given(method("GET"))
        .and(path("/admin/api/2024-07/orders.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client
        .fetch_orders(&connection, &OrderFilters::default())
        .await
        .expect_err("unauthorized");

    assert!(matches!(err, StorefrontError::Unauthorized { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn upstream_5xx_is_retryable_and_4xx_is_not() {
    let server = MockServer::start().await;
    let (client, connection) = client_and_connection(&server).await;

    Mock::given(method("GET"))
        .and(path("/admin/api/2024-07/orders.json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client
        .fetch_orders(&connection, &OrderFilters::default())
        .await
        .expect_err("server error");
    match &err {
        StorefrontError::Http { status, .. } => assert_eq!(*status, 503),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_retryable());

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/admin/api/2024-07/orders.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client
        .fetch_orders(&connection, &OrderFilters::default())
        .await
        .expect_err("not found");
    assert!(matches!(err, StorefrontError::Http { status: 404, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn malformed_body_is_reported_as_malformed() {
    let server = MockServer::start().await;
    let (client, connection) = client_and_connection(&server).await;

    Mock::given(method("GET"))
        .and(path("/admin/api/2024-07/orders.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let err = client
        .fetch_orders(&connection, &OrderFilters::default())
        .await
        .expect_err("malformed body");

    assert!(matches!(err, StorefrontError::Malformed { .. }));
}
