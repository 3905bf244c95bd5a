//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::{Catalog, CatalogEntry};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use tower::ServiceExt;
use wholesaler::{WholesalerClient, WholesalerConfig};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn catalog() -> Catalog {
    Catalog::new(vec![
        CatalogEntry {
            id: 1,
            name: "Jacominus".into(),
            category: "Klassiker".into(),
            price: 14.0,
            ean: Some("9783314104704".into()),
        },
        CatalogEntry {
            id: 2,
            name: "Monster".into(),
            category: "Monstergeschichten".into(),
            price: 12.5,
            ean: None,
        },
    ])
}

/// In-memory store, sandboxed wholesaler pointed at an unroutable address,
/// unconfigured mailer. No test here touches the network.
fn setup() -> axum::Router {
    let wholesaler = WholesalerClient::new(WholesalerConfig {
        base_url: "http://127.0.0.1:1".into(),
        username: None,
        password: None,
        sandbox: true,
    })
    .expect("failed to build wholesaler client");

    let mailer = api::mail::Mailer::spawn(api::mail::MailConfig::default())
        .expect("failed to start mail worker");

    let state = Arc::new(api::AppState {
        store: InMemoryOrderStore::new(),
        wholesaler,
        catalog: catalog(),
        mailer,
        public_base_url: "http://localhost:3000".to_string(),
    });

    api::create_app(state, get_metrics_handle())
}

async fn send_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn sample_order(email: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "mol_kunde_id": 4711,
        "bestelldatum": "2026-08-20",
        "bestellreferenz": "WEB-1001",
        "email": email,
        "lieferadresse": {
            "vorname": "Erika",
            "nachname": "Muster",
            "strasse": "Lindenweg",
            "hausnummer": "5",
            "plz": "10115",
            "ort": "Berlin",
            "land_iso": "DE"
        },
        "auftrag_position": [
            {"ean": "9783314104704", "pos_bezeichnung": "Jacominus", "menge": "2", "ek_netto": "8,40", "vk_brutto": "14,00"}
        ],
        "auftrag_zusatz": [
            {"typ": "gutschein", "value": "SOMMER26"}
        ]
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_create_order_with_email_issues_cancel_token() {
    let app = setup();

    let (status, json) = send_json(
        &app,
        "POST",
        "/bestellung",
        Some(sample_order(Some("kunde@example.org"))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["bestellId"], 1);
    assert!(json["stornoToken"].as_str().is_some());
}

#[tokio::test]
async fn test_create_order_without_email_has_no_token() {
    let app = setup();

    let (status, json) = send_json(&app, "POST", "/bestellung", Some(sample_order(None))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["stornoToken"].is_null());
}

#[tokio::test]
async fn test_get_order_round_trip() {
    let app = setup();

    let (_, created) = send_json(&app, "POST", "/bestellung", Some(sample_order(None))).await;
    let id = created["bestellId"].as_i64().unwrap();

    let (status, json) = send_json(&app, "GET", &format!("/bestellung/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["bestellung"]["mol_kunde_id"], 4711);
    assert_eq!(json["bestellung"]["status"], "new");
    assert_eq!(json["positionen"][0]["menge"], 2);
    assert_eq!(json["positionen"][0]["ek_netto"], 8.4);
    assert_eq!(json["zusatz"][0]["typ"], "gutschein");
}

#[tokio::test]
async fn test_get_unknown_order_is_404() {
    let app = setup();
    let (status, _) = send_json(&app, "GET", "/bestellung/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_orders() {
    let app = setup();

    send_json(&app, "POST", "/bestellung", Some(sample_order(None))).await;
    send_json(&app, "POST", "/bestellung", Some(sample_order(None))).await;

    let (status, json) = send_json(&app, "GET", "/bestellungen", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let app = setup();

    let (_, created) = send_json(&app, "POST", "/bestellung", Some(sample_order(None))).await;
    let id = created["bestellId"].as_i64().unwrap();

    let (status, json) = send_json(&app, "DELETE", &format!("/bestellung/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (status, _) = send_json(&app, "DELETE", &format!("/bestellung/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(&app, "GET", &format!("/bestellung/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_update_and_invalid_transition() {
    let app = setup();

    let (_, created) = send_json(&app, "POST", "/bestellung", Some(sample_order(None))).await;
    let id = created["bestellId"].as_i64().unwrap();

    // new -> shipped skips processing and must be refused
    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/bestellung/{id}/status"),
        Some(serde_json::json!({"status": "shipped"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = send_json(
        &app,
        "POST",
        &format!("/bestellung/{id}/status"),
        Some(serde_json::json!({"status": "processing"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "processing");

    let (status, json) = send_json(
        &app,
        "POST",
        &format!("/bestellung/{id}/status"),
        Some(serde_json::json!({
            "status": "shipped",
            "tracking_nummer": "DHL-42",
            "versand_dienstleister": "DHL"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "shipped");
    assert_eq!(json["tracking_nummer"], "DHL-42");
    assert!(json["versand_datum"].as_str().is_some());
}

#[tokio::test]
async fn test_status_update_rejects_unknown_status() {
    let app = setup();

    let (_, created) = send_json(&app, "POST", "/bestellung", Some(sample_order(None))).await;
    let id = created["bestellId"].as_i64().unwrap();

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/bestellung/{id}/status"),
        Some(serde_json::json!({"status": "verschollen"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partial_update_keeps_status() {
    let app = setup();

    let (_, created) = send_json(&app, "POST", "/bestellung", Some(sample_order(None))).await;
    let id = created["bestellId"].as_i64().unwrap();

    let (status, json) = send_json(
        &app,
        "POST",
        &format!("/bestellung/{id}/status"),
        Some(serde_json::json!({"tracking_nummer": "DHL-7"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "new");
    assert_eq!(json["tracking_nummer"], "DHL-7");
}

#[tokio::test]
async fn test_sandbox_export_records_submission() {
    let app = setup();

    let (_, created) = send_json(&app, "POST", "/bestellung", Some(sample_order(None))).await;
    let id = created["bestellId"].as_i64().unwrap();

    let (status, json) = send_json(&app, "POST", &format!("/bestellung/{id}/export"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    let payload = &json["moluna_response"];
    assert_eq!(payload["auftrag_kopf"]["mol_kunde_id"], 4711);
    assert_eq!(payload["auftrag_position"][0]["menge"], 2);
    assert_eq!(payload["auftrag_zusatz"][0]["typ"], "collectkey");

    let (_, fetched) = send_json(&app, "GET", &format!("/bestellung/{id}"), None).await;
    assert_eq!(fetched["bestellung"]["uebermittlung_status"], "sandbox");
}

#[tokio::test]
async fn test_cancel_token_is_single_use() {
    let app = setup();

    let (_, created) = send_json(
        &app,
        "POST",
        "/bestellung",
        Some(sample_order(Some("kunde@example.org"))),
    )
    .await;
    let id = created["bestellId"].as_i64().unwrap();
    let token = created["stornoToken"].as_str().unwrap().to_string();

    let (status, json) = send_json(&app, "POST", &format!("/storno/{token}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["bestellId"], id);

    let (_, fetched) = send_json(&app, "GET", &format!("/bestellung/{id}"), None).await;
    assert_eq!(fetched["bestellung"]["status"], "cancelled");

    let (status, _) = send_json(&app, "POST", &format!("/storno/{token}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_refused_cancel_keeps_token_redeemable() {
    let app = setup();

    let (_, created) = send_json(
        &app,
        "POST",
        "/bestellung",
        Some(sample_order(Some("kunde@example.org"))),
    )
    .await;
    let id = created["bestellId"].as_i64().unwrap();
    let token = created["stornoToken"].as_str().unwrap().to_string();

    for status in ["processing", "shipped"] {
        send_json(
            &app,
            "POST",
            &format!("/bestellung/{id}/status"),
            Some(serde_json::json!({"status": status})),
        )
        .await;
    }

    let (status, json) = send_json(&app, "POST", &format!("/storno/{token}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("transition"));

    // The refused attempt must not consume the token: the retry reports
    // the same transition conflict, not "already used".
    let (status, json) = send_json(&app, "POST", &format!("/storno/{token}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("transition"));

    let (_, fetched) = send_json(&app, "GET", &format!("/bestellung/{id}"), None).await;
    assert_eq!(fetched["bestellung"]["status"], "shipped");
}

#[tokio::test]
async fn test_unknown_cancel_token_is_404() {
    let app = setup();
    let (status, _) = send_json(&app, "POST", "/storno/kein-echter-token", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_list() {
    let app = setup();

    let (status, json) = send_json(&app, "GET", "/produkte", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[0]["name"], "Jacominus");
}

#[tokio::test]
async fn test_product_detail_fills_placeholders_when_unenriched() {
    let app = setup();

    let (status, json) = send_json(&app, "GET", "/produkte/1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Jacominus");
    assert_eq!(json["preis"], 14.0);
    assert_eq!(json["bestand"], "n/a");
    assert_eq!(json["handling_zeit"], "n/a");
    assert_eq!(json["erfuellungsrate"], "n/a");
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let app = setup();
    let (status, _) = send_json(&app, "GET", "/produkte/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_newsletter_requires_email() {
    let app = setup();

    let (status, _) = send_json(&app, "POST", "/newsletter", Some(serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send_json(
        &app,
        "POST",
        "/newsletter",
        Some(serde_json::json!({"email": "kunde@example.org"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
}

#[tokio::test]
async fn test_contact_requires_email_and_message() {
    let app = setup();

    let (status, _) = send_json(
        &app,
        "POST",
        "/kontakt",
        Some(serde_json::json!({"email": "kunde@example.org"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send_json(
        &app,
        "POST",
        "/kontakt",
        Some(serde_json::json!({
            "name": "Erika",
            "email": "kunde@example.org",
            "nachricht": "Wann kommt Band 2?"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_renders() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
