// Integration tests for `DisplayClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kiosk_api::display::models::MODULE_HOURLY;
use kiosk_api::{DisplayClient, Error, KioskRoute, TransportConfig};

const ORG: &str = "0b22a7d7-08f6-4ae8-804c-7b58c0def7c5";
const PARKING: &str = "36201249-9e37-4888-887f-d3ebb30d8d38";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DisplayClient) {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let key = SecretString::from("test-key".to_owned());
    let client = DisplayClient::new(base, &key, &TransportConfig::default()).unwrap();
    (server, client)
}

fn kiosk_route() -> KioskRoute {
    KioskRoute::new(ORG, PARKING, Some("127".into()))
}

fn display_path(kiosk: Option<&str>) -> String {
    match kiosk {
        Some(k) => format!("/api/v1/organization/{ORG}/parkings/{PARKING}/kiosks/{k}/display"),
        None => format!("/api/v1/organization/{ORG}/parkings/{PARKING}/display"),
    }
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_display_sends_headers_and_decodes() {
    let (server, client) = setup().await;

    let body = json!({
        "config": { "elements": [] },
        "occupancy": 63,
        "pricePackages": [{
            "data": {
                "modules": [{
                    "type": MODULE_HOURLY,
                    "data": {
                        "Maximums": [{ "Id": 1, "Minutes": 30, "PricingType": "STATIC", "Pricing": 12.5 }],
                        "Units": []
                    }
                }]
            }
        }]
    });

    Mock::given(method("GET"))
        .and(path(display_path(Some("127"))))
        .and(header("x-api-key", "test-key"))
        .and(header("cache-control", "no-store"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let display = client.fetch_display(&kiosk_route()).await.unwrap();

    assert_eq!(display.occupancy, Some(63.0));
    assert_eq!(display.price_packages.len(), 1);
    assert_eq!(display.price_packages[0].data.modules[0].kind, MODULE_HOURLY);
    assert!(display.config.is_some());
}

#[tokio::test]
async fn test_fetch_display_without_kiosk_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(display_path(None)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let route = KioskRoute::new(ORG, PARKING, None);
    let display = client.fetch_display(&route).await.unwrap();

    assert!(display.price_packages.is_empty());
    assert!(display.occupancy.is_none());
}

#[test]
fn test_display_url_keeps_base_path() {
    let base = Url::parse("https://api.example.com/backend/").unwrap();
    let client = DisplayClient::with_client(reqwest::Client::new(), base);

    let url = client
        .display_url(&KioskRoute::new("org", "park", Some(String::new())))
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.example.com/backend/api/v1/organization/org/parkings/park/display"
    );

    let url = client
        .display_url(&KioskRoute::new("org", "park", Some("a b".into())))
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.example.com/backend/api/v1/organization/org/parkings/park/kiosks/a%20b/display"
    );
}

// ── Error classification ────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(display_path(Some("127"))))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.fetch_display(&kiosk_route()).await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "expected auth failure, got {err:?}");
}

#[tokio::test]
async fn test_server_error_is_transient_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(display_path(Some("127"))))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.fetch_display(&kiosk_route()).await.unwrap_err();
    match &err {
        Error::Api { status, message } => {
            assert_eq!(*status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_not_found_uses_canonical_reason() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(display_path(Some("127"))))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.fetch_display(&kiosk_route()).await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_keeps_raw_text() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(display_path(Some("127"))))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.fetch_display(&kiosk_route()).await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got {other:?}"),
    }
}
