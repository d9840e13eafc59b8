//! Integration tests against a local fake backend.
//!
//! Every configured integration is pointed at an axum server on an ephemeral
//! port that echoes what it received, so the tests check exactly what would
//! go over the wire: verb, rendered path, query, body and auth headers.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use secrecy::SecretString;
use serde_json::{Value, json};
use switchboard_integrations::*;

// ─────────────────────────────────────────────────────────────────────────────
// Fake backend
// ─────────────────────────────────────────────────────────────────────────────

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let path = uri.path().to_string();

    if path.ends_with("/missing") {
        return (StatusCode::NOT_FOUND, axum::Json(json!({"error": "Campaign not found"})))
            .into_response();
    }
    if path == "/emails/unread/count" {
        return (StatusCode::BAD_GATEWAY, "upstream down").into_response();
    }
    if path.ends_with("/activate") {
        return StatusCode::OK.into_response();
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| Value::String(s.to_string()))
            .unwrap_or(Value::Null)
    };
    let body: Value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };

    axum::Json(json!({
        "method": method.as_str(),
        "path": path,
        "query": uri.query(),
        "body": body,
        "authorization": header("authorization"),
        "apiKey": header("x-api-key"),
    }))
    .into_response()
}

async fn start_backend() -> String {
    let app = Router::new().fallback(echo);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

fn find<'a>(integration: &'a dyn Integration, name: &str) -> &'a Operation {
    integration
        .operations()
        .iter()
        .find(|op| op.name() == name)
        .unwrap_or_else(|| panic!("no operation {name}"))
}

const TIMEOUT: Duration = Duration::from_secs(5);

// ─────────────────────────────────────────────────────────────────────────────
// Instantly
// ─────────────────────────────────────────────────────────────────────────────

mod instantly {
    use super::*;
    use switchboard_integrations::instantly::Instantly;

    async fn integration() -> Instantly {
        let url = start_backend().await;
        Instantly::new(&InstantlyConfig::new(secret("inst-key")).with_base_url(url), TIMEOUT).unwrap()
    }

    #[tokio::test]
    async fn get_renders_path_and_sends_bearer() {
        let i = integration().await;
        let out = find(&i, "instantly_get_campaign")
            .invoke(json!({"id": "c-1"}))
            .await
            .unwrap();
        assert_eq!(out["method"], "GET");
        assert_eq!(out["path"], "/campaigns/c-1");
        assert_eq!(out["query"], Value::Null);
        assert_eq!(out["authorization"], "Bearer inst-key");
    }

    #[tokio::test]
    async fn list_sends_remaining_args_as_query() {
        let i = integration().await;
        let out = find(&i, "instantly_list_campaigns")
            .invoke(json!({"limit": 5, "starting_after": "abc"}))
            .await
            .unwrap();
        let query = out["query"].as_str().unwrap();
        assert!(query.contains("limit=5"));
        assert!(query.contains("starting_after=abc"));
    }

    #[tokio::test]
    async fn patch_sends_body_without_path_fields() {
        let i = integration().await;
        let out = find(&i, "instantly_update_campaign")
            .invoke(json!({"id": "c-9", "name": "Renamed"}))
            .await
            .unwrap();
        assert_eq!(out["method"], "PATCH");
        assert_eq!(out["path"], "/campaigns/c-9");
        assert_eq!(out["body"], json!({"name": "Renamed"}));
    }

    #[tokio::test]
    async fn delete_leads_carries_a_body() {
        let i = integration().await;
        let out = find(&i, "instantly_delete_leads")
            .invoke(json!({"delete_list": ["a@x.io"]}))
            .await
            .unwrap();
        assert_eq!(out["method"], "DELETE");
        assert_eq!(out["path"], "/leads");
        assert_eq!(out["body"], json!({"delete_list": ["a@x.io"]}));
    }

    #[tokio::test]
    async fn list_leads_posts_filters() {
        let i = integration().await;
        let out = find(&i, "instantly_list_leads")
            .invoke(json!({"campaign_id": "c-1", "limit": 2}))
            .await
            .unwrap();
        assert_eq!(out["method"], "POST");
        assert_eq!(out["path"], "/leads/list");
        assert_eq!(out["body"]["campaign_id"], "c-1");
    }

    #[tokio::test]
    async fn empty_success_body_is_null() {
        let i = integration().await;
        let out = find(&i, "instantly_activate_campaign")
            .invoke(json!({"id": "c-1"}))
            .await
            .unwrap();
        assert_eq!(out, Value::Null);
    }

    #[tokio::test]
    async fn backend_error_keeps_status_and_json_body() {
        let i = integration().await;
        let err = find(&i, "instantly_get_campaign")
            .invoke(json!({"id": "missing"}))
            .await
            .unwrap_err();
        match &err {
            ToolError::Backend { status, body } => {
                assert_eq!(*status, 404);
                assert_eq!(body["error"], "Campaign not found");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.to_string(), "Request failed with status code 404");
    }

    #[tokio::test]
    async fn backend_error_with_text_body() {
        let i = integration().await;
        let err = find(&i, "instantly_get_unread_count")
            .invoke(json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.backend_body(), Some(&json!("upstream down")));
    }

    #[tokio::test]
    async fn unsafe_path_segment_is_rejected_before_sending() {
        let i = integration().await;
        let err = find(&i, "instantly_get_lead")
            .invoke(json!({"id": "../admin"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dealfront
// ─────────────────────────────────────────────────────────────────────────────

mod dealfront {
    use super::*;
    use switchboard_integrations::dealfront::Dealfront;

    #[tokio::test]
    async fn leadfeeder_uses_token_scheme_and_query() {
        let url = start_backend().await;
        let config = DealfrontConfig::new(secret("lf-token")).with_base_urls(url.clone(), url);
        let d = Dealfront::new(&config, TIMEOUT).unwrap();

        let out = find(&d, "dealfront_list_leads")
            .invoke(json!({"account_id": "acc1", "page[size]": 25}))
            .await
            .unwrap();
        assert_eq!(out["path"], "/accounts/acc1/leads");
        assert_eq!(out["authorization"], "Token token=lf-token");
        assert!(out["query"].as_str().unwrap().contains("page%5Bsize%5D=25"));
    }

    #[tokio::test]
    async fn create_export_wraps_json_api_document() {
        let url = start_backend().await;
        let config = DealfrontConfig::new(secret("lf-token")).with_base_urls(url.clone(), url);
        let d = Dealfront::new(&config, TIMEOUT).unwrap();

        let out = find(&d, "dealfront_create_export")
            .invoke(json!({"account_id": "a", "start_date": "2024-01-01", "end_date": "2024-01-31"}))
            .await
            .unwrap();
        assert_eq!(out["method"], "POST");
        assert_eq!(out["path"], "/export-requests");
        assert_eq!(out["body"]["data"]["type"], "export-requests");
        assert_eq!(out["body"]["data"]["attributes"]["account_id"], "a");
        assert_eq!(out["body"]["data"]["attributes"]["end_date"], "2024-01-31");
    }

    #[tokio::test]
    async fn enrich_ip_without_key_is_unavailable() {
        let url = start_backend().await;
        let config = DealfrontConfig::new(secret("lf-token")).with_base_urls(url.clone(), url);
        let d = Dealfront::new(&config, TIMEOUT).unwrap();

        let err = find(&d, "dealfront_enrich_ip")
            .invoke(json!({"ip": "203.0.113.50"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Unavailable(_)));
        assert!(err.to_string().contains("DEALFRONT_IP_ENRICH_API_KEY"));
    }

    #[tokio::test]
    async fn enrich_ip_uses_second_api_key() {
        let url = start_backend().await;
        let config = DealfrontConfig::new(secret("lf-token"))
            .with_ip_enrich_key(Some(secret("enrich-key")))
            .with_base_urls(url.clone(), url);
        let d = Dealfront::new(&config, TIMEOUT).unwrap();

        let out = find(&d, "dealfront_enrich_ip")
            .invoke(json!({"ip": "203.0.113.50"}))
            .await
            .unwrap();
        assert_eq!(out["path"], "/companies");
        assert_eq!(out["query"], "ip=203.0.113.50");
        assert_eq!(out["apiKey"], "enrich-key");
        assert_eq!(out["authorization"], Value::Null);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Google Analytics
// ─────────────────────────────────────────────────────────────────────────────

mod google_analytics {
    use super::*;
    use switchboard_integrations::google_analytics::GoogleAnalytics;
    use switchboard_integrations::http::TokenFuture;

    struct Rotating(std::sync::atomic::AtomicUsize);

    impl TokenSource for Rotating {
        fn access_token(&self) -> TokenFuture<'_> {
            let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Box::pin(async move { Ok(format!("ya29.token-{n}")) })
        }
    }

    #[tokio::test]
    async fn token_is_fetched_per_request() {
        let url = start_backend().await;
        let source = Arc::new(Rotating(Default::default()));
        let config = GoogleAnalyticsConfig::new(source).with_base_urls(url.clone(), url);
        let ga = GoogleAnalytics::new(&config, TIMEOUT).unwrap();

        let op = find(&ga, "ga_get_metadata");
        let first = op.invoke(json!({"propertyId": "123"})).await.unwrap();
        let second = op.invoke(json!({"propertyId": "123"})).await.unwrap();
        assert_eq!(first["authorization"], "Bearer ya29.token-0");
        assert_eq!(second["authorization"], "Bearer ya29.token-1");
        assert_eq!(first["path"], "/v1beta/properties/123/metadata");
    }

    #[tokio::test]
    async fn run_report_posts_body_to_property() {
        let url = start_backend().await;
        let config = GoogleAnalyticsConfig::from_access_token(secret("static"))
            .with_base_urls(url.clone(), url);
        let ga = GoogleAnalytics::new(&config, TIMEOUT).unwrap();

        let out = find(&ga, "ga_run_report")
            .invoke(json!({
                "propertyId": "987",
                "metrics": [{"name": "sessions"}],
                "dateRanges": [{"startDate": "7daysAgo", "endDate": "today"}]
            }))
            .await
            .unwrap();
        assert_eq!(out["path"], "/v1beta/properties/987:runReport");
        assert_eq!(out["body"]["metrics"][0]["name"], "sessions");
        assert!(out["body"].get("propertyId").is_none());
        assert_eq!(out["authorization"], "Bearer static");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport failures
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let config = CustomerIoConfig::new(secret("cio"), Region::Us).with_base_url(url);
    let cio = switchboard_integrations::customerio::CustomerIo::new(&config, TIMEOUT).unwrap();
    let err = find(&cio, "cio_list_segments").invoke(json!({})).await.unwrap_err();
    assert!(matches!(err, ToolError::Transport(_)));
}

#[tokio::test]
async fn build_from_config_exposes_all_tables() {
    let url = start_backend().await;
    let config = IntegrationsConfig {
        customerio: Some(CustomerIoConfig::new(secret("cio"), Region::Eu).with_base_url(url.clone())),
        instantly: Some(InstantlyConfig::new(secret("inst")).with_base_url(url)),
        ..Default::default()
    };
    for integration in config.build().unwrap() {
        let names: Vec<String> = integration.operations().iter().map(|o| o.name().to_string()).collect();
        let table: Vec<String> = integration.id().descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, table);
    }
}
