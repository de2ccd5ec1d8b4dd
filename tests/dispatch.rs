//! End-to-end dispatch tests over the reqwest transport.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fetch_adapter::http::FormData;
use fetch_adapter::net::ProgressCallback;
use fetch_adapter::security::{BasicAuth, DocumentEnvironment};
use fetch_adapter::{
    Adapter, CancelSource, ErrorCode, ErrorKind, RequestBody, RequestConfig, ReqwestTransport,
    StatusValidator,
};
use serde_json::json;

mod common;

fn adapter() -> Adapter<ReqwestTransport> {
    Adapter::new(ReqwestTransport::new().unwrap())
}

#[tokio::test]
async fn test_post_json_round_trip() {
    let addr = common::start_echo_backend().await;
    let config = RequestConfig::post(
        format!("http://{}/items", addr),
        RequestBody::Json(json!({"name": "widget"})),
    );

    let response = adapter().dispatch(config).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.data["method"], "POST");
    assert_eq!(response.data["uri"], "/items");
    assert_eq!(response.data["headers"]["content-type"], "application/json");
    assert_eq!(response.data["body"], r#"{"name":"widget"}"#);
    assert!(response.data["headers"].get("x-request-id").is_none());
}

#[tokio::test]
async fn test_get_sends_params_and_no_body() {
    let addr = common::start_echo_backend().await;
    let mut config = RequestConfig::post(format!("http://{}/search#frag", addr), "ignored")
        .param("q", "a b")
        .param("tags", json!(["x", "y"]));
    config.method = "get".into();

    let response = adapter().dispatch(config).await.unwrap();
    assert_eq!(response.data["method"], "GET");
    assert_eq!(response.data["uri"], "/search?q=a+b&tags[]=x&tags[]=y");
    assert_eq!(response.data["body"], "");
}

#[tokio::test]
async fn test_basic_auth_header() {
    let addr = common::start_echo_backend().await;
    let config = RequestConfig::get(format!("http://{}/", addr))
        .header("Authorization", "Bearer stale")
        .auth(BasicAuth::new("a", "b"));

    let response = adapter().dispatch(config).await.unwrap();
    assert_eq!(response.data["headers"]["authorization"], "Basic YTpi");
}

#[tokio::test]
async fn test_same_origin_xsrf_token() {
    let addr = common::start_echo_backend().await;
    let origin = format!("http://{}", addr);
    let environment = DocumentEnvironment::new(origin.parse().unwrap())
        .with_cookies("session=1; XSRF-TOKEN=abc%3D");
    let adapter = adapter().with_environment(Arc::new(environment));

    let config = RequestConfig::get(format!("{}/profile", origin)).xsrf("XSRF-TOKEN", "X-XSRF-TOKEN");
    let response = adapter.dispatch(config).await.unwrap();
    assert_eq!(response.data["headers"]["x-xsrf-token"], "abc=");
}

#[tokio::test]
async fn test_relative_url_targets_document_origin() {
    let addr = common::start_echo_backend().await;
    let environment = DocumentEnvironment::new(format!("http://{}/app/", addr).parse().unwrap())
        .with_cookies("XSRF-TOKEN=rel");
    let adapter = adapter().with_environment(Arc::new(environment));

    let config = RequestConfig::get("/profile").param("tab", "keys").xsrf("XSRF-TOKEN", "X-XSRF-TOKEN");
    let response = adapter.dispatch(config).await.unwrap();
    assert_eq!(response.data["uri"], "/profile?tab=keys");
    assert_eq!(response.data["headers"]["x-xsrf-token"], "rel");
    assert_eq!(response.request.url.as_str(), format!("http://{}/profile?tab=keys", addr));
}

#[tokio::test]
async fn test_cross_site_xsrf_requires_credentials() {
    let addr = common::start_echo_backend().await;
    let environment = DocumentEnvironment::new("https://app.test".parse().unwrap())
        .with_cookies("XSRF-TOKEN=tok");
    let adapter = adapter().with_environment(Arc::new(environment));

    let config = RequestConfig::get(format!("http://{}/", addr)).xsrf("XSRF-TOKEN", "X-XSRF-TOKEN");
    let response = adapter.dispatch(config.clone()).await.unwrap();
    assert!(response.data["headers"].get("x-xsrf-token").is_none());

    let mut config = config;
    config.with_credentials = true;
    let response = adapter.dispatch(config).await.unwrap();
    assert_eq!(response.data["headers"]["x-xsrf-token"], "tok");
}

#[tokio::test]
async fn test_timeout_against_hung_backend() {
    let addr = common::start_programmable_backend(|| async {
        std::future::pending::<()>().await;
        (200, String::new())
    })
    .await;

    let started = Instant::now();
    let rejection = adapter()
        .dispatch(RequestConfig::get(format!("http://{}/", addr)).timeout_ms(50))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(1));
    let error = rejection.as_error().unwrap();
    assert_eq!(error.kind, ErrorKind::Timeout);
    assert_eq!(error.code, Some(ErrorCode::ConnAborted));
    assert_eq!(error.message, "timeout of 50ms exceeded");
    assert_eq!(error.status(), Some(504));
}

#[tokio::test]
async fn test_cancel_against_hung_backend() {
    let addr = common::start_programmable_backend(|| async {
        std::future::pending::<()>().await;
        (200, String::new())
    })
    .await;

    let source = CancelSource::new();
    let config = RequestConfig::get(format!("http://{}/", addr)).cancel_token(source.token());
    let dispatch = tokio::spawn(async move { adapter().dispatch(config).await });

    tokio::time::sleep(Duration::from_millis(30)).await;
    source.cancel("operation superseded");

    let rejection = dispatch.await.unwrap().unwrap_err();
    let reason = rejection.as_cancel().unwrap();
    assert!(Arc::ptr_eq(reason, &source.reason().unwrap()));
    assert_eq!(reason.message.as_deref(), Some("operation superseded"));
}

#[tokio::test]
async fn test_error_flag_rejects() {
    let addr = common::start_mock_backend(r#"{"hasError":true,"error":"quota"}"#).await;
    let rejection = adapter()
        .dispatch(RequestConfig::get(format!("http://{}/", addr)))
        .await
        .unwrap_err();

    let error = rejection.as_error().unwrap();
    assert_eq!(error.kind, ErrorKind::Application);
    assert_eq!(error.code, Some(ErrorCode::Status(200)));
    assert_eq!(error.response.as_ref().unwrap().data["error"], "quota");
}

#[tokio::test]
async fn test_non_json_error_page_resolves() {
    let addr = common::start_programmable_backend(|| async {
        (503, "<h1>maintenance</h1>".to_string())
    })
    .await;

    let response = adapter()
        .dispatch(RequestConfig::get(format!("http://{}/", addr)))
        .await
        .unwrap();
    assert_eq!(response.status, 503);
    assert_eq!(response.data, json!({"code": 503, "message": "Service Unavailable"}));
}

#[tokio::test]
async fn test_server_reason_phrase_is_kept() {
    let addr = common::start_status_line_backend("503 Back Soon", "down for upgrade").await;

    let response = adapter()
        .dispatch(RequestConfig::get(format!("http://{}/", addr)))
        .await
        .unwrap();
    assert_eq!(response.status, 503);
    assert_eq!(response.status_text, "Back Soon");
    assert_eq!(response.data, json!({"code": 503, "message": "Back Soon"}));
}

#[tokio::test]
async fn test_canonical_reason_phrase_is_used_when_server_matches() {
    let addr = common::start_status_line_backend("200 OK", "{}").await;

    let response = adapter()
        .dispatch(RequestConfig::get(format!("http://{}/", addr)))
        .await
        .unwrap();
    assert_eq!(response.status_text, "OK");
}

#[tokio::test]
async fn test_status_validator_rejects() {
    let addr = common::start_programmable_backend(|| async { (404, "{}".to_string()) }).await;
    let mut config = RequestConfig::get(format!("http://{}/", addr));
    config.validate_status = Some(StatusValidator::success());

    let rejection = adapter().dispatch(config).await.unwrap_err();
    let error = rejection.as_error().unwrap();
    assert_eq!(error.kind, ErrorKind::Status);
    assert_eq!(error.message, "Request failed with status code 404");
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let addr = common::closed_port().await;
    let rejection = adapter()
        .dispatch(RequestConfig::get(format!("http://{}/", addr)).timeout_ms(2_000))
        .await
        .unwrap_err();

    let error = rejection.as_error().unwrap();
    assert_eq!(error.kind, ErrorKind::Network);
    assert_eq!(error.message, "Network Error");
    assert!(error.code.is_none());
    assert!(error.cause.is_some());
}

#[tokio::test]
async fn test_download_progress_reaches_total() {
    let body = "x".repeat(64 * 1024);
    let addr = common::start_programmable_backend(move || {
        let body = format!(r#"{{"blob":"{}"}}"#, body);
        async move { (200, body) }
    })
    .await;

    let last = Arc::new(AtomicU64::new(0));
    let total = Arc::new(AtomicU64::new(0));
    let (l, t) = (last.clone(), total.clone());
    let config = RequestConfig::get(format!("http://{}/", addr)).on_download_progress(
        ProgressCallback::new(move |p| {
            l.store(p.loaded, Ordering::SeqCst);
            t.store(p.total.unwrap_or(0), Ordering::SeqCst);
        }),
    );

    adapter().dispatch(config).await.unwrap();
    assert!(last.load(Ordering::SeqCst) > 64 * 1024);
    assert_eq!(last.load(Ordering::SeqCst), total.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_multipart_upload() {
    let addr = common::start_echo_backend().await;
    let form = FormData::new()
        .text("title", "report")
        .file("upload", "report.csv", b"a,b\n1,2\n".to_vec());
    let uploads = Arc::new(AtomicUsize::new(0));
    let counter = uploads.clone();
    let config = RequestConfig::post(format!("http://{}/upload", addr), form)
        .header("Content-Type", "application/json")
        .on_upload_progress(ProgressCallback::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

    let response = adapter().dispatch(config).await.unwrap();
    let content_type = response.data["headers"]["content-type"].as_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert!(response.data["body"].as_str().unwrap().contains("report.csv"));
    assert_eq!(uploads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_text_upload_progress() {
    let addr = common::start_echo_backend().await;
    let loaded = Arc::new(AtomicU64::new(0));
    let sink = loaded.clone();
    let config = RequestConfig::post(format!("http://{}/", addr), "y".repeat(40_000))
        .on_upload_progress(ProgressCallback::new(move |p| {
            sink.store(p.loaded, Ordering::SeqCst);
        }));

    let response = adapter().dispatch(config).await.unwrap();
    assert_eq!(response.data["headers"]["content-type"], "text/plain;charset=UTF-8");
    assert_eq!(loaded.load(Ordering::SeqCst), 40_000);
}
