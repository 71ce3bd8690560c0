//! End-to-end tests against a local webhook server

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::json;

use flux_action::app::options::{Command, ListOptions};
use flux_action::app::run::{run_command, AppContext};
use flux_action::filesys::dir::Dir;
use flux_action::http::client::HttpTransport;
use flux_action::models::endpoint::EndpointName;
use flux_action::storage::kv::MemoryStore;
use flux_action::storage::webhooks::WebhookStore;
use flux_action::workflows::service::WorkflowService;

#[derive(Debug, Clone)]
struct Received {
    method: Method,
    accept: Option<String>,
    content_type: Option<String>,
    body: String,
}

type Log = Arc<Mutex<Vec<Received>>>;

fn record(log: &Log, method: Method, headers: &HeaderMap, body: String) {
    let value_of = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    log.lock().unwrap().push(Received {
        method,
        accept: value_of(header::ACCEPT),
        content_type: value_of(header::CONTENT_TYPE),
        body,
    });
}

async fn list_handler(State(log): State<Log>, method: Method, headers: HeaderMap) -> impl IntoResponse {
    record(&log, method, &headers, String::new());
    Json(json!({
        "workflows": [
            {"id": "1", "name": "Billing", "active": true, "createdAt": "2024-05-01T08:00:00.000Z"},
            {"id": "2", "name": "archive cleanup", "active": false, "isArchived": true},
            {"id": 3, "active": false}
        ]
    }))
}

async fn activate_handler(
    State(log): State<Log>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    record(&log, method, &headers, body);
    StatusCode::NO_CONTENT
}

async fn deactivate_handler() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "workflow engine down")
}

async fn download_handler(
    State(log): State<Log>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    record(&log, method, &headers, body);
    Json(json!({"id": "1", "name": "Billing", "nodes": [{"type": "n8n-nodes-base.cron"}]}))
}

async fn spawn_server(log: Log) -> String {
    let app = Router::new()
        .route("/list", get(list_handler))
        .route("/activate", any(activate_handler))
        .route("/deactivate", any(deactivate_handler))
        .route("/download", any(download_handler))
        .with_state(log);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn context(base: &str, downloads: Dir) -> AppContext<MemoryStore, HttpTransport> {
    let store = WebhookStore::new(MemoryStore::new());
    for name in EndpointName::ALL {
        store.update_url(name, &format!("{}/{}", base, name)).await;
    }
    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    AppContext::new(WorkflowService::new(Arc::new(store), transport), downloads)
}

#[tokio::test]
async fn test_list_over_http() {
    colored::control::set_override(false);
    let log = Log::default();
    let base = spawn_server(log.clone()).await;
    let tmp = tempfile::tempdir().unwrap();
    let mut ctx = context(&base, Dir::new(tmp.path())).await;

    let out = run_command(Command::List(ListOptions::default()), &mut ctx)
        .await
        .unwrap();

    assert_eq!(ctx.service.workflows().len(), 3);
    assert!(ctx.service.find("2").unwrap().archived);
    assert!(out.contains("Billing"));
    assert!(out.contains("01/05/2024"));
    assert!(out.contains("unnamed"));
    assert!(out.contains("Showing 1-3 of 3 | page 1/1"));

    let received = log.lock().unwrap().clone();
    assert_eq!(received[0].method, Method::GET);
    assert_eq!(received[0].accept.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_activate_over_http() {
    let log = Log::default();
    let base = spawn_server(log.clone()).await;
    let tmp = tempfile::tempdir().unwrap();
    let mut ctx = context(&base, Dir::new(tmp.path())).await;

    ctx.service.fetch_workflows().await.unwrap();
    let active = ctx.service.toggle_workflow("3", false).await.unwrap();

    assert!(active);
    assert!(ctx.service.find("3").unwrap().active);

    let received = log.lock().unwrap().clone();
    let call = &received[1];
    assert_eq!(call.method, Method::POST);
    assert_eq!(call.content_type.as_deref(), Some("application/json"));
    assert_eq!(call.body, r#"[{"workflow_id": "3"}]"#);
}

#[tokio::test]
async fn test_deactivate_failure_over_http() {
    let log = Log::default();
    let base = spawn_server(log.clone()).await;
    let tmp = tempfile::tempdir().unwrap();
    let mut ctx = context(&base, Dir::new(tmp.path())).await;

    ctx.service.fetch_workflows().await.unwrap();
    let err = ctx.service.toggle_workflow("1", true).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(ctx.service.find("1").unwrap().active);
}

#[tokio::test]
async fn test_toggle_command_refuses_archived() {
    let log = Log::default();
    let base = spawn_server(log.clone()).await;
    let tmp = tempfile::tempdir().unwrap();
    let mut ctx = context(&base, Dir::new(tmp.path())).await;

    let result = run_command(Command::Toggle { id: "2".to_string() }, &mut ctx).await;
    assert!(result.is_err());
    // Only the list call was made
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_download_command_writes_file() {
    let log = Log::default();
    let base = spawn_server(log.clone()).await;
    let tmp = tempfile::tempdir().unwrap();
    let mut ctx = context(&base, Dir::new(tmp.path().join("downloads"))).await;

    run_command(
        Command::Download {
            id: "1".to_string(),
            out: None,
        },
        &mut ctx,
    )
    .await
    .unwrap();

    let saved = std::fs::read_to_string(tmp.path().join("downloads").join("Billing.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(value["nodes"][0]["type"], "n8n-nodes-base.cron");

    let received = log.lock().unwrap().clone();
    assert_eq!(received[1].body, r#"[{"workflow_id": "1"}]"#);
}

#[tokio::test]
async fn test_missing_download_target_is_not_found() {
    let log = Log::default();
    let base = spawn_server(log).await;
    let tmp = tempfile::tempdir().unwrap();
    let mut ctx = context(&base, Dir::new(tmp.path())).await;

    let err = run_command(
        Command::Download {
            id: "404".to_string(),
            out: None,
        },
        &mut ctx,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("Not found"));
}

/// Answers every connection with a 200 whose body is cut short
async fn spawn_truncating_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 64\r\n\r\n{\"status\":")
                .await;
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_toggle_survives_broken_response_body() {
    let base = spawn_truncating_server().await;
    let tmp = tempfile::tempdir().unwrap();
    let mut ctx = context(&base, Dir::new(tmp.path())).await;

    let active = ctx.service.toggle_workflow("7", false).await.unwrap();

    assert!(active);
    assert!(ctx.service.error().is_none());
}
