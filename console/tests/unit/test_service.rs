//! Workflow service unit tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use flux_action::errors::FluxError;
use flux_action::http::transport::{WebhookRequest, WebhookResponse, WebhookTransport};
use flux_action::models::endpoint::{EndpointConfig, EndpointName};
use flux_action::storage::kv::MemoryStore;
use flux_action::storage::webhooks::WebhookStore;
use flux_action::workflows::fsm::LoadState;
use flux_action::workflows::service::WorkflowService;

/// Replays canned responses and records every request
#[derive(Clone, Default)]
struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<Result<WebhookResponse, FluxError>>>>,
    requests: Arc<Mutex<Vec<WebhookRequest>>>,
}

impl ScriptedTransport {
    fn respond(&self, status: u16, body: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(WebhookResponse::new(status, body)));
        self
    }

    fn fail(&self, error: FluxError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    fn requests(&self) -> Vec<WebhookRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookTransport for ScriptedTransport {
    async fn send(&self, request: WebhookRequest) -> Result<WebhookResponse, FluxError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FluxError::Transport("no scripted response".to_string())))
    }
}

async fn configured_store() -> Arc<WebhookStore<MemoryStore>> {
    let store = WebhookStore::new(MemoryStore::new());
    for name in EndpointName::ALL {
        store
            .update_url(name, &format!("https://hooks.example.com/{}", name))
            .await;
    }
    Arc::new(store)
}

async fn service() -> (WorkflowService<MemoryStore, ScriptedTransport>, ScriptedTransport) {
    let transport = ScriptedTransport::default();
    let service = WorkflowService::new(configured_store().await, transport.clone());
    (service, transport)
}

async fn loaded_service(
    body: serde_json::Value,
) -> (WorkflowService<MemoryStore, ScriptedTransport>, ScriptedTransport) {
    let (mut service, transport) = service().await;
    transport.respond(200, &body.to_string());
    service.fetch_workflows().await.unwrap();
    (service, transport)
}

#[tokio::test]
async fn test_fetch_normalizes_data_envelope() {
    let (service, transport) = loaded_service(json!({"data": [{"id": "1", "name": "A"}]})).await;

    assert_eq!(service.workflows().len(), 1);
    assert_eq!(service.state(), &LoadState::Loaded);
    assert!(service.error().is_none());

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, "https://hooks.example.com/list");
    assert!(requests[0].body.is_none());
}

#[tokio::test]
async fn test_fetch_single_record_and_unknown_shape() {
    let (service, _) = loaded_service(json!({"id": "1", "name": "A"})).await;
    assert_eq!(service.workflows().len(), 1);

    let (service, _) = loaded_service(json!({"foo": 1})).await;
    assert!(service.workflows().is_empty());
    assert_eq!(service.state(), &LoadState::Loaded);
}

#[tokio::test]
async fn test_fetch_uses_get_even_when_list_method_differs() {
    let (mut service, transport) = service().await;
    service
        .store()
        .update_config(&EndpointConfig {
            url: "https://hooks.example.com/list".to_string(),
            method: "POST".to_string(),
            ..EndpointConfig::default_for(EndpointName::List)
        })
        .await;

    transport.respond(200, "[]");
    service.fetch_workflows().await.unwrap();
    assert_eq!(transport.requests()[0].method, "GET");
}

#[tokio::test]
async fn test_fetch_replaces_collection_wholesale() {
    let (mut service, transport) = loaded_service(json!([{"id": "1"}, {"id": "2"}])).await;

    transport.respond(200, &json!([{"id": "3"}]).to_string());
    service.fetch_workflows().await.unwrap();

    let ids: Vec<_> = service.workflows().iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, vec!["3"]);
}

#[tokio::test]
async fn test_unconfigured_list_keeps_collection() {
    let (mut service, transport) = loaded_service(json!([{"id": "1", "name": "A"}])).await;
    service.store().update_url(EndpointName::List, "").await;

    let err = service.fetch_workflows().await.unwrap_err();

    assert!(err.is_config());
    assert_eq!(service.workflows().len(), 1);
    assert_eq!(service.state(), &LoadState::Failed);
    assert!(service.error().unwrap().contains("list webhook is not configured"));
    // Only the initial fetch reached the transport
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_http_failure_is_recorded() {
    let (mut service, transport) = loaded_service(json!([{"id": "1"}])).await;
    transport.respond(503, "unavailable");

    let err = service.fetch_workflows().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(service.workflows().len(), 1);
    assert_eq!(service.error(), Some("HTTP error! status: 503"));
}

#[tokio::test]
async fn test_malformed_list_body_empties_collection() {
    let (mut service, transport) = loaded_service(json!([{"id": "1"}])).await;
    transport.respond(200, "<html>oops</html>");

    let err = service.fetch_workflows().await.unwrap_err();
    assert!(matches!(err, FluxError::MalformedResponse(_)));
    assert!(service.workflows().is_empty());
    assert!(service.error().is_some());
}

#[tokio::test]
async fn test_successful_refresh_clears_error() {
    let (mut service, transport) = service().await;
    transport.fail(FluxError::Transport("connection refused".to_string()));
    assert!(service.fetch_workflows().await.is_err());
    assert!(service.error().is_some());

    transport.respond(200, "[]");
    service.fetch_workflows().await.unwrap();
    assert!(service.error().is_none());
    assert_eq!(service.state(), &LoadState::Loaded);
}

#[tokio::test]
async fn test_activate_flips_local_record() {
    let (mut service, transport) =
        loaded_service(json!([{"id": "wf-1", "name": "A", "active": false}])).await;
    transport.respond(200, "");

    let active = service.toggle_workflow("wf-1", false).await.unwrap();

    assert!(active);
    assert!(service.find("wf-1").unwrap().active);

    let request = &transport.requests()[1];
    assert_eq!(request.method, "POST");
    assert_eq!(request.url, "https://hooks.example.com/activate");
    assert_eq!(request.body.as_deref(), Some(r#"[{"workflow_id": "wf-1"}]"#));
}

#[tokio::test]
async fn test_deactivate_uses_deactivate_endpoint() {
    let (mut service, transport) =
        loaded_service(json!([{"id": "wf-1", "name": "A", "active": true}])).await;
    transport.respond(200, r#"{"ok": true}"#);

    assert!(!service.toggle_workflow("wf-1", true).await.unwrap());
    assert!(!service.find("wf-1").unwrap().active);
    assert_eq!(transport.requests()[1].url, "https://hooks.example.com/deactivate");
}

#[tokio::test]
async fn test_failed_toggle_leaves_record_unchanged() {
    let (mut service, transport) =
        loaded_service(json!([{"id": "wf-1", "name": "A", "active": false}])).await;
    transport.respond(500, "boom");

    let err = service.toggle_workflow("wf-1", false).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(!service.find("wf-1").unwrap().active);
    assert_eq!(service.error(), Some("HTTP error! status: 500"));
}

#[tokio::test]
async fn test_toggle_tolerates_unparseable_body() {
    let (mut service, transport) =
        loaded_service(json!([{"id": "wf-1", "active": false}])).await;
    transport.respond(202, "accepted, not json");

    assert!(service.toggle_workflow("wf-1", false).await.unwrap());
    assert!(service.error().is_none());
}

#[tokio::test]
async fn test_unconfigured_toggle_records_error_without_calling() {
    let (mut service, transport) = loaded_service(json!([{"id": "wf-1", "active": false}])).await;
    service.store().update_url(EndpointName::Activate, "").await;

    let err = service.toggle_workflow("wf-1", false).await.unwrap_err();

    assert!(err.is_config());
    assert!(service.error().is_some());
    assert!(!service.find("wf-1").unwrap().active);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_toggle_of_unknown_id_still_calls_remote() {
    let (mut service, transport) = loaded_service(json!([{"id": "wf-1", "active": false}])).await;
    transport.respond(200, "");

    assert!(service.toggle_workflow("elsewhere", false).await.unwrap());
    assert!(!service.find("wf-1").unwrap().active);
}

#[tokio::test]
async fn test_download_produces_pretty_artifact() {
    let (service, transport) =
        loaded_service(json!([{"id": "wf-9", "name": "Nightly export", "active": true}])).await;
    transport.respond(200, r#"{"id":"wf-9","nodes":[{"type":"cron"}]}"#);

    let workflow = service.find("wf-9").unwrap().clone();
    let artifact = service.download_workflow(&workflow).await.unwrap();

    assert_eq!(artifact.file_name, "Nightly export.json");
    assert!(artifact.contents.contains("\n  \"nodes\": ["));
    let parsed: serde_json::Value = serde_json::from_str(&artifact.contents).unwrap();
    assert_eq!(parsed["nodes"][0]["type"], "cron");

    let request = &transport.requests()[1];
    assert_eq!(request.url, "https://hooks.example.com/download");
    assert_eq!(request.body.as_deref(), Some(r#"[{"workflow_id": "wf-9"}]"#));
}

#[tokio::test]
async fn test_download_failures_do_not_touch_shared_error() {
    let (mut service, transport) = loaded_service(json!([{"id": "wf-9"}])).await;
    let workflow = service.find("wf-9").unwrap().clone();

    transport.respond(404, "");
    assert_eq!(service.download_workflow(&workflow).await.unwrap_err().status(), Some(404));

    transport.respond(200, "not json");
    assert!(matches!(
        service.download_workflow(&workflow).await.unwrap_err(),
        FluxError::MalformedResponse(_)
    ));

    service.store().update_url(EndpointName::Download, "").await;
    assert!(service.download_workflow(&workflow).await.unwrap_err().is_config());

    assert!(service.error().is_none());
    assert_eq!(artifact_name_for_unnamed(&mut service, &transport).await, "workflow.json");
}

async fn artifact_name_for_unnamed(
    service: &mut WorkflowService<MemoryStore, ScriptedTransport>,
    transport: &ScriptedTransport,
) -> String {
    service
        .store()
        .update_url(EndpointName::Download, "https://hooks.example.com/download")
        .await;
    transport.respond(200, "{}");
    let workflow = service.find("wf-9").unwrap().clone();
    service.download_workflow(&workflow).await.unwrap().file_name
}

#[tokio::test]
async fn test_page_reflects_view_changes() {
    let records: Vec<_> = (0..25)
        .map(|i| json!({"id": i.to_string(), "name": format!("flow {:02}", i)}))
        .collect();
    let (mut service, _) = loaded_service(serde_json::Value::Array(records)).await;

    service.view_mut().set_items_per_page(10);
    service.view_mut().set_current_page(3);
    let page = service.page();
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.total_pages, 3);

    service.view_mut().set_current_page(5);
    service.view_mut().set_search_term("flow 1");
    assert_eq!(service.view().current_page(), 1);
    assert_eq!(service.page().total_items, 10);
}

#[tokio::test]
async fn test_reconcile_refetches() {
    let (mut service, transport) = loaded_service(json!([{"id": "wf-1", "active": false}])).await;
    transport.respond(200, "");
    service.toggle_workflow("wf-1", false).await.unwrap();

    transport.respond(200, &json!([{"id": "wf-1", "active": false}]).to_string());
    service.reconcile().await.unwrap();
    assert!(!service.find("wf-1").unwrap().active);
    assert_eq!(transport.requests().len(), 3);
}
