//! Workflow query and mutation service

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::errors::FluxError;
use crate::http::transport::{WebhookRequest, WebhookResponse, WebhookTransport};
use crate::models::endpoint::{EndpointConfig, EndpointName};
use crate::models::workflow::WorkflowRecord;
use crate::storage::kv::KeyValueStore;
use crate::storage::webhooks::WebhookStore;
use crate::workflows::artifact::DownloadArtifact;
use crate::workflows::fsm::{LoadEvent, LoadFsm, LoadState};
use crate::workflows::normalize::normalize;
use crate::workflows::view::{ViewState, WorkflowPage};

/// Owns the in-memory workflow collection for one session.
///
/// Every operation takes `&mut self`, so calls on one service never
/// interleave. Toggles update the local record optimistically and never
/// re-fetch; call [`WorkflowService::reconcile`] to resynchronise.
pub struct WorkflowService<S, T> {
    store: Arc<WebhookStore<S>>,
    transport: T,
    workflows: Vec<WorkflowRecord>,
    fsm: LoadFsm,
    error: Option<String>,
    view: ViewState,
}

impl<S, T> WorkflowService<S, T>
where
    S: KeyValueStore,
    T: WebhookTransport,
{
    pub fn new(store: Arc<WebhookStore<S>>, transport: T) -> Self {
        Self {
            store,
            transport,
            workflows: Vec::new(),
            fsm: LoadFsm::new(),
            error: None,
            view: ViewState::default(),
        }
    }

    /// Replace the initial view parameters
    pub fn with_view(mut self, view: ViewState) -> Self {
        self.view = view;
        self
    }

    pub fn store(&self) -> &WebhookStore<S> {
        &self.store
    }

    /// Full collection in server order
    pub fn workflows(&self) -> &[WorkflowRecord] {
        &self.workflows
    }

    pub fn find(&self, id: &str) -> Option<&WorkflowRecord> {
        self.workflows.iter().find(|wf| wf.id == id)
    }

    /// Current user-visible error, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> &LoadState {
        self.fsm.state()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    /// Filtered, sorted and paginated view of the collection
    pub fn page(&self) -> WorkflowPage {
        self.view.apply(&self.workflows)
    }

    fn transition(&mut self, event: LoadEvent) {
        if let Err(e) = self.fsm.process(event) {
            warn!("{}", e);
        }
    }

    async fn resolve(&self, name: EndpointName) -> Result<EndpointConfig, FluxError> {
        let config = self.store.config(name).await;
        if !config.is_configured() {
            return Err(FluxError::Config(format!("The {} webhook is not configured", name)));
        }
        Ok(config)
    }

    /// Fetch the list webhook and replace the whole collection.
    ///
    /// An unconfigured endpoint or HTTP failure leaves the collection as
    /// it was; a body that is not JSON empties it. Failures are recorded
    /// in [`WorkflowService::error`] and also returned.
    pub async fn fetch_workflows(&mut self) -> Result<(), FluxError> {
        self.transition(LoadEvent::Fetch);
        self.error = None;

        match self.load_workflows().await {
            Ok(workflows) => {
                info!("Loaded {} workflows", workflows.len());
                self.workflows = workflows;
                self.transition(LoadEvent::Succeed);
                Ok(())
            }
            Err(e) => {
                error!("Error fetching workflows: {}", e);
                if matches!(e, FluxError::MalformedResponse(_)) {
                    self.workflows.clear();
                }
                self.error = Some(e.to_string());
                self.transition(LoadEvent::Fail(e.to_string()));
                Err(e)
            }
        }
    }

    async fn load_workflows(&self) -> Result<Vec<WorkflowRecord>, FluxError> {
        let config = self.resolve(EndpointName::List).await?;
        let request = WebhookRequest {
            method: "GET".to_string(),
            url: config.url.trim().to_string(),
            body: None,
        };

        let response = self
            .transport
            .send(request)
            .await?
            .error_for_status()?;
        let body: Value = serde_json::from_str(&response.body)
            .map_err(|e| FluxError::MalformedResponse(e.to_string()))?;

        Ok(normalize(&body))
    }

    /// Re-fetch the collection after optimistic updates
    pub async fn reconcile(&mut self) -> Result<(), FluxError> {
        debug!("Reconciling workflows with the remote service");
        self.fetch_workflows().await
    }

    /// Activate (`current_status == false`) or deactivate a workflow.
    ///
    /// On success the local record is flipped without re-fetching and the
    /// new status is returned. On failure the record is left untouched,
    /// the error is recorded and returned to the caller.
    pub async fn toggle_workflow(&mut self, id: &str, current_status: bool) -> Result<bool, FluxError> {
        let endpoint = EndpointName::for_toggle(current_status);

        let config = match self.resolve(endpoint).await {
            Ok(config) => config,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };
        self.error = None;

        let request = WebhookRequest::from_config(&config, Some(id));
        let response = match self
            .transport
            .send(request)
            .await
            .and_then(WebhookResponse::error_for_status)
        {
            Ok(response) => response,
            Err(e) => {
                error!("Error calling {} for workflow {}: {}", endpoint, id, e);
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        log_mutation_response(endpoint, id, &response.body);

        let new_status = !current_status;
        match self.workflows.iter_mut().find(|wf| wf.id == id) {
            Some(workflow) => workflow.active = new_status,
            None => debug!("Workflow {} is not in the local collection", id),
        }
        Ok(new_status)
    }

    /// Fetch a workflow's full definition as a downloadable artifact.
    ///
    /// Failures are returned for the caller to alert on; they never touch
    /// the shared error state.
    pub async fn download_workflow(&self, workflow: &WorkflowRecord) -> Result<DownloadArtifact, FluxError> {
        let config = self.resolve(EndpointName::Download).await?;
        let request = WebhookRequest::from_config(&config, Some(&workflow.id));

        let response = self
            .transport
            .send(request)
            .await?
            .error_for_status()?;
        let definition: Value = serde_json::from_str(&response.body)
            .map_err(|e| FluxError::MalformedResponse(e.to_string()))?;

        let contents = serde_json::to_string_pretty(&definition)?;
        Ok(DownloadArtifact::new(workflow.name.as_deref(), contents))
    }
}

/// Mutation webhooks may answer with nothing at all; the body is informational
fn log_mutation_response(endpoint: EndpointName, id: &str, body: &str) {
    if body.trim().is_empty() {
        info!("Workflow {} {}: no response body", id, endpoint);
        return;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => info!("Workflow {} {}: {}", id, endpoint, value),
        Err(e) => debug!("Ignoring unparseable {} response: {}", endpoint, e),
    }
}
