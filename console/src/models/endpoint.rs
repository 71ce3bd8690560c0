//! Webhook endpoint models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the workflow id in body templates
pub const ID_PLACEHOLDER: &str = "{{id}}";

/// Default request body for the mutation endpoints
pub const DEFAULT_BODY_TEMPLATE: &str = r#"[{"workflow_id": "{{id}}"}]"#;

/// The four remote operations, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointName {
    List,
    Activate,
    Deactivate,
    Download,
}

impl EndpointName {
    /// Every endpoint name in declaration order
    pub const ALL: [EndpointName; 4] = [
        EndpointName::List,
        EndpointName::Activate,
        EndpointName::Deactivate,
        EndpointName::Download,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointName::List => "list",
            EndpointName::Activate => "activate",
            EndpointName::Deactivate => "deactivate",
            EndpointName::Download => "download",
        }
    }

    /// Human readable label shown in the settings listing
    pub fn label(&self) -> &'static str {
        match self {
            EndpointName::List => "Webhook for listing workflows",
            EndpointName::Activate => "Webhook for activating a workflow",
            EndpointName::Deactivate => "Webhook for deactivating a workflow",
            EndpointName::Download => "Webhook for downloading a workflow",
        }
    }

    /// Endpoint used to move a workflow away from `current_status`
    pub fn for_toggle(current_status: bool) -> Self {
        if current_status {
            EndpointName::Deactivate
        } else {
            EndpointName::Activate
        }
    }
}

impl fmt::Display for EndpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(EndpointName::List),
            "activate" => Ok(EndpointName::Activate),
            "deactivate" => Ok(EndpointName::Deactivate),
            "download" => Ok(EndpointName::Download),
            _ => Err(format!("Unknown endpoint: {}", s)),
        }
    }
}

/// How to invoke one remote operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    /// Which operation this config describes
    pub name: EndpointName,

    /// Webhook URL; empty means unconfigured
    #[serde(default)]
    pub url: String,

    /// HTTP verb
    pub method: String,

    /// Request body with `{{id}}` placeholders
    #[serde(default)]
    pub body_template: Option<String>,
}

impl EndpointConfig {
    /// Built-in default for `name`, always with an empty url
    pub fn default_for(name: EndpointName) -> Self {
        match name {
            EndpointName::List => Self {
                name,
                url: String::new(),
                method: "GET".to_string(),
                body_template: None,
            },
            EndpointName::Activate | EndpointName::Deactivate | EndpointName::Download => Self {
                name,
                url: String::new(),
                method: "POST".to_string(),
                body_template: Some(DEFAULT_BODY_TEMPLATE.to_string()),
            },
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Request body for `id`, if this endpoint sends one
    pub fn render_body(&self, id: &str) -> Option<String> {
        self.body_template
            .as_deref()
            .filter(|template| !template.is_empty())
            .map(|template| template.replace(ID_PLACEHOLDER, id))
    }
}
