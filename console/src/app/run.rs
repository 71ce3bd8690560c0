//! Command execution and rendering

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use tracing::{error, info};

use crate::app::options::{Command, ListOptions, USAGE};
use crate::errors::FluxError;
use crate::filesys::dir::Dir;
use crate::http::client::HttpTransport;
use crate::http::transport::WebhookTransport;
use crate::models::endpoint::EndpointConfig;
use crate::storage::kv::{FileStore, KeyValueStore};
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::storage::webhooks::WebhookStore;
use crate::utils::version_info;
use crate::workflows::service::WorkflowService;
use crate::workflows::view::{ViewState, WorkflowPage};

/// Everything a command needs to run
pub struct AppContext<S, T> {
    pub service: WorkflowService<S, T>,

    /// Default destination for downloads
    pub downloads_dir: Dir,
}

impl<S, T> AppContext<S, T> {
    pub fn new(service: WorkflowService<S, T>, downloads_dir: Dir) -> Self {
        Self {
            service,
            downloads_dir,
        }
    }
}

/// Wire the file-backed store and the HTTP transport under `layout`
pub async fn build_context(
    layout: &StorageLayout,
    settings: &Settings,
) -> anyhow::Result<AppContext<FileStore, HttpTransport>> {
    let store_dir = layout.store_dir();
    store_dir
        .create()
        .await
        .with_context(|| format!("Failed to create store directory {:?}", store_dir.path()))?;

    let transport = HttpTransport::new(Duration::from_secs(settings.http.timeout_secs))
        .context("Failed to build HTTP client")?;

    let store = Arc::new(WebhookStore::new(FileStore::new(store_dir)));
    let service = WorkflowService::new(store, transport)
        .with_view(ViewState::new(settings.view.items_per_page));
    Ok(AppContext::new(service, layout.downloads_dir()))
}

/// Run `command`, returning the text to print on stdout
pub async fn run_command<S, T>(command: Command, ctx: &mut AppContext<S, T>) -> Result<String, FluxError>
where
    S: KeyValueStore,
    T: WebhookTransport,
{
    match command {
        Command::List(options) => list(options, ctx).await,
        Command::Toggle { id } => toggle(&id, ctx).await,
        Command::SetStatus { id, current_status } => {
            let active = ctx.service.toggle_workflow(&id, current_status).await?;
            Ok(status_line(&id, active))
        }
        Command::Download { id, out } => {
            let dir = out.map(Dir::new).unwrap_or_else(|| ctx.downloads_dir.clone());
            download(&id, &dir, ctx).await.map_err(|e| {
                error!("Error downloading workflow {}: {}", id, e);
                e
            })
        }
        Command::ConfigShow => Ok(render_configs(&ctx.service.store().get_all_configs().await)),
        Command::ConfigSet {
            name,
            url,
            method,
            body_template,
        } => {
            let store = ctx.service.store();
            let mut config = store.config(name).await;
            config.url = validate_url(&url)?;
            if let Some(method) = method {
                config.method = validate_method(&method)?;
            }
            if let Some(body) = body_template {
                config.body_template = Some(body).filter(|b| !b.is_empty());
            }
            store.update_config(&config).await;
            info!("Updated {} webhook", name);
            Ok(render_configs(&[store.config(name).await]))
        }
        Command::ConfigReset => {
            ctx.service.store().reset_all().await;
            Ok("Webhook configuration reset to defaults\n".to_string())
        }
        Command::Version => Ok(format!("{}\n", serde_json::to_string_pretty(&version_info())?)),
        Command::Help => Ok(USAGE.to_string()),
    }
}

async fn list<S, T>(options: ListOptions, ctx: &mut AppContext<S, T>) -> Result<String, FluxError>
where
    S: KeyValueStore,
    T: WebhookTransport,
{
    {
        let view = ctx.service.view_mut();
        if let Some(per_page) = options.per_page {
            view.set_items_per_page(per_page);
        }
        if let Some(search) = options.search {
            view.set_search_term(search);
        }
        if let Some(sort_by) = options.sort_by {
            view.set_sort_by(sort_by);
        }
        if let Some(sort_order) = options.sort_order {
            view.set_sort_order(sort_order);
        }
        // Last: the setters above return to page 1
        if let Some(page) = options.page {
            view.set_current_page(page);
        }
    }

    ctx.service.fetch_workflows().await?;

    if options.all {
        let total = ctx.service.workflows().len();
        ctx.service.view_mut().set_items_per_page(total);
    }

    Ok(render_page(&ctx.service.page()))
}

async fn toggle<S, T>(id: &str, ctx: &mut AppContext<S, T>) -> Result<String, FluxError>
where
    S: KeyValueStore,
    T: WebhookTransport,
{
    ctx.service.fetch_workflows().await?;

    let workflow = ctx
        .service
        .find(id)
        .ok_or_else(|| FluxError::NotFound(format!("Workflow {}", id)))?;
    if workflow.archived {
        return Err(FluxError::Validation(format!(
            "Workflow {} is archived and cannot be toggled",
            id
        )));
    }

    let current_status = workflow.active;
    let active = ctx.service.toggle_workflow(id, current_status).await?;
    Ok(status_line(id, active))
}

async fn download<S, T>(id: &str, dir: &Dir, ctx: &mut AppContext<S, T>) -> Result<String, FluxError>
where
    S: KeyValueStore,
    T: WebhookTransport,
{
    ctx.service.fetch_workflows().await?;

    let workflow = ctx
        .service
        .find(id)
        .ok_or_else(|| FluxError::NotFound(format!("Workflow {}", id)))?;
    let artifact = ctx.service.download_workflow(workflow).await?;
    let path = artifact.write_to(dir).await?;
    Ok(format!("Saved {}\n", path.display()))
}

fn status_line(id: &str, active: bool) -> String {
    if active {
        format!("Workflow {} {}\n", id, "activated".green())
    } else {
        format!("Workflow {} {}\n", id, "deactivated".yellow())
    }
}

fn validate_url(url: &str) -> Result<String, FluxError> {
    let url = url.trim();
    // Empty unconfigures the endpoint
    if !url.is_empty() {
        url::Url::parse(url)
            .map_err(|e| FluxError::Validation(format!("Invalid URL {:?}: {}", url, e)))?;
    }
    Ok(url.to_string())
}

fn validate_method(method: &str) -> Result<String, FluxError> {
    let method = method.trim().to_uppercase();
    ::http::Method::from_bytes(method.as_bytes())
        .map_err(|_| FluxError::Validation(format!("Invalid HTTP method: {:?}", method)))?;
    Ok(method)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Render one page of workflows as a table with a paging footer
pub fn render_page(page: &WorkflowPage) -> String {
    if page.total_items == 0 {
        return "No workflows found\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<40} {:<8} {:<8} {:<10} {}",
        "NAME", "STATUS", "ARCHIVED", "DATE", "ID"
    );

    for wf in &page.items {
        let status = if wf.active {
            format!("{:<8}", "Active").green()
        } else {
            format!("{:<8}", "Inactive").dimmed()
        };
        let archived = if wf.archived { "Archived" } else { "" };
        let _ = writeln!(
            out,
            "{:<40} {} {:<8} {:<10} {}",
            truncate(wf.display_name(), 40),
            status,
            archived,
            wf.display_date(),
            wf.id
        );
    }

    if page.items.is_empty() {
        let _ = writeln!(
            out,
            "\nShowing 0 of {} | page {}/{}",
            page.total_items, page.current_page, page.total_pages
        );
    } else {
        let _ = writeln!(
            out,
            "\nShowing {}-{} of {} | page {}/{}",
            page.start_index + 1,
            page.end_index,
            page.total_items,
            page.current_page,
            page.total_pages
        );
    }
    out
}

/// Render endpoint configs, one block per endpoint
pub fn render_configs(configs: &[EndpointConfig]) -> String {
    let mut out = String::new();
    for config in configs {
        let url = if config.is_configured() {
            config.url.normal()
        } else {
            "(not configured)".red()
        };
        let _ = writeln!(out, "{} - {}", config.name.as_str().bold(), config.name.label());
        let _ = writeln!(out, "  url:    {}", url);
        let _ = writeln!(out, "  method: {}", config.method);
        let _ = writeln!(
            out,
            "  body:   {}",
            config.body_template.as_deref().unwrap_or("-")
        );
    }
    out
}
