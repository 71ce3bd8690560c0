//! Downloaded workflow definitions

use std::path::PathBuf;

use tracing::info;

use crate::errors::FluxError;
use crate::filesys::dir::Dir;

/// A workflow export ready to be written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    /// `<workflow name>.json`, or `workflow.json` for unnamed workflows
    pub file_name: String,

    /// Pretty-printed JSON returned by the download webhook
    pub contents: String,
}

impl DownloadArtifact {
    pub fn new(workflow_name: Option<&str>, contents: String) -> Self {
        Self {
            file_name: artifact_file_name(workflow_name),
            contents,
        }
    }

    /// Write the artifact into `dir`, returning the file path
    pub async fn write_to(&self, dir: &Dir) -> Result<PathBuf, FluxError> {
        dir.create().await?;
        let file = dir.file(&self.file_name);
        file.write_string(&self.contents).await?;
        info!("Saved workflow to {:?}", file.path());
        Ok(file.path().to_path_buf())
    }
}

fn artifact_file_name(workflow_name: Option<&str>) -> String {
    let stem = match workflow_name.map(str::trim) {
        Some(name) if !name.is_empty() => name
            .chars()
            .map(|c| match c {
                '/' | '\\' | '\0' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect::<String>(),
        _ => "workflow".to_string(),
    };
    format!("{}.json", stem)
}
