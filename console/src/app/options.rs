//! Command-line options

use std::collections::HashMap;
use std::path::PathBuf;

use crate::errors::FluxError;
use crate::models::endpoint::EndpointName;
use crate::storage::settings::PAGE_SIZE_OPTIONS;
use crate::workflows::view::{SortField, SortOrder};

/// Usage text printed on `--help` and argument errors
pub const USAGE: &str = "\
Usage: flux-action <command> [--key=value ...]

Commands:
  list        [--search=TEXT] [--sort=name|date] [--order=asc|desc]
              [--page=N] [--per-page=5|10|20|50|100] [--all]
  toggle      --id=ID           flip a workflow's current status
  activate    --id=ID
  deactivate  --id=ID
  download    --id=ID [--out=DIR]
  config show
  config set  --name=list|activate|deactivate|download --url=URL
              [--method=VERB] [--body=TEMPLATE]
  config reset

Flags:
  --version   print version information
  --help      print this message
";

/// Raw arguments split into positionals and `--key[=value]` flags
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub positional: Vec<String>,
    pub flags: HashMap<String, String>,
}

impl CliArgs {
    pub fn flag(&self, key: &str) -> Option<&str> {
        self.flags.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.flags.contains_key(key)
    }

    fn required(&self, key: &str) -> Result<&str, FluxError> {
        self.flag(key)
            .filter(|v| !v.is_empty() && *v != "true")
            .ok_or_else(|| FluxError::Validation(format!("Missing --{}=<value>", key)))
    }

    fn parsed<V>(&self, key: &str) -> Result<Option<V>, FluxError>
    where
        V: std::str::FromStr,
        V::Err: std::fmt::Display,
    {
        self.flag(key)
            .map(|v| {
                v.parse::<V>()
                    .map_err(|e| FluxError::Validation(format!("--{}: {}", key, e)))
            })
            .transpose()
    }
}

/// Parse `--key=value`, `--flag` and positional arguments
pub fn parse_args(args: impl IntoIterator<Item = String>) -> CliArgs {
    let mut parsed = CliArgs::default();

    for arg in args {
        if let Some(flag) = arg.strip_prefix("--") {
            match flag.split_once('=') {
                Some((key, value)) => {
                    parsed.flags.insert(key.to_string(), value.to_string());
                }
                None => {
                    parsed.flags.insert(flag.to_string(), "true".to_string());
                }
            }
        } else {
            parsed.positional.push(arg);
        }
    }

    parsed
}

/// Listing parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub search: Option<String>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub all: bool,
}

/// A parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(ListOptions),
    /// Fetch, then flip the workflow's current status
    Toggle { id: String },
    /// Call activate (`current_status == false`) or deactivate directly
    SetStatus { id: String, current_status: bool },
    Download { id: String, out: Option<PathBuf> },
    ConfigShow,
    ConfigSet {
        name: EndpointName,
        url: String,
        method: Option<String>,
        body_template: Option<String>,
    },
    ConfigReset,
    Version,
    Help,
}

impl Command {
    pub fn from_args(args: &CliArgs) -> Result<Self, FluxError> {
        if args.has("version") {
            return Ok(Command::Version);
        }
        if args.has("help") {
            return Ok(Command::Help);
        }

        let positional: Vec<&str> = args.positional.iter().map(String::as_str).collect();
        match positional.as_slice() {
            [] | ["help"] => Ok(Command::Help),
            ["list"] => Ok(Command::List(list_options(args)?)),
            ["toggle"] => Ok(Command::Toggle {
                id: args.required("id")?.to_string(),
            }),
            ["activate"] => Ok(Command::SetStatus {
                id: args.required("id")?.to_string(),
                current_status: false,
            }),
            ["deactivate"] => Ok(Command::SetStatus {
                id: args.required("id")?.to_string(),
                current_status: true,
            }),
            ["download"] => Ok(Command::Download {
                id: args.required("id")?.to_string(),
                out: args.flag("out").map(PathBuf::from),
            }),
            ["config"] | ["config", "show"] => Ok(Command::ConfigShow),
            ["config", "reset"] => Ok(Command::ConfigReset),
            ["config", "set"] => Ok(Command::ConfigSet {
                name: args
                    .required("name")?
                    .parse::<EndpointName>()
                    .map_err(FluxError::Validation)?,
                url: args.flag("url").unwrap_or_default().to_string(),
                method: args.flag("method").map(str::to_string),
                body_template: args.flag("body").map(str::to_string),
            }),
            other => Err(FluxError::Validation(format!(
                "Unknown command: {}",
                other.join(" ")
            ))),
        }
    }
}

fn list_options(args: &CliArgs) -> Result<ListOptions, FluxError> {
    let per_page = args.parsed::<usize>("per-page")?;
    if let Some(per_page) = per_page {
        if !PAGE_SIZE_OPTIONS.contains(&per_page) {
            return Err(FluxError::Validation(format!(
                "--per-page must be one of {:?}",
                PAGE_SIZE_OPTIONS
            )));
        }
    }

    let page = args.parsed::<usize>("page")?;
    if page == Some(0) {
        return Err(FluxError::Validation("--page starts at 1".to_string()));
    }

    Ok(ListOptions {
        search: args.flag("search").map(str::to_string),
        sort_by: args.parsed::<SortField>("sort")?,
        sort_order: args.parsed::<SortOrder>("order")?,
        page,
        per_page,
        all: args.has("all"),
    })
}
