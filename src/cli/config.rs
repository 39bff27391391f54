use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::drive::csrf::CsrfConfig;
use crate::drive::submission_controller::{STREAM_CONTENT_TYPE, SubmissionOptions};
use crate::frames::target_resolver::{EscapePolicy, ResolverConfig};
use crate::session::navigator::NavigatorConfig;

pub const DEFAULT_CONFIG_PATH: &str = "frame-navigator.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "frame-navigator",
    version,
    about = "Intercept page navigations and drive form submissions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: frame-navigator.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show where a navigation from an element of a page fixture would go
    Resolve {
        /// Path to a page fixture YAML file
        #[arg(long)]
        page: String,

        /// Id of the link or form to resolve
        #[arg(long)]
        element: String,

        /// Id of the submitter button, for forms
        #[arg(long)]
        submitter: Option<String>,

        /// How GET forms treat an escape to the page root
        #[arg(long, value_enum)]
        get_policy: Option<GetPolicyArg>,
    },

    /// Submit a form from a page fixture against its live URL
    Submit {
        /// Path to a page fixture YAML file
        #[arg(long)]
        page: String,

        /// Id of the form to submit
        #[arg(long)]
        form: String,

        /// Id of the submitter button
        #[arg(long)]
        submitter: Option<String>,

        /// Append lifecycle trace lines to this file
        #[arg(long)]
        trace: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetPolicyArg {
    Stay,
    Escape,
}

impl From<GetPolicyArg> for EscapePolicy {
    fn from(arg: GetPolicyArg) -> Self {
        match arg {
            GetPolicyArg::Stay => EscapePolicy::GetStaysInScope,
            GetPolicyArg::Escape => EscapePolicy::GetEscapes,
        }
    }
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `frame-navigator.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub csrf: CsrfConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub page_must_redirect: bool,

    #[serde(default = "default_stream_content_type")]
    pub stream_content_type: String,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            page_must_redirect: true,
            stream_content_type: STREAM_CONTENT_TYPE.to_string(),
            resolver: ResolverConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    pub path: Option<String>,
}

// Serde default helpers
fn default_true() -> bool { true }
fn default_stream_content_type() -> String { STREAM_CONTENT_TYPE.to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content),
        Err(_) => AppConfig::default(),
    }
}

pub fn parse_config(content: &str) -> AppConfig {
    match serde_yaml::from_str(content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "malformed config, using defaults");
            AppConfig::default()
        }
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

pub fn build_navigator_config(config: &AppConfig, get_policy: Option<EscapePolicy>) -> NavigatorConfig {
    let mut resolver = config.drive.resolver.clone();
    if let Some(policy) = get_policy {
        resolver.get_policy = policy;
    }

    NavigatorConfig {
        submission: SubmissionOptions {
            csrf: config.csrf.clone(),
            must_redirect: false,
            stream_content_type: config.drive.stream_content_type.clone(),
        },
        page_must_redirect: config.drive.page_must_redirect,
        resolver,
        drive_enabled: config.drive.enabled,
    }
}
