//! orgdash: render an organization's dashboard view as JSON.
//!
//! Usage: `orgdash acme --loading lazy --pretty`
//! Reads ~/.orgdash/config.json (or `--config`), then applies flag overrides.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use futures::future::join_all;

use orgdash_lib::api::client::HttpApiClient;
use orgdash_lib::api::DashboardApi;
use orgdash_lib::config::{load_config, load_config_from, Config};
use orgdash_lib::dashboard::{DashboardOptions, DashboardScreen, ProjectLoading};
use orgdash_lib::error::{ApiError, ConfigError};
use orgdash_lib::routing::{dashboard_path, LogNavigator};
use orgdash_lib::stats::ProjectStats;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Organization slug (defaults to `organization` from the config file)
    org: Option<String>,

    /// Config file (default: ~/.orgdash/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// API base URL
    #[arg(long, env = "ORGDASH_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the API
    #[arg(long, env = "ORGDASH_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// How team sections load their projects
    #[arg(long, value_enum)]
    loading: Option<ProjectLoading>,

    /// Use the lightweight teams listing
    #[arg(long)]
    lite: bool,

    /// Attach every project to every team
    #[arg(long)]
    show_all_teams: bool,

    /// Path the dashboard was reached through (legacy paths redirect)
    #[arg(long)]
    path: Option<String>,

    /// Pretty-print the JSON view
    #[arg(long)]
    pretty: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("No organization given. Pass one as an argument or set \"organization\" in the config file")]
    MissingOrganization,
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    if let Some(url) = &args.api_url {
        config.api_url = url.clone();
    }
    if let Some(token) = &args.auth_token {
        config.auth_token = Some(token.clone());
    }
    if let Some(org) = &args.org {
        config.organization = Some(org.clone());
    }
    if let Some(loading) = args.loading {
        config.project_loading = loading;
    }
    config.lite_teams |= args.lite;
    config.show_all_teams |= args.show_all_teams;

    config.validate()?;
    Ok(config)
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let config = resolve_config(&args)?;
    let level = if args.verbose {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };
    orgdash_lib::init_logging(level);

    let org_slug = config
        .organization
        .clone()
        .ok_or(CliError::MissingOrganization)?;

    let api: Arc<dyn DashboardApi> = Arc::new(HttpApiClient::from_config(&config)?);
    let organization = api.organization(&org_slug).await?;

    let screen = DashboardScreen::new(
        api,
        DashboardOptions::from(&config),
        ProjectStats::global(),
        Arc::new(LogNavigator),
    );
    let path = args.path.clone().unwrap_or_else(|| dashboard_path(&org_slug));
    screen.mount(&path, organization).await;

    // Headless: every section counts as scrolled into view.
    if config.project_loading == ProjectLoading::Lazy {
        let slugs = screen.section_slugs();
        join_all(slugs.iter().map(|slug| screen.section_visible(slug))).await;
    }

    let view = screen.render();
    screen.unmount();

    println!("{}", to_json(&view, args.pretty)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("orgdash failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
