//! Organization dashboard: fetches an organization's teams and their
//! projects and lays them out as a `DashboardView`.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod grouping;
pub mod routing;
pub mod stats;
pub mod types;

/// Initialise env_logger. `RUST_LOG` wins over `default_level`.
pub fn init_logging(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    if let Err(e) = env_logger::Builder::from_env(env).format_timestamp_millis().try_init() {
        eprintln!("Logger already initialised: {}", e);
    }
}
