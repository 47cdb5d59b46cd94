use clap::Parser;
use sales_dashboard::app;
use sales_dashboard::config::{DashboardConfig, ServerArgs};

/// Main entry point for the dashboard server
///
/// Parses the command line into a [`DashboardConfig`], sets up logging from `RUST_LOG`
/// (defaulting to `info`), and serves until the process is stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DashboardConfig::from(ServerArgs::parse());
    log::debug!("starting with {:?}", config);

    app::run(config).await
}
