#![cfg(not(tarpaulin_include))]

use asset_dashboard::app;
use asset_dashboard::config::DashboardConfig;
use clap::Parser;
use std::path::PathBuf;

/// Serve the asset cost dashboard
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON config file; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Workbook written by `extract`
    #[arg(long)]
    data: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DashboardConfig::from_json_file(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    config.validate()?;

    log::info!(
        "Starting dashboard for '{}' on {}",
        config.data_path.display(),
        config.bind
    );
    app::run(config).await
}
