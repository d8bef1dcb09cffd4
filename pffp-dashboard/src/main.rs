//! pffp-dashboard - reporting service for the PFFP field program
//!
//! Fetches the program feed at startup, then serves KPIs, charts, filter
//! options, tables and exports over HTTP. The service keeps running when
//! the initial fetch fails; `POST /api/refresh` retries.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pffp_common::config::{ConfigResolver, Overrides};
use pffp_common::Language;
use pffp_dashboard::export::{CsvBundleSink, ExportSink};
use pffp_dashboard::source::{DataSource, HttpDataSource, UnconfiguredSource};
use pffp_dashboard::store::Dashboard;
use pffp_dashboard::{build_router, AppState};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "pffp-dashboard")]
#[command(about = "Reporting dashboard service for the PFFP field program")]
#[command(version)]
struct Args {
    /// Program feed URL (overrides PFFP_ENDPOINT_URL and the config file)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Address to listen on, e.g. 127.0.0.1:5740
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory receiving exported reports
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Initial display language (vi or en)
    #[arg(short, long)]
    language: Option<Language>,

    /// Config file (defaults to PFFP_CONFIG, then the per-user config)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigResolver::new(Overrides {
        endpoint_url: args.endpoint,
        bind_addr: args.bind,
        export_dir: args.export_dir,
        language: args.language,
        config_path: args.config,
    })
    .resolve();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting PFFP Dashboard (pffp-dashboard) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if let Some(path) = &config.config_file {
        info!("Config file: {}", path.display());
    }
    if let Some(warning) = &config.config_warning {
        warn!("{}", warning);
    }

    let source: Arc<dyn DataSource> = match &config.endpoint_url {
        Some(url) => {
            let http = HttpDataSource::new(url.clone(), config.request_timeout)?;
            info!("Data endpoint: {}", http.endpoint());
            Arc::new(http)
        }
        None => {
            warn!("No data endpoint configured; dashboard will stay empty");
            Arc::new(UnconfiguredSource)
        }
    };

    let export_sink: Option<Arc<dyn ExportSink>> = match &config.export_dir {
        Some(dir) => {
            info!("Export directory: {}", dir.display());
            Some(Arc::new(CsvBundleSink::new(dir.clone())))
        }
        None => {
            info!("No export directory configured; export disabled");
            None
        }
    };

    let dashboard = Arc::new(Dashboard::new(source, config.language, config.species_match));

    match dashboard.refresh().await {
        Ok(summary) => info!(
            "✓ Initial load: {} records, {} species, {} admin units",
            summary.records, summary.species, summary.admin_units
        ),
        Err(e) => error!("Initial load failed: {}", e),
    }

    let state = AppState::new(dashboard, export_sink);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("pffp-dashboard listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
