use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use market_session::SessionConfig;
use market_session::diagnostics::{DiagnosticSink, TracingSink};
use market_session::orchestrator::dry_run::DryRunRefresher;
use market_session::orchestrator::update_orchestrator::UpdateOrchestrator;
use market_session::run_mode::RunMode;
use market_session::session::MarketSession;

#[derive(Debug, Clone, Parser)]
struct Args {
    #[arg(long, value_enum, default_value = "status")]
    pub mode: RunMode,

    #[arg(long, default_value = SessionConfig::FILE_NAME)]
    pub config: PathBuf,

    #[arg(long, value_delimiter = ',', default_value = "AAPL,MSFT")]
    pub symbols: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("market_session=debug".parse()?),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = if args.config.exists() {
        SessionConfig::load(&args.config)?
    } else {
        warn!(path = %args.config.display(), "session config not found; using defaults");
        SessionConfig::default()
    };

    let sink: Arc<dyn DiagnosticSink> = Arc::new(TracingSink);
    let session = Arc::new(MarketSession::from_config(&config, sink)?);

    match args.mode {
        RunMode::Status => {
            println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
        }
        RunMode::Watch => {
            let (shutdown_sender, shutdown_receiver) = watch::channel(false);

            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupt received; shutting down");
                    let _ = shutdown_sender.send(true);
                }
            });

            let refresher = Arc::new(DryRunRefresher::new(args.symbols));
            UpdateOrchestrator::new(session, refresher)
                .run(shutdown_receiver)
                .await?;
        }
    }

    Ok(())
}
