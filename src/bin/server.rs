use std::sync::Arc;

use clap::Parser;
use clusterpulse::analytics::ScoringProfile;
use clusterpulse::server::config::ServerConfig;
use clusterpulse::server::overview_broadcaster::OverviewBroadcaster;
use clusterpulse::telemetry::{HttpTelemetryClient, TelemetryQueryService};
use clusterpulse::version::VERSION;
use clusterpulse::web::models::websocket_models::WsMessage;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Scoring profile to start with, overriding the configuration
    #[arg(short, long)]
    profile: Option<ScoringProfile>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

/// Reports each published overview in the log, the way a WebSocket client would receive it.
fn spawn_overview_logger(mut rx: broadcast::Receiver<WsMessage>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(WsMessage::OverviewUpdate(push)) => {
                    let stats = &push.cluster_stats;
                    info!(
                        profile = %push.profile,
                        total = stats.total_servers,
                        online = stats.online_servers,
                        offline = stats.offline_servers,
                        avg_score = stats.avg_score,
                        best = %stats.best_server,
                        worst = %stats.worst_server,
                        "Cluster overview updated."
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Overview logger lagged behind.");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Manually check for --version before full parsing to keep the original simple output.
    if std::env::args().any(|arg| arg == "--version") {
        println!("Server version: {VERSION}");
        return Ok(());
    }

    let args = Args::parse();

    let mut config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };
    if let Some(profile) = args.profile {
        config.scoring_profile = profile;
    }

    init_logging(&config.log_dir);
    info!("Starting server, version: {}", VERSION);
    info!(
        telemetry_url = %config.telemetry_url,
        profile = %config.scoring_profile,
        push_interval_ms = config.push_interval_ms,
        "Configuration loaded."
    );

    let client: Arc<dyn TelemetryQueryService> =
        match HttpTelemetryClient::new(&config.telemetry_url, config.request_timeout()) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!(error = %e, "Failed to build telemetry client.");
                return Err(e.into());
            }
        };

    let (ws_broadcaster_tx, ws_broadcaster_rx) = broadcast::channel::<WsMessage>(config.push_channel_capacity);
    let (_profile_tx, profile_rx) = watch::channel(config.scoring_profile);

    spawn_overview_logger(ws_broadcaster_rx);

    let broadcaster = OverviewBroadcaster::from_config(client, ws_broadcaster_tx, profile_rx, &config);
    let broadcaster_handle = broadcaster.run();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Stopping overview broadcaster.");
    broadcaster_handle.abort();

    Ok(())
}
