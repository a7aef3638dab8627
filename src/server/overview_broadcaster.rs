use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, broadcast, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::analytics::ScoringProfile;
use crate::server::config::ServerConfig;
use crate::server::net_rate_enricher::NetRateEnricher;
use crate::server::snapshot::collect_overview;
use crate::telemetry::{TelemetryQueryService, TelemetryResult};
use crate::web::models::websocket_models::{OverviewPush, WsMessage};

/// Periodically builds the cluster overview and pushes it to WebSocket subscribers.
///
/// At most one cycle is in flight: a tick that fires while the previous cycle
/// is still running is dropped, not queued.
pub struct OverviewBroadcaster {
    client: Arc<dyn TelemetryQueryService>,
    enricher: NetRateEnricher,
    /// Broadcasts overview snapshots to all connected WebSocket clients.
    ws_broadcaster: broadcast::Sender<WsMessage>,
    /// Profile selected by the user; read once at the start of each cycle.
    profile_rx: watch::Receiver<ScoringProfile>,
    push_interval: Duration,
    request_timeout: Duration,
    cycle_lock: Arc<Mutex<()>>,
}

impl OverviewBroadcaster {
    pub fn new(
        client: Arc<dyn TelemetryQueryService>,
        enricher: NetRateEnricher,
        ws_broadcaster: broadcast::Sender<WsMessage>,
        profile_rx: watch::Receiver<ScoringProfile>,
        push_interval: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            enricher,
            ws_broadcaster,
            profile_rx,
            push_interval,
            request_timeout,
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_config(
        client: Arc<dyn TelemetryQueryService>,
        ws_broadcaster: broadcast::Sender<WsMessage>,
        profile_rx: watch::Receiver<ScoringProfile>,
        config: &ServerConfig,
    ) -> Self {
        let enricher = NetRateEnricher::from_config(Arc::clone(&client), config);
        Self::new(
            client,
            enricher,
            ws_broadcaster,
            profile_rx,
            config.push_interval(),
            config.request_timeout(),
        )
    }

    /// Starts the producer loop. Each accepted tick runs its cycle on its own task
    /// so the interval keeps firing while a slow cycle is in flight.
    ///
    /// Cycles are owned by the loop task: aborting the returned handle also
    /// aborts the cycle in flight, so nothing is published after shutdown.
    pub fn run(self) -> JoinHandle<()> {
        let this = Arc::new(self);
        tokio::spawn(async move {
            let mut interval = time::interval(this.push_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval_ms = this.push_interval.as_millis() as u64, "OverviewBroadcaster started.");

            let mut cycles = JoinSet::new();
            loop {
                interval.tick().await;
                while cycles.try_join_next().is_some() {}

                let Some(guard) = this.try_begin_cycle() else {
                    debug!("Previous overview cycle still running. Skipping tick.");
                    continue;
                };
                let profile = *this.profile_rx.borrow();
                let cycle = Arc::clone(&this);
                cycles.spawn(async move {
                    let _guard = guard;
                    cycle.tick(profile).await;
                });
            }
        })
    }

    /// Claims the single cycle slot, or `None` if a cycle is already running.
    pub fn try_begin_cycle(&self) -> Option<OwnedMutexGuard<()>> {
        Arc::clone(&self.cycle_lock).try_lock_owned().ok()
    }

    /// Fetch, enrich, score and roll up one snapshot under `profile`.
    pub async fn run_cycle(&self, profile: ScoringProfile) -> TelemetryResult<OverviewPush> {
        let overview = collect_overview(self.client.as_ref(), &self.enricher, self.request_timeout, profile).await?;

        Ok(OverviewPush {
            servers: overview.servers,
            cluster_stats: overview.cluster_stats,
            profile,
            generated_at: Utc::now(),
        })
    }

    /// Runs one cycle and publishes it. Returns whether a message was produced.
    pub async fn tick(&self, profile: ScoringProfile) -> bool {
        match self.run_cycle(profile).await {
            Ok(push) => {
                debug!(
                    servers = push.cluster_stats.total_servers,
                    avg_score = push.cluster_stats.avg_score,
                    profile = %profile,
                    "Overview cycle complete."
                );
                self.publish(push);
                true
            }
            Err(e) => {
                warn!(error = %e, "Overview cycle failed. Skipping this tick.");
                false
            }
        }
    }

    fn publish(&self, push: OverviewPush) {
        if self.ws_broadcaster.receiver_count() == 0 {
            debug!("No overview subscribers. Dropping snapshot.");
            return;
        }
        if let Err(e) = self.ws_broadcaster.send(WsMessage::OverviewUpdate(push)) {
            debug!("Failed to broadcast overview update (no subscribers?): {}", e);
        }
    }
}
