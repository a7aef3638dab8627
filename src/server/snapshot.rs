use std::time::Duration;

use serde::Serialize;

use crate::analytics::{ClusterStats, ScoringProfile, score_samples, sort_by_score};
use crate::models::{MetricSample, SortOrder};
use crate::server::net_rate_enricher::{NetRateEnricher, apply_net_rates};
use crate::telemetry::{TelemetryQueryService, TelemetryResult, with_timeout};

/// A scored cluster snapshot, best node first, with its rollup.
#[derive(Serialize, Clone, Debug)]
pub struct Overview {
    pub servers: Vec<MetricSample>,
    pub cluster_stats: ClusterStats,
}

/// Latest samples with their rate fields replaced by freshly looked-up network rates.
pub async fn enriched_latest(
    client: &dyn TelemetryQueryService,
    enricher: &NetRateEnricher,
    request_timeout: Duration,
) -> TelemetryResult<Vec<MetricSample>> {
    let samples = with_timeout(request_timeout, client.latest_scores()).await?;
    let server_names: Vec<String> = samples.iter().map(|s| s.server_name.clone()).collect();
    let rates = enricher.enrich(&server_names).await;
    Ok(apply_net_rates(samples, &rates))
}

/// Fetch, enrich, score and roll up one snapshot under `profile`.
pub async fn collect_overview(
    client: &dyn TelemetryQueryService,
    enricher: &NetRateEnricher,
    request_timeout: Duration,
    profile: ScoringProfile,
) -> TelemetryResult<Overview> {
    let samples = enriched_latest(client, enricher, request_timeout).await?;
    let mut servers = score_samples(samples, profile);
    let cluster_stats = ClusterStats::from_scored(&servers, profile);
    sort_by_score(&mut servers, SortOrder::Desc);
    Ok(Overview {
        servers,
        cluster_stats,
    })
}
