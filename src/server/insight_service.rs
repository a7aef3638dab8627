use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::analytics::{FlowInsight, ScoringProfile, analyze_flow, compute_score, rank_by_profile};
use crate::models::{
    AnomalyRecord, AnomalyThresholds, DetailQuery, FlowMode, MemRecord, MetricSample, Page,
    Pagination, PerformanceRecord, SoftIrqRecord, SortOrder, TimeRange, TrendRecord,
};
use crate::server::config::ServerConfig;
use crate::server::net_rate_enricher::NetRateEnricher;
use crate::server::snapshot::{Overview, collect_overview, enriched_latest};
use crate::telemetry::{TelemetryError, TelemetryQueryService, TelemetryResult, with_timeout};

/// Bucket width used when a trend request does not name one.
pub const DEFAULT_TREND_INTERVAL_SECS: u32 = 300;

/// User-triggered queries. Stateless: every call stands alone, is bounded by
/// `request_timeout`, and reports failures only to its caller.
#[derive(Clone)]
pub struct InsightService {
    client: Arc<dyn TelemetryQueryService>,
    enricher: NetRateEnricher,
    request_timeout: Duration,
}

impl InsightService {
    pub fn new(client: Arc<dyn TelemetryQueryService>, enricher: NetRateEnricher, request_timeout: Duration) -> Self {
        Self {
            client,
            enricher,
            request_timeout,
        }
    }

    pub fn from_config(client: Arc<dyn TelemetryQueryService>, config: &ServerConfig) -> Self {
        let enricher = NetRateEnricher::from_config(Arc::clone(&client), config);
        Self::new(client, enricher, config.request_timeout())
    }

    /// Latest snapshot, network rates refreshed, scored under `profile`, best
    /// first, with its rollup. Same pipeline as the pushed overview.
    pub async fn overview(&self, profile: ScoringProfile) -> TelemetryResult<Overview> {
        collect_overview(self.client.as_ref(), &self.enricher, self.request_timeout, profile).await
    }

    /// Ranks the latest snapshot under `profile`. Without a profile the
    /// upstream's own ranking is returned as is.
    pub async fn score_rank(
        &self,
        order: SortOrder,
        pagination: Pagination,
        profile: Option<ScoringProfile>,
    ) -> TelemetryResult<Page<MetricSample>> {
        match profile {
            Some(profile) => {
                let samples = enriched_latest(self.client.as_ref(), &self.enricher, self.request_timeout).await?;
                Ok(rank_by_profile(samples, profile, order, pagination))
            }
            None => {
                with_timeout(
                    self.request_timeout,
                    self.client.score_rank(order, pagination.normalized()),
                )
                .await
            }
        }
    }

    /// Time-bucketed trend rows for one node, each rescored under `profile`.
    pub async fn trend(
        &self,
        server_name: &str,
        time_range: &TimeRange,
        interval_seconds: u32,
        profile: ScoringProfile,
    ) -> TelemetryResult<Vec<TrendRecord>> {
        if server_name.trim().is_empty() {
            return Err(TelemetryError::InvalidArgument("server_name is required".into()));
        }
        validate_range(time_range)?;
        let interval_seconds = if interval_seconds == 0 {
            DEFAULT_TREND_INTERVAL_SECS
        } else {
            interval_seconds
        };

        let records = with_timeout(
            self.request_timeout,
            self.client.trend_aggregate(server_name, time_range, interval_seconds),
        )
        .await?;
        debug!(server_name = %server_name, records = records.len(), "Trend query complete.");

        Ok(records
            .into_iter()
            .map(|record| {
                let score = compute_score(&record.as_sample(), profile);
                TrendRecord {
                    score: Some(score),
                    ..record
                }
            })
            .collect())
    }

    pub async fn anomalies(
        &self,
        server_name: &str,
        time_range: &TimeRange,
        thresholds: &AnomalyThresholds,
        pagination: Pagination,
    ) -> TelemetryResult<Page<AnomalyRecord>> {
        let query = detail_query(server_name, time_range, pagination)?;
        with_timeout(self.request_timeout, self.client.anomaly_query(&query, thresholds)).await
    }

    /// Aggregated network or disk series for a window, with p90/p98 severities.
    pub async fn flow_insight(
        &self,
        mode: FlowMode,
        server_name: &str,
        time_range: &TimeRange,
        pagination: Pagination,
    ) -> TelemetryResult<FlowInsight> {
        let query = detail_query(server_name, time_range, pagination)?;
        let page = with_timeout(self.request_timeout, self.client.flow_detail(mode, &query)).await?;
        Ok(analyze_flow(&page.items, mode))
    }

    /// Paged raw performance history of one node (or all nodes), for charting.
    pub async fn performance(
        &self,
        server_name: &str,
        time_range: &TimeRange,
        pagination: Pagination,
    ) -> TelemetryResult<Page<PerformanceRecord>> {
        let query = detail_query(server_name, time_range, pagination)?;
        with_timeout(self.request_timeout, self.client.performance(&query)).await
    }

    pub async fn mem_detail(
        &self,
        server_name: &str,
        time_range: &TimeRange,
        pagination: Pagination,
    ) -> TelemetryResult<Page<MemRecord>> {
        let query = detail_query(server_name, time_range, pagination)?;
        with_timeout(self.request_timeout, self.client.mem_detail(&query)).await
    }

    pub async fn softirq_detail(
        &self,
        server_name: &str,
        time_range: &TimeRange,
        pagination: Pagination,
    ) -> TelemetryResult<Page<SoftIrqRecord>> {
        let query = detail_query(server_name, time_range, pagination)?;
        with_timeout(self.request_timeout, self.client.softirq_detail(&query)).await
    }
}

fn validate_range(time_range: &TimeRange) -> TelemetryResult<()> {
    if time_range.is_valid() {
        Ok(())
    } else {
        Err(TelemetryError::InvalidArgument(format!(
            "start_time {} must be before end_time {}",
            time_range.start_time, time_range.end_time
        )))
    }
}

fn detail_query(server_name: &str, time_range: &TimeRange, pagination: Pagination) -> TelemetryResult<DetailQuery> {
    validate_range(time_range)?;
    Ok(DetailQuery {
        server_name: server_name.trim().to_string(),
        time_range: *time_range,
        pagination: pagination.normalized(),
    })
}
