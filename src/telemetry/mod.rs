//! Access to the Telemetry Query Service.
//!
//! Everything upstream of the analytics core goes through [`TelemetryQueryService`],
//! so the producer loop and the on-demand operations can run against the HTTP
//! gateway in production and an in-memory fake in tests.

pub mod error;
pub mod http_client;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

pub use error::{TelemetryError, TelemetryResult, with_timeout};
pub use http_client::HttpTelemetryClient;

use crate::models::{
    AnomalyRecord, AnomalyThresholds, DetailQuery, FlowMode, FlowRecord, MemRecord, MetricSample,
    Page, Pagination, PerformanceRecord, SoftIrqRecord, SortOrder, TimeRange, TrendRecord,
};

#[async_trait]
pub trait TelemetryQueryService: Send + Sync {
    /// Current snapshot of every known node.
    async fn latest_scores(&self) -> TelemetryResult<Vec<MetricSample>>;

    /// Device-level network or disk rates for one node (or all, when the name is empty).
    async fn flow_detail(&self, mode: FlowMode, query: &DetailQuery) -> TelemetryResult<Page<FlowRecord>>;

    async fn trend_aggregate(
        &self,
        server_name: &str,
        time_range: &TimeRange,
        interval_seconds: u32,
    ) -> TelemetryResult<Vec<TrendRecord>>;

    async fn anomaly_query(
        &self,
        query: &DetailQuery,
        thresholds: &AnomalyThresholds,
    ) -> TelemetryResult<Page<AnomalyRecord>>;

    /// Nodes ordered by the score the upstream last computed.
    async fn score_rank(&self, order: SortOrder, pagination: Pagination) -> TelemetryResult<Page<MetricSample>>;

    /// Raw stored performance rows, oldest first, as used by the history charts.
    async fn performance(&self, query: &DetailQuery) -> TelemetryResult<Page<PerformanceRecord>>;

    async fn mem_detail(&self, query: &DetailQuery) -> TelemetryResult<Page<MemRecord>>;

    async fn softirq_detail(&self, query: &DetailQuery) -> TelemetryResult<Page<SoftIrqRecord>>;
}
