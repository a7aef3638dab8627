use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::models::{
    DetailQuery, FlowMode, FlowRecord, MetricSample, NetRateMap, NetRateSample, Pagination, TimeRange,
};
use crate::server::config::ServerConfig;
use crate::telemetry::{TelemetryQueryService, with_timeout};

pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(300);
const DEFAULT_PAGE_SIZE: u32 = 500;
const BYTES_PER_KB: f64 = 1024.0;

/// Looks up the most recent network rate of each node, one concurrent query per node.
///
/// A node whose query fails or exceeds `node_timeout` comes back absent; it
/// never fails the batch.
#[derive(Clone)]
pub struct NetRateEnricher {
    client: Arc<dyn TelemetryQueryService>,
    lookback: Duration,
    node_timeout: Duration,
    page_size: u32,
}

impl NetRateEnricher {
    pub fn new(client: Arc<dyn TelemetryQueryService>, node_timeout: Duration) -> Self {
        Self {
            client,
            lookback: DEFAULT_LOOKBACK,
            node_timeout,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn from_config(client: Arc<dyn TelemetryQueryService>, config: &ServerConfig) -> Self {
        Self {
            client,
            lookback: config.net_rate_lookback(),
            node_timeout: config.node_timeout(),
            page_size: config.net_rate_page_size,
        }
    }

    pub async fn enrich(&self, server_names: &[String]) -> NetRateMap {
        self.enrich_at(server_names, Utc::now()).await
    }

    /// Same as [`enrich`](Self::enrich) with the lookback window ending at `now`.
    pub async fn enrich_at(&self, server_names: &[String], now: DateTime<Utc>) -> NetRateMap {
        let window = TimeRange::ending_at(now, self.lookback);
        let lookups = server_names.iter().map(|name| self.lookup(name, window));
        let results = join_all(lookups).await;

        let rates: NetRateMap = server_names.iter().cloned().zip(results).collect();
        debug!(
            nodes = rates.len(),
            absent = ?rates.absent_nodes(),
            "Net rate enrichment finished."
        );
        rates
    }

    async fn lookup(&self, server_name: &str, window: TimeRange) -> Option<NetRateSample> {
        let query = DetailQuery {
            server_name: server_name.to_string(),
            time_range: window,
            pagination: Pagination::new(1, self.page_size),
        };
        match with_timeout(self.node_timeout, self.client.flow_detail(FlowMode::Network, &query)).await {
            Ok(page) => latest_net_rate(&page.items),
            Err(e) => {
                warn!(server_name = %server_name, error = %e, "Net rate lookup failed. Node rates default to zero.");
                None
            }
        }
    }
}

/// Receive/send totals (kB/s) across all devices at the most recent timestamp.
pub fn latest_net_rate(records: &[FlowRecord]) -> Option<NetRateSample> {
    let latest = records.iter().map(|r| r.timestamp).filter(|ts| *ts > 0).max()?;
    let (rcv_bytes, send_bytes) = records
        .iter()
        .filter(|r| r.timestamp == latest)
        .map(|r| r.directional_rates(FlowMode::Network))
        .fold((0.0, 0.0), |(rcv, send), (i, o)| (rcv + i, send + o));

    Some(NetRateSample {
        timestamp: latest,
        rcv_rate: rcv_bytes / BYTES_PER_KB,
        send_rate: send_bytes / BYTES_PER_KB,
    })
}

/// Overwrites the rate fields of every sample that was looked up. Samples
/// missing from `rates` keep their own readings.
pub fn apply_net_rates(samples: Vec<MetricSample>, rates: &NetRateMap) -> Vec<MetricSample> {
    if rates.is_empty() {
        return samples;
    }
    samples
        .into_iter()
        .map(|sample| match rates.get(&sample.server_name) {
            Some(rate) => sample.with_net_rate(rate),
            None => sample,
        })
        .collect()
}
