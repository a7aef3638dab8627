use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{TelemetryError, TelemetryQueryService, TelemetryResult};
use crate::models::{
    AnomalyRecord, AnomalyThresholds, DetailQuery, FlowMode, FlowRecord, MemRecord, MetricSample,
    Page, Pagination, PerformanceRecord, SoftIrqRecord, SortOrder, TimeRange, TrendRecord,
};

/// What the fake answers to one node's flow query.
#[derive(Debug, Clone)]
pub(crate) enum FlowOutcome {
    Records(Vec<FlowRecord>),
    Fail,
    Hang,
}

/// In-memory telemetry service with scripted answers and call accounting.
#[derive(Debug)]
pub(crate) struct FakeTelemetry {
    latest: TelemetryResult<Vec<MetricSample>>,
    latest_delay: Duration,
    flows: HashMap<String, FlowOutcome>,
    flow_delay: Duration,
    pub trend: Vec<TrendRecord>,
    pub anomalies: Vec<AnomalyRecord>,
    pub rank: Vec<MetricSample>,
    pub performance: Vec<PerformanceRecord>,
    pub mem: Vec<MemRecord>,
    pub softirq: Vec<SoftIrqRecord>,
    latest_calls: AtomicUsize,
    flow_calls: AtomicUsize,
    flows_in_flight: AtomicUsize,
    max_flows_in_flight: AtomicUsize,
    upstream_calls: AtomicUsize,
    last_flow_query: Mutex<Option<DetailQuery>>,
}

impl FakeTelemetry {
    pub fn new(latest: Vec<MetricSample>) -> Self {
        Self {
            latest: Ok(latest),
            latest_delay: Duration::ZERO,
            flows: HashMap::new(),
            flow_delay: Duration::ZERO,
            trend: Vec::new(),
            anomalies: Vec::new(),
            rank: Vec::new(),
            performance: Vec::new(),
            mem: Vec::new(),
            softirq: Vec::new(),
            latest_calls: AtomicUsize::new(0),
            flow_calls: AtomicUsize::new(0),
            flows_in_flight: AtomicUsize::new(0),
            max_flows_in_flight: AtomicUsize::new(0),
            upstream_calls: AtomicUsize::new(0),
            last_flow_query: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            latest: Err(TelemetryError::Transport("connection refused".into())),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_flow(mut self, server_name: &str, outcome: FlowOutcome) -> Self {
        self.flows.insert(server_name.to_string(), outcome);
        self
    }

    pub fn with_latest_delay(mut self, delay: Duration) -> Self {
        self.latest_delay = delay;
        self
    }

    pub fn with_flow_delay(mut self, delay: Duration) -> Self {
        self.flow_delay = delay;
        self
    }

    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    pub fn flow_calls(&self) -> usize {
        self.flow_calls.load(Ordering::SeqCst)
    }

    pub fn max_flows_in_flight(&self) -> usize {
        self.max_flows_in_flight.load(Ordering::SeqCst)
    }

    /// Every call that reached the fake, of any kind.
    pub fn upstream_calls(&self) -> usize {
        self.upstream_calls.load(Ordering::SeqCst)
    }

    pub fn last_flow_query(&self) -> Option<DetailQuery> {
        self.last_flow_query.lock().unwrap().clone()
    }

    /// Rows of `records` belonging to the queried node, sliced to the requested page.
    fn detail_page<T: Clone>(&self, records: &[T], query: &DetailQuery, server_name: impl Fn(&T) -> &str) -> Page<T> {
        self.upstream_calls.fetch_add(1, Ordering::SeqCst);
        let matching: Vec<T> = records
            .iter()
            .filter(|r| query.server_name.is_empty() || server_name(r) == query.server_name)
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let pagination = query.pagination.normalized();
        let items = matching
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.page_size as usize)
            .collect();
        Page::new(items, total)
    }
}

#[async_trait]
impl TelemetryQueryService for FakeTelemetry {
    async fn latest_scores(&self) -> TelemetryResult<Vec<MetricSample>> {
        self.upstream_calls.fetch_add(1, Ordering::SeqCst);
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        if !self.latest_delay.is_zero() {
            tokio::time::sleep(self.latest_delay).await;
        }
        self.latest.clone()
    }

    async fn flow_detail(&self, _mode: FlowMode, query: &DetailQuery) -> TelemetryResult<Page<FlowRecord>> {
        self.upstream_calls.fetch_add(1, Ordering::SeqCst);
        self.flow_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_flow_query.lock().unwrap() = Some(query.clone());

        let in_flight = self.flows_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_flows_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if !self.flow_delay.is_zero() {
            tokio::time::sleep(self.flow_delay).await;
        }

        let outcome = self
            .flows
            .get(&query.server_name)
            .cloned()
            .unwrap_or(FlowOutcome::Records(Vec::new()));
        let result = match outcome {
            FlowOutcome::Records(records) => {
                let total = records.len() as u64;
                Ok(Page::new(records, total))
            }
            FlowOutcome::Fail => Err(TelemetryError::Upstream {
                status: 500,
                message: format!("no data for {}", query.server_name),
            }),
            FlowOutcome::Hang => std::future::pending().await,
        };
        self.flows_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn trend_aggregate(
        &self,
        server_name: &str,
        _time_range: &TimeRange,
        _interval_seconds: u32,
    ) -> TelemetryResult<Vec<TrendRecord>> {
        self.upstream_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .trend
            .iter()
            .filter(|r| r.server_name == server_name)
            .cloned()
            .collect())
    }

    async fn anomaly_query(
        &self,
        query: &DetailQuery,
        _thresholds: &AnomalyThresholds,
    ) -> TelemetryResult<Page<AnomalyRecord>> {
        self.upstream_calls.fetch_add(1, Ordering::SeqCst);
        let items: Vec<AnomalyRecord> = self
            .anomalies
            .iter()
            .filter(|r| query.server_name.is_empty() || r.server_name == query.server_name)
            .cloned()
            .collect();
        let total = items.len() as u64;
        Ok(Page::new(items, total))
    }

    async fn score_rank(&self, _order: SortOrder, _pagination: Pagination) -> TelemetryResult<Page<MetricSample>> {
        self.upstream_calls.fetch_add(1, Ordering::SeqCst);
        let total = self.rank.len() as u64;
        Ok(Page::new(self.rank.clone(), total))
    }

    async fn performance(&self, query: &DetailQuery) -> TelemetryResult<Page<PerformanceRecord>> {
        Ok(self.detail_page(&self.performance, query, |r| r.server_name.as_str()))
    }

    async fn mem_detail(&self, query: &DetailQuery) -> TelemetryResult<Page<MemRecord>> {
        Ok(self.detail_page(&self.mem, query, |r| r.server_name.as_str()))
    }

    async fn softirq_detail(&self, query: &DetailQuery) -> TelemetryResult<Page<SoftIrqRecord>> {
        Ok(self.detail_page(&self.softirq, query, |r| r.server_name.as_str()))
    }
}
