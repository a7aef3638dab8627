use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{TelemetryError, TelemetryResult};
use super::TelemetryQueryService;
use crate::models::serde_helpers::lenient_u64;
use crate::models::{
    AnomalyRecord, AnomalyThresholds, DetailQuery, FlowMode, FlowRecord, MemRecord, MetricSample,
    Page, Pagination, PerformanceRecord, SoftIrqRecord, SortOrder, TimeRange, TrendRecord,
};

/// Client for the JSON gateway in front of the Telemetry Query Service.
///
/// Each operation is a `POST {base_url}/{Method}` with the request message as
/// JSON. Timestamps travel as `{seconds, nanos}` objects.
#[derive(Debug, Clone)]
pub struct HttpTelemetryClient {
    http: Client,
    base_url: String,
}

#[derive(Serialize)]
struct WireTimestamp {
    seconds: i64,
    nanos: i32,
}

impl From<DateTime<Utc>> for WireTimestamp {
    fn from(time: DateTime<Utc>) -> Self {
        Self {
            seconds: time.timestamp(),
            nanos: 0,
        }
    }
}

#[derive(Serialize)]
struct WireTimeRange {
    start_time: WireTimestamp,
    end_time: WireTimestamp,
}

impl From<&TimeRange> for WireTimeRange {
    fn from(range: &TimeRange) -> Self {
        Self {
            start_time: range.start_time.into(),
            end_time: range.end_time.into(),
        }
    }
}

#[derive(Serialize)]
struct DetailRequest<'a> {
    server_name: &'a str,
    time_range: WireTimeRange,
    pagination: Pagination,
}

impl<'a> From<&'a DetailQuery> for DetailRequest<'a> {
    fn from(query: &'a DetailQuery) -> Self {
        Self {
            server_name: &query.server_name,
            time_range: (&query.time_range).into(),
            pagination: query.pagination,
        }
    }
}

#[derive(Serialize)]
struct TrendRequest<'a> {
    server_name: &'a str,
    time_range: WireTimeRange,
    interval_seconds: u32,
}

#[derive(Serialize)]
struct AnomalyRequest<'a> {
    #[serde(flatten)]
    detail: DetailRequest<'a>,
    #[serde(flatten)]
    thresholds: &'a AnomalyThresholds,
}

#[derive(Serialize)]
struct RankRequest {
    order: i32,
    pagination: Pagination,
}

#[derive(Serialize)]
struct Empty {}

#[derive(Deserialize)]
struct ServersResponse {
    #[serde(default = "Vec::new")]
    servers: Vec<MetricSample>,
    #[serde(default, deserialize_with = "lenient_u64")]
    total_count: u64,
}

#[derive(Deserialize)]
struct RecordsResponse<T> {
    #[serde(default = "Vec::new")]
    records: Vec<T>,
    #[serde(default, deserialize_with = "lenient_u64")]
    total_count: u64,
}

impl<T> From<RecordsResponse<T>> for Page<T> {
    fn from(response: RecordsResponse<T>) -> Self {
        Page::new(response.records, response.total_count)
    }
}

impl HttpTelemetryClient {
    pub fn new(base_url: &str, timeout: Duration) -> TelemetryResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<Req, Resp>(&self, method: &str, request: &Req) -> TelemetryResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        debug!(%url, "Calling telemetry service.");

        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TelemetryError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| TelemetryError::Decode(format!("{method}: {e}")))
    }
}

#[async_trait]
impl TelemetryQueryService for HttpTelemetryClient {
    async fn latest_scores(&self) -> TelemetryResult<Vec<MetricSample>> {
        let response: ServersResponse = self.call("QueryLatestScore", &Empty {}).await?;
        Ok(response.servers)
    }

    async fn flow_detail(&self, mode: FlowMode, query: &DetailQuery) -> TelemetryResult<Page<FlowRecord>> {
        let method = match mode {
            FlowMode::Network => "QueryNetDetail",
            FlowMode::Disk => "QueryDiskDetail",
        };
        let response: RecordsResponse<FlowRecord> = self.call(method, &DetailRequest::from(query)).await?;
        Ok(response.into())
    }

    async fn trend_aggregate(
        &self,
        server_name: &str,
        time_range: &TimeRange,
        interval_seconds: u32,
    ) -> TelemetryResult<Vec<TrendRecord>> {
        let request = TrendRequest {
            server_name,
            time_range: time_range.into(),
            interval_seconds,
        };
        let response: RecordsResponse<TrendRecord> = self.call("QueryTrend", &request).await?;
        Ok(response.records)
    }

    async fn anomaly_query(
        &self,
        query: &DetailQuery,
        thresholds: &AnomalyThresholds,
    ) -> TelemetryResult<Page<AnomalyRecord>> {
        let request = AnomalyRequest {
            detail: query.into(),
            thresholds,
        };
        let response: RecordsResponse<AnomalyRecord> = self.call("QueryAnomaly", &request).await?;
        Ok(response.into())
    }

    async fn score_rank(&self, order: SortOrder, pagination: Pagination) -> TelemetryResult<Page<MetricSample>> {
        let request = RankRequest {
            order: order.code(),
            pagination: pagination.normalized(),
        };
        let response: ServersResponse = self.call("QueryScoreRank", &request).await?;
        Ok(Page::new(response.servers, response.total_count))
    }

    async fn performance(&self, query: &DetailQuery) -> TelemetryResult<Page<PerformanceRecord>> {
        let response: RecordsResponse<PerformanceRecord> =
            self.call("QueryPerformance", &DetailRequest::from(query)).await?;
        Ok(response.into())
    }

    async fn mem_detail(&self, query: &DetailQuery) -> TelemetryResult<Page<MemRecord>> {
        let response: RecordsResponse<MemRecord> = self.call("QueryMemDetail", &DetailRequest::from(query)).await?;
        Ok(response.into())
    }

    async fn softirq_detail(&self, query: &DetailQuery) -> TelemetryResult<Page<SoftIrqRecord>> {
        let response: RecordsResponse<SoftIrqRecord> =
            self.call("QuerySoftIrqDetail", &DetailRequest::from(query)).await?;
        Ok(response.into())
    }
}
