use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::metric_sample::MetricSample;
use super::serde_helpers::{lenient_f64, lenient_opt_f64, lenient_string, lenient_timestamp};

const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// The window of length `lookback` that ends at `end_time`.
    pub fn ending_at(end_time: DateTime<Utc>, lookback: std::time::Duration) -> Self {
        let lookback = TimeDelta::from_std(lookback).unwrap_or(TimeDelta::zero());
        Self {
            start_time: end_time - lookback,
            end_time,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start_time < self.end_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Page numbers start at 1; a zero page or page size falls back to the defaults.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: if self.page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                self.page_size
            },
        }
    }

    pub fn offset(&self) -> usize {
        let normalized = self.normalized();
        (normalized.page as usize - 1) * normalized.page_size as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

impl SortOrder {
    /// Upstream wire code: `0` descending, `1` ascending.
    pub fn code(&self) -> i32 {
        match self {
            SortOrder::Desc => 0,
            SortOrder::Asc => 1,
        }
    }
}

/// Parameters shared by the paged detail queries. An empty `server_name` means all nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailQuery {
    pub server_name: String,
    pub time_range: TimeRange,
    pub pagination: Pagination,
}

/// A page of upstream results together with the upstream's total row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64) -> Self {
        Self { items, total_count }
    }
}

/// A time-bucketed performance row with per-field rates of change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrendRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub server_name: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cpu_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mem_used_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub disk_util_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub load_avg_1: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub send_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rcv_rate: f64,
    #[serde(
        default,
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cpu_percent_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mem_used_percent_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub disk_util_percent_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub load_avg_1_rate: f64,
}

impl TrendRecord {
    /// The scoring inputs of this row, viewed as a sample.
    pub fn as_sample(&self) -> MetricSample {
        MetricSample {
            cpu_percent: self.cpu_percent,
            mem_used_percent: self.mem_used_percent,
            disk_util_percent: self.disk_util_percent,
            load_avg_1: self.load_avg_1,
            send_rate: self.send_rate,
            rcv_rate: self.rcv_rate,
            ..MetricSample::new(self.server_name.clone())
        }
    }
}

/// Caller-supplied limits for the upstream anomaly query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyThresholds {
    pub cpu_threshold: f64,
    pub mem_threshold: f64,
    pub disk_threshold: f64,
    pub change_rate_threshold: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            cpu_threshold: 80.0,
            mem_threshold: 90.0,
            disk_threshold: 85.0,
            change_rate_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnomalyRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub server_name: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub anomaly_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub severity: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub threshold: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub metric_name: String,
}
