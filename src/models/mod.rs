pub mod flow;
pub mod host_detail;
pub mod metric_sample;
pub mod query;
pub mod serde_helpers;

pub use flow::{AggregatedFlowPoint, FlowMode, FlowRecord, NetRateMap, NetRateSample};
pub use host_detail::{MemRecord, PerformanceRecord, SoftIrqRecord};
pub use metric_sample::{MetricSample, NodeStatus};
pub use query::{
    AnomalyRecord, AnomalyThresholds, DetailQuery, Page, Pagination, SortOrder, TimeRange,
    TrendRecord,
};
