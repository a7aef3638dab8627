//! Pure scoring, rollup and threshold computations. Nothing here performs I/O.

pub mod cluster_stats;
pub mod flow_series;
pub mod percentile;
pub mod profile;
pub mod rank;
pub mod score;

pub use cluster_stats::{ClusterStats, rollup};
pub use flow_series::{FlowInsight, FlowPointSeverity, FlowThresholds, aggregate_flow_series, analyze_flow};
pub use percentile::{Severity, Thresholds, classify, percentile};
pub use profile::{ProfileWeights, ScoringProfile, UnknownProfile};
pub use rank::{rank_by_profile, sort_by_score};
pub use score::{compute_score, score_samples, score_with_weights};
