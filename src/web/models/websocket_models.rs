use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analytics::{ClusterStats, ScoringProfile};
use crate::models::MetricSample;

/// One producer-loop cycle: the full enriched snapshot, best score first.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OverviewPush {
    pub servers: Vec<MetricSample>,
    pub cluster_stats: ClusterStats,
    pub profile: ScoringProfile,
    pub generated_at: DateTime<Utc>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum WsMessage {
    OverviewUpdate(OverviewPush),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_overview_update_envelope() {
        let servers = vec![MetricSample::new("node-1").with_score(75.0)];
        let cluster_stats = ClusterStats::from_scored(&servers, ScoringProfile::HighConcurrency);
        let message = WsMessage::OverviewUpdate(OverviewPush {
            servers,
            cluster_stats,
            profile: ScoringProfile::HighConcurrency,
            generated_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        });

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "overview_update");
        assert_eq!(value["data"]["profile"], "high_concurrency");
        assert_eq!(value["data"]["servers"][0]["server_name"], "node-1");
        assert_eq!(value["data"]["servers"][0]["score"], 75.0);
        assert_eq!(value["data"]["clusterStats"]["best_server"], "node-1");
        assert_eq!(value["data"]["generatedAt"], "2023-11-14T22:13:20Z");
    }
}
