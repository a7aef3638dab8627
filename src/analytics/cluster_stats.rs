use serde::{Deserialize, Serialize};

use super::profile::ScoringProfile;
use super::score::score_with_weights;
use crate::models::MetricSample;

/// Cluster-wide rollup of one snapshot. Always rebuilt from scratch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterStats {
    pub total_servers: usize,
    pub online_servers: usize,
    pub offline_servers: usize,
    pub avg_score: f64,
    pub max_score: f64,
    pub min_score: f64,
    pub best_server: String,
    pub worst_server: String,
    pub profile: ScoringProfile,
}

impl ClusterStats {
    /// Rolls up samples that already carry a score; a missing score counts as `0`.
    pub fn from_scored(samples: &[MetricSample], profile: ScoringProfile) -> Self {
        aggregate(
            samples.iter().map(|s| {
                let score = s.score.filter(|v| v.is_finite()).unwrap_or(0.0);
                (s, score)
            }),
            profile,
        )
    }
}

/// Scores every sample under `profile` and rolls the result up.
pub fn rollup(samples: &[MetricSample], profile: ScoringProfile) -> ClusterStats {
    let weights = profile.weights();
    aggregate(
        samples.iter().map(|s| (s, score_with_weights(s, &weights))),
        profile,
    )
}

fn aggregate<'a>(
    scored: impl Iterator<Item = (&'a MetricSample, f64)>,
    profile: ScoringProfile,
) -> ClusterStats {
    let mut stats = ClusterStats {
        profile,
        ..Default::default()
    };
    let mut total_score = 0.0;
    let mut best: Option<(&str, f64)> = None;
    let mut worst: Option<(&str, f64)> = None;

    for (sample, score) in scored {
        stats.total_servers += 1;
        if sample.is_online() {
            stats.online_servers += 1;
        } else {
            stats.offline_servers += 1;
        }
        total_score += score;

        // Strict comparisons keep the first occurrence among ties.
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((&sample.server_name, score));
        }
        if worst.is_none_or(|(_, bottom)| score < bottom) {
            worst = Some((&sample.server_name, score));
        }
    }

    if stats.total_servers > 0 {
        stats.avg_score = total_score / stats.total_servers as f64;
    }
    if let Some((name, score)) = best {
        stats.best_server = name.to_string();
        stats.max_score = score;
    }
    if let Some((name, score)) = worst {
        stats.worst_server = name.to_string();
        stats.min_score = score;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::score::compute_score;
    use crate::models::NodeStatus;

    fn scored(name: &str, score: f64, status: NodeStatus) -> MetricSample {
        MetricSample {
            status,
            ..MetricSample::new(name)
        }
        .with_score(score)
    }

    #[test]
    fn test_empty_rollup() {
        let stats = rollup(&[], ScoringProfile::IoIntensive);
        assert_eq!(stats.total_servers, 0);
        assert_eq!(stats.avg_score, 0.0);
        assert_eq!(stats.max_score, 0.0);
        assert_eq!(stats.min_score, 0.0);
        assert!(stats.best_server.is_empty());
        assert!(stats.worst_server.is_empty());
        assert_eq!(stats.profile, ScoringProfile::IoIntensive);
    }

    #[test]
    fn test_three_node_rollup() {
        let samples = vec![
            scored("mid", 50.0, NodeStatus::Code(0)),
            scored("top", 90.0, NodeStatus::Label("ONLINE".into())),
            scored("low", 10.0, NodeStatus::Label("OFFLINE".into())),
        ];
        let stats = ClusterStats::from_scored(&samples, ScoringProfile::Balanced);

        assert_eq!(stats.total_servers, 3);
        assert_eq!(stats.online_servers, 2);
        assert_eq!(stats.offline_servers, 1);
        assert_eq!(stats.avg_score, 50.0);
        assert_eq!(stats.max_score, 90.0);
        assert_eq!(stats.min_score, 10.0);
        assert_eq!(stats.best_server, "top");
        assert_eq!(stats.worst_server, "low");
    }

    #[test]
    fn test_ties_keep_first_occurrence() {
        let samples = vec![
            scored("a", 70.0, NodeStatus::Code(0)),
            scored("b", 70.0, NodeStatus::Code(0)),
            scored("c", 20.0, NodeStatus::Code(0)),
            scored("d", 20.0, NodeStatus::Code(0)),
        ];
        let stats = ClusterStats::from_scored(&samples, ScoringProfile::Balanced);
        assert_eq!(stats.best_server, "a");
        assert_eq!(stats.worst_server, "c");
    }

    #[test]
    fn test_rollup_rescores_under_profile() {
        let busy_memory = MetricSample {
            mem_used_percent: 100.0,
            ..MetricSample::new("mem-bound")
        }
        .with_score(100.0);
        let busy_disk = MetricSample {
            disk_util_percent: 100.0,
            ..MetricSample::new("disk-bound")
        };
        let samples = vec![busy_memory, busy_disk];

        let memory_first = rollup(&samples, ScoringProfile::MemorySensitive);
        assert_eq!(memory_first.worst_server, "mem-bound");
        assert!((memory_first.min_score - 55.0).abs() < 1e-9);

        let io_first = rollup(&samples, ScoringProfile::IoIntensive);
        assert_eq!(io_first.worst_server, "disk-bound");
        assert!((io_first.min_score - compute_score(&samples[1], ScoringProfile::IoIntensive)).abs() < 1e-9);
    }

    #[test]
    fn test_unscored_samples_count_as_zero() {
        let samples = vec![MetricSample::new("fresh"), scored("old", 40.0, NodeStatus::Code(0))];
        let stats = ClusterStats::from_scored(&samples, ScoringProfile::Balanced);
        assert_eq!(stats.avg_score, 20.0);
        assert_eq!(stats.worst_server, "fresh");
    }
}
