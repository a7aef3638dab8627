use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::percentile::{Severity, Thresholds};
use crate::models::{AggregatedFlowPoint, FlowMode, FlowRecord};

pub const BYTES_PER_MB: f64 = 1_048_576.0;

/// Groups device records by exact timestamp and sums their in/out rates.
///
/// One point per distinct timestamp, ascending, in MB/s. Records without a
/// timestamp are dropped.
pub fn aggregate_flow_series(records: &[FlowRecord], mode: FlowMode) -> Vec<AggregatedFlowPoint> {
    let mut buckets: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
    for record in records.iter().filter(|r| r.timestamp > 0) {
        let (input, output) = record.directional_rates(mode);
        let bucket = buckets.entry(record.timestamp).or_insert((0.0, 0.0));
        bucket.0 += input;
        bucket.1 += output;
    }

    buckets
        .into_iter()
        .map(|(timestamp, (input_bytes, output_bytes))| {
            let input = input_bytes / BYTES_PER_MB;
            let output = output_bytes / BYTES_PER_MB;
            AggregatedFlowPoint {
                timestamp,
                input,
                output,
                total: input + output,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowThresholds {
    pub input: Thresholds,
    pub output: Thresholds,
    pub total: Thresholds,
}

impl FlowThresholds {
    pub fn from_points(points: &[AggregatedFlowPoint]) -> Self {
        let series = |pick: fn(&AggregatedFlowPoint) -> f64| -> Vec<f64> {
            points.iter().map(pick).collect()
        };
        Self {
            input: Thresholds::from_series(&series(|p| p.input)),
            output: Thresholds::from_series(&series(|p| p.output)),
            total: Thresholds::from_series(&series(|p| p.total)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowPointSeverity {
    pub timestamp: i64,
    pub input: Severity,
    pub output: Severity,
    pub total: Severity,
}

/// Aggregated series of one flow query with its anomaly thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowInsight {
    pub mode: FlowMode,
    pub points: Vec<AggregatedFlowPoint>,
    pub thresholds: FlowThresholds,
    pub severities: Vec<FlowPointSeverity>,
}

pub fn analyze_flow(records: &[FlowRecord], mode: FlowMode) -> FlowInsight {
    let points = aggregate_flow_series(records, mode);
    let thresholds = FlowThresholds::from_points(&points);
    let severities = points
        .iter()
        .map(|p| FlowPointSeverity {
            timestamp: p.timestamp,
            input: thresholds.input.classify(p.input),
            output: thresholds.output.classify(p.output),
            total: thresholds.total.classify(p.total),
        })
        .collect();

    FlowInsight {
        mode,
        points,
        thresholds,
        severities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(device: &str, timestamp: i64, rcv: f64, snd: f64) -> FlowRecord {
        FlowRecord {
            server_name: "node-1".into(),
            device_name: device.into(),
            timestamp,
            rcv_bytes_rate: rcv,
            snd_bytes_rate: snd,
            ..Default::default()
        }
    }

    #[test]
    fn test_devices_at_same_timestamp_are_summed() {
        let records = vec![
            net("eth0", 100, 1_048_576.0, 0.0),
            net("eth1", 100, 2_097_152.0, 524_288.0),
        ];
        let points = aggregate_flow_series(&records, FlowMode::Network);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, 100);
        assert_eq!(points[0].input, 3.0);
        assert_eq!(points[0].output, 0.5);
        assert_eq!(points[0].total, 3.5);
    }

    #[test]
    fn test_points_sorted_and_zero_timestamps_dropped() {
        let records = vec![
            net("eth0", 300, 1_048_576.0, 0.0),
            net("eth0", 0, 9e9, 9e9),
            net("eth0", 100, 0.0, 1_048_576.0),
            net("eth0", 200, 0.0, 0.0),
        ];
        let points = aggregate_flow_series(&records, FlowMode::Network);
        let timestamps: Vec<i64> = points.iter().map(|p| p.timestamp).collect();
        assert_eq!(timestamps, vec![100, 200, 300]);
    }

    #[test]
    fn test_disk_mode_uses_read_write_rates() {
        let record = FlowRecord {
            timestamp: 10,
            read_bytes_per_sec: 1_048_576.0,
            write_bytes_per_sec: 2_097_152.0,
            rcv_bytes_rate: 5e9,
            ..Default::default()
        };
        let points = aggregate_flow_series(&[record], FlowMode::Disk);
        assert_eq!(points[0].input, 1.0);
        assert_eq!(points[0].output, 2.0);
        assert_eq!(points[0].total, 3.0);
    }

    #[test]
    fn test_empty_flow_is_degenerate_but_safe() {
        let insight = analyze_flow(&[], FlowMode::Network);
        assert!(insight.points.is_empty());
        assert!(insight.severities.is_empty());
        assert_eq!(insight.thresholds, FlowThresholds::default());
    }

    #[test]
    fn test_analyze_flow_flags_the_spike() {
        let mut records: Vec<FlowRecord> = (1..=9)
            .map(|i| net("eth0", i, 1_048_576.0, 1_048_576.0))
            .collect();
        records.push(net("eth0", 10, 10.0 * 1_048_576.0, 1_048_576.0));

        let insight = analyze_flow(&records, FlowMode::Network);
        // 10 points: warn rank floor(9 * 0.9) = 8, critical rank floor(9 * 0.98) = 8
        assert_eq!(insight.thresholds.input, Thresholds::new(1.0, 1.0));
        assert_eq!(insight.severities.len(), 10);
        assert_eq!(insight.severities[9].input, Severity::Critical);
        assert_eq!(insight.severities[9].total, Severity::Critical);
        // Every point sits at the output threshold.
        assert!(insight.severities.iter().all(|s| s.output == Severity::Critical));
    }
}
