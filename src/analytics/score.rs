use super::profile::{ProfileWeights, ScoringProfile};
use crate::models::MetricSample;

const BYTES_PER_KB: f64 = 1024.0;
/// Core count the load ceiling is scaled by.
const REFERENCE_CORES: f64 = 4.0;

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn percent(value: f64) -> f64 {
    finite_or_zero(value).clamp(0.0, 100.0)
}

fn non_negative(value: f64) -> f64 {
    finite_or_zero(value).max(0.0)
}

/// Fraction of `ceiling` still unused, in `[0, 1]`.
fn headroom(value: f64, ceiling: f64) -> f64 {
    if ceiling > 0.0 {
        clamp01(1.0 - value / ceiling)
    } else if value > 0.0 {
        0.0
    } else {
        1.0
    }
}

/// Health score in `[0, 100]` of one sample under an explicit weight vector.
///
/// Total over all inputs: non-finite readings count as `0`, percentages are
/// clamped to `[0, 100]` and loads/rates to `>= 0`.
pub fn score_with_weights(sample: &MetricSample, weights: &ProfileWeights) -> f64 {
    let cpu_score = headroom(percent(sample.cpu_percent), 100.0);
    let mem_score = headroom(percent(sample.mem_used_percent), 100.0);
    let disk_score = headroom(percent(sample.disk_util_percent), 100.0);
    let load_score = headroom(
        non_negative(sample.load_avg_1),
        REFERENCE_CORES * weights.load_coef,
    );

    let recv_bytes = non_negative(sample.rcv_rate) * BYTES_PER_KB;
    let send_bytes = non_negative(sample.send_rate) * BYTES_PER_KB;
    let net_score = (headroom(recv_bytes, weights.max_bandwidth)
        + headroom(send_bytes, weights.max_bandwidth))
        / 2.0;

    let weighted = cpu_score * weights.cpu
        + mem_score * weights.mem
        + load_score * weights.load
        + disk_score * weights.disk
        + net_score * weights.net;

    (finite_or_zero(weighted) * 100.0).clamp(0.0, 100.0)
}

/// Health score in `[0, 100]` of one sample under `profile`.
pub fn compute_score(sample: &MetricSample, profile: ScoringProfile) -> f64 {
    score_with_weights(sample, &profile.weights())
}

/// Scores every sample under `profile`, replacing any score it carried.
pub fn score_samples(samples: Vec<MetricSample>, profile: ScoringProfile) -> Vec<MetricSample> {
    let weights = profile.weights();
    samples
        .into_iter()
        .map(|sample| {
            let score = score_with_weights(&sample, &weights);
            sample.with_score(score)
        })
        .collect()
}
