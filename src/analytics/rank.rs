use super::profile::ScoringProfile;
use super::score::score_samples;
use crate::models::{MetricSample, Page, Pagination, SortOrder};

/// Sorts by score, best first. Stable, so equal scores keep input order.
pub fn sort_by_score(samples: &mut [MetricSample], order: SortOrder) {
    let key = |s: &MetricSample| s.score.unwrap_or(0.0);
    match order {
        SortOrder::Desc => samples.sort_by(|a, b| key(b).total_cmp(&key(a))),
        SortOrder::Asc => samples.sort_by(|a, b| key(a).total_cmp(&key(b))),
    }
}

/// Rescores `samples` under `profile`, orders them and returns the requested page.
pub fn rank_by_profile(
    samples: Vec<MetricSample>,
    profile: ScoringProfile,
    order: SortOrder,
    pagination: Pagination,
) -> Page<MetricSample> {
    let mut scored = score_samples(samples, profile);
    sort_by_score(&mut scored, order);

    let total_count = scored.len() as u64;
    let pagination = pagination.normalized();
    let items = scored
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.page_size as usize)
        .collect();
    Page::new(items, total_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, cpu: f64) -> MetricSample {
        MetricSample {
            cpu_percent: cpu,
            ..MetricSample::new(name)
        }
    }

    fn names(page: &Page<MetricSample>) -> Vec<&str> {
        page.items.iter().map(|s| s.server_name.as_str()).collect()
    }

    #[test]
    fn test_rank_descending_and_ascending() {
        let samples = vec![node("busy", 90.0), node("idle", 0.0), node("half", 50.0)];

        let desc = rank_by_profile(
            samples.clone(),
            ScoringProfile::Balanced,
            SortOrder::Desc,
            Pagination::default(),
        );
        assert_eq!(names(&desc), vec!["idle", "half", "busy"]);
        assert_eq!(desc.total_count, 3);
        assert!(desc.items.iter().all(|s| s.score.is_some()));

        let asc = rank_by_profile(samples, ScoringProfile::Balanced, SortOrder::Asc, Pagination::default());
        assert_eq!(names(&asc), vec!["busy", "half", "idle"]);
    }

    #[test]
    fn test_rank_pagination() {
        let samples: Vec<MetricSample> = (0..5).map(|i| node(&format!("n{i}"), i as f64 * 10.0)).collect();

        let second = rank_by_profile(
            samples.clone(),
            ScoringProfile::Balanced,
            SortOrder::Desc,
            Pagination::new(2, 2),
        );
        assert_eq!(names(&second), vec!["n2", "n3"]);
        assert_eq!(second.total_count, 5);

        let beyond = rank_by_profile(samples, ScoringProfile::Balanced, SortOrder::Desc, Pagination::new(9, 2));
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_count, 5);
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let samples = vec![node("first", 10.0), node("second", 10.0)];
        let ranked = rank_by_profile(samples, ScoringProfile::Balanced, SortOrder::Asc, Pagination::default());
        assert_eq!(names(&ranked), vec!["first", "second"]);
    }
}
