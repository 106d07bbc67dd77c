//! Combined progress across concurrent fetches

use std::sync::Mutex;

use crate::fetch::FetchProgress;

/// Combined figure for every download of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateProgress {
    pub downloaded_bytes: u64,
    /// Sum of all totals, `None` while any total is unknown
    pub total_bytes: Option<u64>,
    pub percentage: f64,
    /// Sum of the rates of downloads still in flight
    pub speed_bps: f64,
}

#[derive(Debug)]
struct AggregatorState {
    slots: Vec<Option<FetchProgress>>,
    high_water: f64,
}

/// Folds per-download snapshots into one progress figure.
///
/// Nothing is reported until every download has produced a snapshot, since
/// the combined total is unknown before that. With known totals the
/// percentage is `sum(downloaded) / sum(total) * 100`; otherwise it is the
/// mean of the per-download percentages. It never decreases.
#[derive(Debug)]
pub struct DownloadAggregator {
    state: Mutex<AggregatorState>,
}

impl DownloadAggregator {
    pub fn new(downloads: usize) -> Self {
        Self {
            state: Mutex::new(AggregatorState {
                slots: vec![None; downloads],
                high_water: 0.0,
            }),
        }
    }

    /// Record the latest snapshot of download `index`
    pub fn update(&self, index: usize, progress: FetchProgress) -> Option<AggregateProgress> {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let slot = state.slots.get_mut(index)?;
        *slot = Some(progress);

        let snapshots: Vec<FetchProgress> = state.slots.iter().copied().collect::<Option<Vec<_>>>()?;

        let downloaded_bytes = snapshots.iter().map(|p| p.downloaded_bytes).sum();
        let total_bytes = snapshots
            .iter()
            .map(|p| p.total_bytes)
            .sum::<Option<u64>>();
        let speed_bps = snapshots
            .iter()
            .filter(|p| !p.is_finished())
            .map(|p| p.speed_bps)
            .sum();

        let percentage = match total_bytes {
            Some(total) if total > 0 => downloaded_bytes as f64 / total as f64 * 100.0,
            _ => snapshots.iter().map(|p| p.percentage).sum::<f64>() / snapshots.len() as f64,
        };
        let percentage = percentage.min(100.0).max(state.high_water);
        state.high_water = percentage;

        Some(AggregateProgress {
            downloaded_bytes,
            total_bytes,
            percentage,
            speed_bps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snapshot(downloaded: u64, total: Option<u64>) -> FetchProgress {
        FetchProgress::new(downloaded, total, Duration::from_secs(2))
    }

    #[test]
    fn test_waits_for_every_download_to_report() {
        let aggregator = DownloadAggregator::new(2);
        assert!(aggregator.update(0, snapshot(10, Some(100))).is_none());
        assert!(aggregator.update(1, snapshot(0, Some(300))).is_some());
    }

    #[test]
    fn test_combined_percentage_matches_byte_ratio() {
        let aggregator = DownloadAggregator::new(2);
        aggregator.update(0, snapshot(0, Some(100)));

        let ticks = [
            (1, 30, 300),
            (0, 50, 100),
            (1, 150, 300),
            (0, 100, 100),
            (1, 300, 300),
        ];
        let mut downloaded = [0u64, 0u64];
        let totals = [100u64, 300u64];
        let mut last = 0.0;

        for (index, bytes, total) in ticks {
            downloaded[index] = bytes;
            let combined = aggregator.update(index, snapshot(bytes, Some(total))).unwrap();

            let expected = (downloaded[0] + downloaded[1]) as f64 / (totals[0] + totals[1]) as f64 * 100.0;
            assert!((combined.percentage - expected).abs() < 1e-9, "{} != {}", combined.percentage, expected);
            assert!(combined.percentage >= last);
            assert_eq!(combined.total_bytes, Some(400));
            last = combined.percentage;
        }
        assert!((last - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_total_falls_back_to_mean() {
        let aggregator = DownloadAggregator::new(2);
        aggregator.update(0, snapshot(50, Some(100)));
        let combined = aggregator.update(1, snapshot(999, None)).unwrap();

        assert_eq!(combined.total_bytes, None);
        assert!((combined.percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_finished_downloads_do_not_count_towards_speed() {
        let aggregator = DownloadAggregator::new(2);
        aggregator.update(0, FetchProgress::finished(100, Some(100), Duration::from_secs(1)));
        let combined = aggregator.update(1, snapshot(100, Some(200))).unwrap();

        assert!((combined.speed_bps - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_index_is_ignored() {
        let aggregator = DownloadAggregator::new(1);
        assert!(aggregator.update(3, snapshot(1, Some(1))).is_none());
    }
}
