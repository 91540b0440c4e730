//! Statistics accumulation and the end-of-run report.

use std::fmt;

/// Running counters, updated by the kernel as events complete.
#[derive(Debug, Default)]
pub struct RunStats {
    /// Arrivals routed by the dispatcher (admitted or dropped).
    pub offered: u64,
    pub served: u64,
    pub dropped: u64,
    /// Time the last request was fully handled; 0 until a completion
    /// leaves the pending-event set empty.
    pub last_completion: f64,
    pub total_wait: f64,
    pub total_sojourn: f64,
}

impl RunStats {
    pub fn report(&self, digest: String) -> RunReport {
        let served = self.served as f64;
        RunReport {
            offered: self.offered,
            served: self.served,
            dropped: self.dropped,
            last_completion: self.last_completion,
            mean_wait: self.total_wait / served,
            mean_sojourn: self.total_sojourn / served,
            digest,
        }
    }
}

/// Aggregate outcome of one simulation run.
///
/// `mean_wait` and `mean_sojourn` are `NaN` when nothing was served; a
/// zero-served run is a defined boundary outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub offered: u64,
    pub served: u64,
    pub dropped: u64,
    pub last_completion: f64,
    pub mean_wait: f64,
    pub mean_sojourn: f64,
    /// Hex blake3 digest of the dispatched event stream; equal digests
    /// mean equal runs.
    pub digest: String,
}

impl fmt::Display for RunReport {
    /// The five run statistics, space separated: served, dropped, time of
    /// the last handled completion, mean waiting time, mean sojourn time.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.served, self.dropped, self.last_completion, self.mean_wait, self.mean_sojourn
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_means_divide_by_served() {
        let stats = RunStats {
            offered: 3,
            served: 2,
            dropped: 1,
            last_completion: 9.0,
            total_wait: 3.0,
            total_sojourn: 5.0,
        };
        let report = stats.report(String::new());
        assert_eq!(report.mean_wait, 1.5);
        assert_eq!(report.mean_sojourn, 2.5);
    }

    #[test]
    fn test_zero_served_reports_nan_means() {
        let report = RunStats::default().report(String::new());
        assert_eq!(report.served, 0);
        assert_eq!(report.last_completion, 0.0);
        assert!(report.mean_wait.is_nan());
        assert!(report.mean_sojourn.is_nan());
    }

    #[test]
    fn test_display_prints_five_statistics() {
        let stats = RunStats {
            offered: 5,
            served: 4,
            dropped: 1,
            last_completion: 12.5,
            total_wait: 2.0,
            total_sojourn: 6.0,
        };
        let rendered = stats.report(String::from("abcd")).to_string();
        assert_eq!(rendered, "4 1 12.5 0.5 1.5");
    }
}
