use std::collections::HashMap;
use tracing::{info, warn};

/// Progress tracker for batch runs that process multiple items
/// Provides periodic progress lines and a final summary instead of one log line per item
pub struct ProgressTracker {
    total: usize,
    updated: usize,
    skipped: usize,
    failed: usize,
    catalog_calls: usize,
    start_time: std::time::Instant,
    progress_interval: usize, // Log every N items
    last_progress_log: usize,
    error_counts: HashMap<String, usize>, // Failures grouped by category
}

impl ProgressTracker {
    /// # Arguments
    /// * `total` - Total number of items to process
    /// * `progress_interval` - Log progress every N items
    pub fn new(total: usize, progress_interval: usize) -> Self {
        if total > 10 || progress_interval < total {
            info!("Starting operation: {} items to process", total);
        }
        Self {
            total,
            updated: 0,
            skipped: 0,
            failed: 0,
            catalog_calls: 0,
            start_time: std::time::Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    pub fn record_updated(&mut self) {
        self.updated += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Record a failure under an error category so the summary can group them
    pub fn record_failed_with_error(&mut self, error_category: &str) {
        self.failed += 1;
        *self.error_counts.entry(error_category.to_string()).or_insert(0) += 1;
    }

    pub fn record_catalog_call(&mut self) {
        self.catalog_calls += 1;
    }

    pub fn processed(&self) -> usize {
        self.updated + self.skipped + self.failed
    }

    /// Log progress if interval has been reached
    ///
    /// # Arguments
    /// * `current` - Current item index (1-based)
    pub fn log_progress(&mut self, current: usize) {
        if current - self.last_progress_log >= self.progress_interval || current == self.total {
            let elapsed = self.start_time.elapsed();
            let rate = if elapsed.as_secs_f64() > 0.0 {
                current as f64 / elapsed.as_secs_f64()
            } else {
                0.0
            };

            // Nothing worth reporting for near-instant runs
            if elapsed.as_secs_f64() < 0.5 && current < self.total {
                return;
            }

            info!(
                "Progress: {}/{} ({:.1} items/sec) | Updated: {} | Skipped: {} | Failed: {} | Catalog calls: {}",
                current, self.total, rate,
                self.updated, self.skipped, self.failed, self.catalog_calls
            );
            self.last_progress_log = current;
        }
    }

    /// Log final summary, as WARN when anything failed
    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed();
        if self.failed > 0 {
            warn!(
                "{} completed: {} total in {:.1}s | Updated: {} | Skipped: {} | Failed: {} | Catalog calls: {}",
                operation_name, self.total, elapsed.as_secs_f64(),
                self.updated, self.skipped, self.failed, self.catalog_calls
            );

            if !self.error_counts.is_empty() {
                let mut error_entries: Vec<_> = self.error_counts.iter().collect();
                error_entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

                let error_summary: Vec<String> = error_entries
                    .iter()
                    .map(|(category, count)| format!("{}: {}", category, count))
                    .collect();

                info!("Error breakdown: {}", error_summary.join(", "));
            }
        } else {
            info!(
                "{} completed: {} total in {:.1}s | Updated: {} | Skipped: {} | Catalog calls: {}",
                operation_name, self.total, elapsed.as_secs_f64(),
                self.updated, self.skipped, self.catalog_calls
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_add_up() {
        let mut tracker = ProgressTracker::new(4, 2);
        tracker.record_updated();
        tracker.record_skipped();
        tracker.record_failed_with_error("not_found");
        tracker.record_failed_with_error("not_found");
        tracker.record_catalog_call();

        assert_eq!(tracker.processed(), 4);
        assert_eq!(tracker.error_counts.get("not_found"), Some(&2));
        tracker.log_progress(4);
        tracker.log_summary("Test run");
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let mut tracker = ProgressTracker::new(1, 0);
        tracker.record_skipped();
        tracker.log_progress(1);
        assert_eq!(tracker.processed(), 1);
    }
}
