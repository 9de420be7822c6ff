use std::collections::HashMap;
use tracing::{info, warn};
use watch_state_models::ImportClassification;

/// Progress tracker for import batches
/// Logs periodic progress and a final per-classification summary
pub struct ProgressTracker {
    total: usize,
    succeeded: usize,
    already_exists: usize,
    multi_candidate: usize,
    not_found: usize,
    failed: usize,
    start_time: std::time::Instant,
    progress_interval: usize, // Log every N entries
    last_progress_log: usize,
    error_counts: HashMap<String, usize>,
}

impl ProgressTracker {
    pub fn new(total: usize, progress_interval: usize) -> Self {
        if total > 10 {
            info!("Starting import: {} entries to reconcile", total);
        }
        Self {
            total,
            succeeded: 0,
            already_exists: 0,
            multi_candidate: 0,
            not_found: 0,
            failed: 0,
            start_time: std::time::Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    pub fn record(&mut self, classification: ImportClassification) {
        match classification {
            ImportClassification::Success => self.succeeded += 1,
            ImportClassification::AlreadyExists => self.already_exists += 1,
            ImportClassification::MultiCandidate => self.multi_candidate += 1,
            ImportClassification::NotFound => self.not_found += 1,
            ImportClassification::Failed => self.failed += 1,
        }
    }

    /// Record a failure and group it under `error_category` in the summary
    pub fn record_failed_with_error(&mut self, error_category: &str) {
        self.failed += 1;
        *self.error_counts.entry(error_category.to_string()).or_insert(0) += 1;
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.already_exists + self.multi_candidate + self.not_found + self.failed
    }

    pub fn count(&self, classification: ImportClassification) -> usize {
        match classification {
            ImportClassification::Success => self.succeeded,
            ImportClassification::AlreadyExists => self.already_exists,
            ImportClassification::MultiCandidate => self.multi_candidate,
            ImportClassification::NotFound => self.not_found,
            ImportClassification::Failed => self.failed,
        }
    }

    /// `current` is 1-based
    pub fn log_progress(&mut self, current: usize) {
        if current - self.last_progress_log >= self.progress_interval || current == self.total {
            let elapsed = self.start_time.elapsed();
            if elapsed.as_secs_f64() < 0.5 && current < self.total {
                return;
            }
            let rate = if elapsed.as_secs_f64() > 0.0 {
                current as f64 / elapsed.as_secs_f64()
            } else {
                0.0
            };
            info!(
                "Progress: {}/{} ({:.1} entries/sec) | Success: {} | Exists: {} | Multi: {} | Not found: {} | Failed: {}",
                current, self.total, rate,
                self.succeeded, self.already_exists, self.multi_candidate, self.not_found, self.failed
            );
            self.last_progress_log = current;
        }
    }

    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed();
        if self.failed > 0 {
            warn!(
                "{} completed: {} total in {:.1}s | Success: {} | Already exists: {} | Multi candidate: {} | Not found: {} | Failed: {}",
                operation_name, self.total, elapsed.as_secs_f64(),
                self.succeeded, self.already_exists, self.multi_candidate, self.not_found, self.failed
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
                "{} completed: {} total in {:.1}s | Success: {} | Already exists: {} | Multi candidate: {} | Not found: {}",
                operation_name, self.total, elapsed.as_secs_f64(),
                self.succeeded, self.already_exists, self.multi_candidate, self.not_found
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_classification() {
        let mut tracker = ProgressTracker::new(4, 50);
        tracker.record(ImportClassification::Success);
        tracker.record(ImportClassification::Success);
        tracker.record(ImportClassification::NotFound);
        tracker.record_failed_with_error("catalog");

        assert_eq!(tracker.processed(), 4);
        assert_eq!(tracker.count(ImportClassification::Success), 2);
        assert_eq!(tracker.count(ImportClassification::Failed), 1);
        assert_eq!(tracker.error_counts.get("catalog"), Some(&1));
    }
}
