// file: src/pipeline/progress.rs
// description: ingestion progress bar and run statistics
// reference: uses indicatif for progress bars and tracks ingestion metrics

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    pub files_scanned: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub documents_written: usize,
    pub total_bytes_processed: u64,
    pub duration_ms: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }

    pub fn files_per_second(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.files_processed as f64 / self.duration_secs()
    }

    pub fn bytes_per_second(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.total_bytes_processed as f64 / self.duration_secs()
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.files_processed + self.files_failed;
        if total == 0 {
            return 0.0;
        }
        (self.files_processed as f64 / total as f64) * 100.0
    }

    pub fn print_summary(&self) {
        println!("{}", "=== Ingestion Summary ===".bold());
        println!("Files scanned:     {}", self.files_scanned);
        println!("Files processed:   {}", self.files_processed.to_string().green());
        if self.files_failed > 0 {
            println!("Files failed:      {}", self.files_failed.to_string().red());
        } else {
            println!("Files failed:      0");
        }
        println!("Papers written:    {}", self.documents_written);
        println!("Success rate:      {:.2}%", self.success_rate());
        println!("Duration:          {:.2}s", self.duration_secs());
        println!("Throughput:        {:.2} files/sec", self.files_per_second());
        println!(
            "                   {:.2} KB/sec",
            self.bytes_per_second() / 1024.0
        );
    }
}

/// Counters are atomic so embedding workers can report without locking.
pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    files_scanned: usize,
    files_processed: AtomicUsize,
    files_failed: AtomicUsize,
    documents_written: AtomicUsize,
    bytes_processed: AtomicU64,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_files: usize, colored: bool) -> Self {
        Self::build(total_files, colored, ProgressDrawTarget::stderr())
    }

    /// Same counters, nothing drawn.
    pub fn hidden(total_files: usize) -> Self {
        Self::build(total_files, false, ProgressDrawTarget::hidden())
    }

    fn build(total_files: usize, colored: bool, target: ProgressDrawTarget) -> Self {
        let multi_progress = MultiProgress::with_draw_target(target);

        let main_bar = create_progress_bar(&multi_progress, total_files as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            files_scanned: total_files,
            files_processed: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            documents_written: AtomicUsize::new(0),
            bytes_processed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn inc_files_processed(&self, bytes: u64) {
        self.files_processed.fetch_add(1, Ordering::SeqCst);
        self.bytes_processed.fetch_add(bytes, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_files_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn add_document(&self) {
        self.documents_written.fetch_add(1, Ordering::SeqCst);
        self.update_detail_bar();
    }

    pub fn set_message(&self, message: String) {
        self.main_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Ingestion complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            files_scanned: self.files_scanned,
            files_processed: self.files_processed.load(Ordering::SeqCst),
            files_failed: self.files_failed.load(Ordering::SeqCst),
            documents_written: self.documents_written.load(Ordering::SeqCst),
            total_bytes_processed: self.bytes_processed.load(Ordering::SeqCst),
            duration_ms: self.start_time.elapsed().as_millis() as u64,
        }
    }

    fn update_detail_bar(&self) {
        let written = self.documents_written.load(Ordering::SeqCst);
        let failed = self.files_failed.load(Ordering::SeqCst);

        self.detail_bar
            .set_message(format!("Papers written: {} | Failed: {}", written, failed));
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        if !self.main_bar.is_finished() {
            self.finish();
        }
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            "█▓▒░",
        )
    } else {
        (
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}",
            "=>-",
        )
    };

    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(chars);
    bar.set_style(style);
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_stats_calculations() {
        let stats = PipelineStats {
            files_processed: 100,
            files_failed: 10,
            duration_ms: 10_000,
            total_bytes_processed: 1000,
            ..PipelineStats::new()
        };

        assert_eq!(stats.files_per_second(), 10.0);
        assert_eq!(stats.bytes_per_second(), 100.0);
        assert!((stats.success_rate() - 90.909).abs() < 0.01);
    }

    #[test]
    fn test_pipeline_stats_zero_duration() {
        let stats = PipelineStats::new();
        assert_eq!(stats.files_per_second(), 0.0);
        assert_eq!(stats.bytes_per_second(), 0.0);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_progress_tracker_counts() {
        let tracker = ProgressTracker::hidden(3);

        tracker.inc_files_processed(1024);
        tracker.inc_files_failed();
        tracker.add_document();

        let stats = tracker.get_stats();
        assert_eq!(stats.files_scanned, 3);
        assert_eq!(stats.files_processed, 1);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.documents_written, 1);
        assert_eq!(stats.total_bytes_processed, 1024);
    }
}
