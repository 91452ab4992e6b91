//! Evaluation timing statistics

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

/// Timing statistics for one rule or labelled condition
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timing {
    /// Rule ID or condition label
    pub label: String,
    /// Total time spent evaluating
    pub total_time: Duration,
    /// Number of evaluations
    pub evaluation_count: usize,
    /// Number of evaluations that matched (or passed, for rules)
    pub match_count: usize,
    /// Slowest single evaluation
    pub max_time: Duration,
}

impl Timing {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    /// Account for one evaluation
    pub fn add(&mut self, elapsed: Duration, matched: bool) {
        self.total_time += elapsed;
        self.evaluation_count += 1;
        if matched {
            self.match_count += 1;
        }
        if elapsed > self.max_time {
            self.max_time = elapsed;
        }
    }

    /// Average time per evaluation
    pub fn avg_time(&self) -> Duration {
        if self.evaluation_count > 0 {
            self.total_time / self.evaluation_count as u32
        } else {
            Duration::ZERO
        }
    }

    /// Fold another entry for the same label into this one
    pub fn merge(&mut self, other: &Timing) {
        self.total_time += other.total_time;
        self.evaluation_count += other.evaluation_count;
        self.match_count += other.match_count;
        if other.max_time > self.max_time {
            self.max_time = other.max_time;
        }
    }
}

/// Per-label timing table
pub type TimingTable = BTreeMap<String, Timing>;

/// Merge `other` into `table`
pub fn merge_timings(table: &mut TimingTable, other: &TimingTable) {
    for (label, timing) in other {
        table
            .entry(label.clone())
            .or_insert_with(|| Timing::new(label))
            .merge(timing);
    }
}

/// Entries sorted by total time, slowest first
pub fn sorted_timings(table: &TimingTable) -> Vec<&Timing> {
    let mut timings: Vec<_> = table.values().collect();
    timings.sort_by(|a, b| b.total_time.cmp(&a.total_time));
    timings
}

/// Render a timing table for humans
pub fn format_timings(table: &TimingTable) -> String {
    let timings = sorted_timings(table);
    if timings.is_empty() {
        return "No timing data available".to_string();
    }

    let mut output = String::new();
    output.push_str("Rule Timing Statistics:\n");
    output.push_str(&format!(
        "{:<48} {:>12} {:>12} {:>10} {:>10}\n",
        "Rule ID", "Total", "Avg", "Evals", "Matches"
    ));
    output.push_str(&"-".repeat(96));
    output.push('\n');

    for timing in timings {
        let total_ms = timing.total_time.as_secs_f64() * 1000.0;
        let avg_us = timing.avg_time().as_secs_f64() * 1_000_000.0;

        output.push_str(&format!(
            "{:<48} {:>10.2}ms {:>10.2}µs {:>10} {:>10}\n",
            timing.label, total_ms, avg_us, timing.evaluation_count, timing.match_count
        ));
    }

    output
}

/// Thread-safe sink for condition timings, shared between diagnostic decorators
#[derive(Debug, Default)]
pub struct TimingRecorder {
    timings: Mutex<TimingTable>,
}

impl TimingRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, label: &str, elapsed: Duration, matched: bool) {
        let mut timings = match self.timings.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        timings
            .entry(label.to_string())
            .or_insert_with(|| Timing::new(label))
            .add(elapsed, matched);
    }

    pub fn get(&self, label: &str) -> Option<Timing> {
        self.snapshot().remove(label)
    }

    /// Copy of everything recorded so far
    pub fn snapshot(&self) -> TimingTable {
        match self.timings.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_add_and_avg() {
        let mut timing = Timing::new("rule");
        timing.add(Duration::from_millis(2), true);
        timing.add(Duration::from_millis(4), false);

        assert_eq!(timing.evaluation_count, 2);
        assert_eq!(timing.match_count, 1);
        assert_eq!(timing.avg_time(), Duration::from_millis(3));
        assert_eq!(timing.max_time, Duration::from_millis(4));
        assert_eq!(Timing::new("empty").avg_time(), Duration::ZERO);
    }

    #[test]
    fn test_merge_timings() {
        let mut left = TimingTable::new();
        left.insert("a".to_string(), {
            let mut t = Timing::new("a");
            t.add(Duration::from_millis(1), true);
            t
        });

        let mut right = TimingTable::new();
        right.insert("a".to_string(), {
            let mut t = Timing::new("a");
            t.add(Duration::from_millis(5), false);
            t
        });
        right.insert("b".to_string(), Timing::new("b"));

        merge_timings(&mut left, &right);
        assert_eq!(left.len(), 2);
        assert_eq!(left["a"].evaluation_count, 2);
        assert_eq!(left["a"].max_time, Duration::from_millis(5));
    }

    #[test]
    fn test_sorted_and_formatted() {
        let mut table = TimingTable::new();
        let mut slow = Timing::new("slow");
        slow.add(Duration::from_millis(10), true);
        let mut fast = Timing::new("fast");
        fast.add(Duration::from_micros(10), true);
        table.insert("slow".to_string(), slow);
        table.insert("fast".to_string(), fast);

        let sorted = sorted_timings(&table);
        assert_eq!(sorted[0].label, "slow");

        let text = format_timings(&table);
        assert!(text.starts_with("Rule Timing Statistics:"));
        assert!(text.contains("slow"));
        assert_eq!(format_timings(&TimingTable::new()), "No timing data available");
    }

    #[test]
    fn test_recorder() {
        let recorder = TimingRecorder::new();
        recorder.record("x", Duration::from_micros(3), true);
        recorder.record("x", Duration::from_micros(5), true);

        let timing = recorder.get("x").unwrap();
        assert_eq!(timing.evaluation_count, 2);
        assert_eq!(timing.match_count, 2);
        assert!(recorder.get("y").is_none());
    }
}
