// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Workflow metrics.
//!
//! Provides lightweight in-process counters without external dependencies:
//! events reconciled per kind, dispatch outcomes and latency, auto-run
//! triggers and cancellation requests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Global metrics instance.
pub static GLOBAL_METRICS: Lazy<WorkflowMetrics> = Lazy::new(WorkflowMetrics::new);

#[derive(Debug)]
pub struct WorkflowMetrics {
    /// Events reconciled, by wire tag.
    events: RwLock<BTreeMap<String, u64>>,

    dispatch: RwLock<OperationMetrics>,

    auto_runs: AtomicU64,

    cancellations: AtomicU64,

    /// Start time for calculating uptime.
    start_time: Instant,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(BTreeMap::new()),
            dispatch: RwLock::new(OperationMetrics::new()),
            auto_runs: AtomicU64::new(0),
            cancellations: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_event(&self, kind: &str) {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        *events.entry(kind.to_string()).or_default() += 1;
    }

    /// Record a runner dispatch call and whether it returned an agent id.
    pub fn record_dispatch(&self, duration: Duration, success: bool) {
        self.dispatch
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .record(duration, success);
    }

    pub fn record_auto_run(&self) {
        self.auto_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn event_count(&self, kind: &str) -> u64 {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(kind)
            .copied()
            .unwrap_or(0)
    }

    /// Get uptime since metrics were initialized.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Take a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events: self
                .events
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            dispatch: self
                .dispatch
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            auto_runs: self.auto_runs.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            uptime: self.uptime(),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self.dispatch.write().unwrap_or_else(PoisonError::into_inner) = OperationMetrics::new();
        self.auto_runs.store(0, Ordering::Relaxed);
        self.cancellations.store(0, Ordering::Relaxed);
    }
}

impl Default for WorkflowMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome and latency statistics for one kind of operation.
#[derive(Debug, Clone)]
pub struct OperationMetrics {
    pub count: u64,
    pub failures: u64,
    pub total_duration: Duration,
    pub min_duration: Duration,
    pub max_duration: Duration,
    pub histogram: Histogram,
}

impl OperationMetrics {
    pub fn new() -> Self {
        Self {
            count: 0,
            failures: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::MAX,
            max_duration: Duration::ZERO,
            histogram: Histogram::default(),
        }
    }

    pub fn record(&mut self, duration: Duration, success: bool) {
        self.count += 1;
        if !success {
            self.failures += 1;
        }
        self.total_duration += duration;
        self.min_duration = self.min_duration.min(duration);
        self.max_duration = self.max_duration.max(duration);
        self.histogram.record(duration);
    }

    pub fn avg_duration(&self) -> Duration {
        match u32::try_from(self.count) {
            Ok(0) => Duration::ZERO,
            Ok(count) => self.total_duration / count,
            Err(_) => Duration::from_secs_f64(self.total_duration.as_secs_f64() / self.count as f64),
        }
    }

    /// Fraction of operations that succeeded (1.0 when none ran).
    pub fn success_rate(&self) -> f64 {
        if self.count == 0 {
            1.0
        } else {
            (self.count - self.failures) as f64 / self.count as f64
        }
    }
}

impl Default for OperationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-bucket latency histogram.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Upper bounds in milliseconds; one overflow bucket follows.
    buckets: Vec<u64>,
    counts: Vec<u64>,
}

impl Histogram {
    /// Create a histogram with custom bucket bounds (in milliseconds).
    pub fn with_buckets(buckets: Vec<u64>) -> Self {
        let counts = vec![0; buckets.len() + 1];
        Self { buckets, counts }
    }

    pub fn record(&mut self, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let idx = self
            .buckets
            .iter()
            .position(|&bound| millis <= bound)
            .unwrap_or(self.buckets.len());
        self.counts[idx] += 1;
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Upper bound of the bucket holding the `p`th percentile.
    pub fn percentile(&self, p: f64) -> Duration {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return Duration::ZERO;
        }

        let target = (total as f64 * p / 100.0).ceil().max(1.0) as u64;
        let mut cumulative = 0u64;
        for (i, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                let millis = match self.buckets.get(i) {
                    Some(&bound) => bound,
                    None => self.buckets.last().copied().unwrap_or(0) * 10,
                };
                return Duration::from_millis(millis);
            }
        }
        Duration::ZERO
    }

    pub fn p50(&self) -> Duration {
        self.percentile(50.0)
    }

    pub fn p99(&self) -> Duration {
        self.percentile(99.0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        // 10ms, 50ms, 250ms, 1s, 5s, 30s
        Self::with_buckets(vec![10, 50, 250, 1_000, 5_000, 30_000])
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub events: BTreeMap<String, u64>,
    pub dispatch: OperationMetrics,
    pub auto_runs: u64,
    pub cancellations: u64,
    pub uptime: Duration,
}

impl MetricsSnapshot {
    pub fn total_events(&self) -> u64 {
        self.events.values().sum()
    }
}
