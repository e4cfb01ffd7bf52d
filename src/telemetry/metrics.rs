// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Charge metrics collection.
//!
//! The processor records through the [`MetricsRecorder`] trait rather than a
//! process-global sink, so every invocation site can decide what collection
//! means: the bundled [`ChargeMetrics`] for real aggregation, a capturing
//! recorder in tests, or [`NoopMetrics`] when nobody is looking.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::card::CardType;
use crate::types::Money;

/// Sink for the workflow's two measurement points.
pub trait MetricsRecorder: Send + Sync {
    /// A real (non-synthetic) charge was applied.
    fn record_transaction(&self, card_type: CardType, amount: &Money);

    /// One gateway attempt finished.
    fn record_attempt(&self, succeeded: bool, latency: Duration);
}

/// Recorder that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {
    fn record_transaction(&self, _card_type: CardType, _amount: &Money) {}
    fn record_attempt(&self, _succeeded: bool, _latency: Duration) {}
}

/// Aggregating recorder: transaction counts per card brand plus attempt
/// latency statistics.
#[derive(Debug)]
pub struct ChargeMetrics {
    transactions: RwLock<HashMap<CardType, u64>>,
    attempts: RwLock<AttemptMetrics>,
    start_time: Instant,
}

impl ChargeMetrics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self {
            transactions: RwLock::new(HashMap::new()),
            attempts: RwLock::new(AttemptMetrics::new()),
            start_time: Instant::now(),
        }
    }

    /// Transactions recorded for one brand.
    pub fn transactions_for(&self, card_type: CardType) -> u64 {
        self.transactions
            .read()
            .unwrap()
            .get(&card_type)
            .copied()
            .unwrap_or(0)
    }

    /// Total transactions across brands.
    pub fn transaction_total(&self) -> u64 {
        self.transactions.read().unwrap().values().sum()
    }

    /// Uptime since the collector was created.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Take a point-in-time copy of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            transactions: self.transactions.read().unwrap().clone(),
            attempts: self.attempts.read().unwrap().clone(),
            uptime: self.uptime(),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.transactions.write().unwrap().clear();
        *self.attempts.write().unwrap() = AttemptMetrics::new();
    }
}

impl Default for ChargeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for ChargeMetrics {
    fn record_transaction(&self, card_type: CardType, _amount: &Money) {
        *self
            .transactions
            .write()
            .unwrap()
            .entry(card_type)
            .or_insert(0) += 1;
    }

    fn record_attempt(&self, succeeded: bool, latency: Duration) {
        self.attempts.write().unwrap().record(succeeded, latency);
    }
}

/// Aggregate statistics over gateway attempts.
#[derive(Debug, Clone)]
pub struct AttemptMetrics {
    /// Total attempts observed.
    pub count: u64,
    /// Attempts the gateway accepted.
    pub successes: u64,
    /// Attempts the gateway rejected.
    pub failures: u64,
    /// Sum of observed latencies.
    pub total_latency: Duration,
    /// Fastest attempt.
    pub min_latency: Duration,
    /// Slowest attempt.
    pub max_latency: Duration,
    /// Latency distribution.
    pub histogram: Histogram,
}

impl AttemptMetrics {
    /// Empty statistics.
    pub fn new() -> Self {
        Self {
            count: 0,
            successes: 0,
            failures: 0,
            total_latency: Duration::ZERO,
            min_latency: Duration::MAX,
            max_latency: Duration::ZERO,
            histogram: Histogram::default(),
        }
    }

    /// Fold one attempt in.
    pub fn record(&mut self, succeeded: bool, latency: Duration) {
        self.count += 1;
        if succeeded {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.total_latency += latency;
        self.min_latency = self.min_latency.min(latency);
        self.max_latency = self.max_latency.max(latency);
        self.histogram.record(latency);
    }

    /// Mean latency.
    pub fn avg_latency(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total_latency / self.count as u32
        }
    }

    /// Fraction of attempts that succeeded (1.0 when nothing recorded).
    pub fn success_rate(&self) -> f64 {
        if self.count == 0 {
            1.0
        } else {
            self.successes as f64 / self.count as f64
        }
    }
}

impl Default for AttemptMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-bucket latency histogram, bucket boundaries in milliseconds.
///
/// Default buckets cover the simulated gateway's latency envelope
/// (successes under ~200ms, failures under ~1s).
#[derive(Debug, Clone)]
pub struct Histogram {
    buckets: Vec<u64>,
    counts: Vec<u64>,
}

impl Histogram {
    /// Histogram with custom bucket boundaries (milliseconds, ascending).
    pub fn with_buckets(buckets: Vec<u64>) -> Self {
        let counts = vec![0; buckets.len() + 1];
        Self { buckets, counts }
    }

    /// Record one latency value.
    pub fn record(&mut self, latency: Duration) {
        let millis = latency.as_millis() as u64;
        let idx = self
            .buckets
            .iter()
            .position(|&b| millis <= b)
            .unwrap_or(self.buckets.len());
        self.counts[idx] += 1;
    }

    /// Count per bucket (last entry is the overflow bucket).
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Bucket boundaries.
    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Approximate percentile as the boundary of the bucket containing it.
    pub fn percentile(&self, p: f64) -> Duration {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return Duration::ZERO;
        }

        let target = (total as f64 * p / 100.0).ceil() as u64;
        let mut cumulative = 0u64;
        for (i, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                let millis = if i < self.buckets.len() {
                    self.buckets[i]
                } else {
                    self.buckets.last().copied().unwrap_or(0) * 10
                };
                return Duration::from_millis(millis);
            }
        }
        Duration::ZERO
    }

    /// Median latency.
    pub fn p50(&self) -> Duration {
        self.percentile(50.0)
    }

    /// 95th percentile latency.
    pub fn p95(&self) -> Duration {
        self.percentile(95.0)
    }

    /// 99th percentile latency.
    pub fn p99(&self) -> Duration {
        self.percentile(99.0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::with_buckets(vec![10, 50, 100, 250, 500, 1000])
    }
}

/// A point-in-time copy of all metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Transactions per card brand.
    pub transactions: HashMap<CardType, u64>,
    /// Attempt statistics.
    pub attempts: AttemptMetrics,
    /// Uptime at snapshot time.
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Format as a human-readable report.
    pub fn format_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Charge Metrics ===\n\n");
        report.push_str(&format!("Uptime: {:.2?}\n", self.uptime));

        let total: u64 = self.transactions.values().sum();
        report.push_str(&format!("Transactions: {total}\n"));
        for (card_type, count) in &self.transactions {
            report.push_str(&format!("  {card_type}: {count}\n"));
        }

        if self.attempts.count > 0 {
            report.push_str(&format!(
                "Attempts: {} ({:.1}% success), avg {:.2?}, p95 {:.2?}\n",
                self.attempts.count,
                self.attempts.success_rate() * 100.0,
                self.attempts.avg_latency(),
                self.attempts.histogram.p95()
            ));
        }

        report
    }
}
