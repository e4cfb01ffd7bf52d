// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Injectable time and randomness sources.
//!
//! The charge workflow's only non-determinism (failure injection, latency
//! simulation, loyalty sampling, backoff sleeps, expiry checks) flows through
//! the two traits here. Production wiring uses [`SystemClock`] and
//! [`ThreadRngSource`]; deterministic implementations ship alongside them so
//! tests and simulations can script every draw and observe every sleep.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;

/// Wall-clock time and cooperative sleeping.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Shared handle to a clock.
pub type SharedClock = Arc<dyn Clock>;

/// Uniform randomness.
pub trait RandomSource: Send + Sync {
    /// Uniform draw in `[0, 1)`.
    fn uniform(&self) -> f64;

    /// Uniform integer draw in `[0, upper]`.
    fn uniform_u64(&self, upper: u64) -> u64;
}

/// Shared handle to a randomness source.
pub type SharedRandom = Arc<dyn RandomSource>;

// ============================================================================
// Production implementations
// ============================================================================

/// Real time via `chrono` and `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Thread-local RNG; safe for concurrent use since every call draws from the
/// calling thread's generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn uniform(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn uniform_u64(&self, upper: u64) -> u64 {
        rand::thread_rng().gen_range(0..=upper)
    }
}

// ============================================================================
// Deterministic implementations
// ============================================================================

/// A clock with a fixed `now` that records requested sleeps instead of
/// waiting them out.
#[derive(Debug)]
pub struct ManualClock {
    now: DateTime<Utc>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Every sleep requested so far, in order.
    pub fn recorded_sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// A randomness source that replays a scripted sequence of draws.
///
/// `uniform` pops the next value; `uniform_u64` pops a value and scales it
/// onto `[0, upper]`. Once the script is spent, `fallback` is returned.
#[derive(Debug)]
pub struct ScriptedRandom {
    values: Mutex<VecDeque<f64>>,
    fallback: f64,
}

impl ScriptedRandom {
    /// Replay `values` in order, then return 0.0 forever.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
            fallback: 0.0,
        }
    }

    /// Return `value` on every draw.
    pub fn constant(value: f64) -> Self {
        Self {
            values: Mutex::new(VecDeque::new()),
            fallback: value,
        }
    }

    fn next(&self) -> f64 {
        self.values
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback)
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&self) -> f64 {
        self.next()
    }

    fn uniform_u64(&self, upper: u64) -> u64 {
        let scaled = (self.next() * (upper as f64 + 1.0)) as u64;
        scaled.min(upper)
    }
}
