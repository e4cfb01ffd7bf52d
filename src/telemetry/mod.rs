// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry for the charge workflow.
//!
//! Three concerns live here:
//!
//! - **Spans**: one parent span per charge call and one child span per
//!   attempt, carrying the card/loyalty/outcome attributes downstream
//!   consumers key on.
//! - **Metrics**: an injected recorder counting transactions per card brand
//!   and attempt latencies. Injection (rather than a process-global sink)
//!   keeps tests able to substitute a capturing or no-op recorder.
//! - **Init**: `tracing-subscriber` setup for the binary.
//!
//! The span call sequence is part of the processor's observable contract:
//! the parent span's `charged` attribute is forced to `false` for synthetic
//! requests even when the gateway accepted the charge.

mod init;
pub mod metrics;
mod spans;

pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard};
pub use metrics::{
    AttemptMetrics, ChargeMetrics, Histogram, MetricsRecorder, MetricsSnapshot, NoopMetrics,
};
pub use spans::{AttemptSpan, ChargeSpan};
