// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for card validation and the zero-failure charge path.

use std::sync::Arc;

use chrono::TimeZone;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chargeflow::flags::StaticFlagSource;
use chargeflow::gateway::SimulatedGateway;
use chargeflow::processor::{ChargeProcessor, ChargeProcessorOptions, ProcessorConfig};
use chargeflow::runtime::{ManualClock, ScriptedRandom};
use chargeflow::telemetry::NoopMetrics;
use chargeflow::types::{ChargeRequest, CreditCardInfo, Money};
use chargeflow::CardDetails;

fn bench_card_validation(c: &mut Criterion) {
    c.bench_function("card_validation", |b| {
        b.iter(|| CardDetails::from_number(black_box("4111-1111-1111-1111")))
    });
}

fn bench_charge_zero_failure(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    // Manual clock and scripted randomness keep the workflow itself as the
    // only thing measured: no real sleeps, no RNG variance.
    let now = chrono::Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::at(now));
    let random = Arc::new(ScriptedRandom::constant(0.0));
    let processor = ChargeProcessor::new(ChargeProcessorOptions {
        gateway: Arc::new(SimulatedGateway::new(random.clone(), clock.clone())),
        flags: Arc::new(StaticFlagSource::new()),
        metrics: Arc::new(NoopMetrics),
        clock,
        random,
        config: ProcessorConfig::default(),
    });

    let request = ChargeRequest::new(
        Money::new("USD", 49, 990_000_000).unwrap(),
        CreditCardInfo::new("4111-1111-1111-1111", 123, 2030, 1),
    );

    c.bench_function("charge_zero_failure", |b| {
        b.to_async(&rt).iter(|| {
            let request = request.clone();
            async { processor.charge(request).await.unwrap() }
        })
    });
}

criterion_group!(benches, bench_card_validation, bench_charge_zero_failure);
criterion_main!(benches);
