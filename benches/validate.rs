// SPDX-License-Identifier: AGPL-3.0-or-later
//! Benchmark for hardware data validation.
//!
//! Measures validating a well-formed snapshot and collecting every violation
//! from a badly malformed one.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

fn bench_validate_valid(c: &mut Criterion) {
    let raw = json!({
        "cpu": {
            "logical_core_count": 32,
            "physical_core_count": 16,
            "base_clock_ghz": 3.0,
            "architecture": "x86_64"
        },
        "memory": { "total_gb": 256.0, "available_gb": 200.0 },
        "gpus": [
            { "vendor": "nvidia", "model_name": "NVIDIA H100", "vram_gb": 80.0, "compute_capability": "9.0" },
            { "vendor": "nvidia", "model_name": "NVIDIA H100", "vram_gb": 80.0, "compute_capability": "9.0" }
        ],
        "disk": { "free_gb": 1800.0 },
        "os": "linux"
    });
    c.bench_function("validate_valid", |b| {
        b.iter(|| advisorlib::validate_hardware_data(black_box(&raw)));
    });
}

fn bench_validate_malformed(c: &mut Criterion) {
    let raw = json!({
        "cpu": { "logical_core_count": "many", "physical_core_count": -1, "architecture": "sparc" },
        "memory": { "total_gb": -8, "available_gb": "lots" },
        "gpus": [{ "vendor": "3dfx", "vram_gb": -1 }],
        "disk": {},
        "os": 7
    });
    c.bench_function("validate_malformed", |b| {
        b.iter(|| advisorlib::validate_hardware_data(black_box(&raw)));
    });
}

criterion_group!(benches, bench_validate_valid, bench_validate_malformed);
criterion_main!(benches);
