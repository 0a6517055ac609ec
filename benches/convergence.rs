//! Benchmarks for idempotent convergence against the in-memory registry.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reg_converge::{EngineConfig, HostArchitecture, MemoryTransport, Registry, Value, ValueData};

const PATH: &str = "HKLM\\Software\\Vendor\\App";

fn registry() -> Registry<MemoryTransport> {
    let registry = Registry::new(
        MemoryTransport::new(HostArchitecture::X64),
        EngineConfig::new(HostArchitecture::X64),
    )
    .expect("Failed to build registry engine");

    for i in 0..32 {
        let value = Value::new(format!("Setting{}", i), ValueData::Dword(i));
        registry
            .converge_value(PATH, &value, true)
            .expect("Failed to seed value");
    }
    registry
}

fn bench_update_unchanged(c: &mut Criterion) {
    let registry = registry();
    let value = Value::new("Setting31", ValueData::Dword(31));

    c.bench_function("update_value_unchanged", |b| {
        b.iter(|| registry.update_value(black_box(PATH), black_box(&value)).unwrap())
    });
}

fn bench_converge_changed(c: &mut Criterion) {
    let registry = registry();
    let mut toggle = 0u32;

    c.bench_function("converge_value_changed", |b| {
        b.iter(|| {
            toggle ^= 1;
            let value = Value::new("Setting0", ValueData::Dword(toggle));
            registry.converge_value(black_box(PATH), &value, true).unwrap()
        })
    });
}

criterion_group!(benches, bench_update_unchanged, bench_converge_changed);
criterion_main!(benches);
