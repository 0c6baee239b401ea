//! Benchmarks for the periodic sweep and sync paths
//!
//! Run with: cargo bench

use asset_signal_server::address_space::{lock_space, AddressSpaceBridge};
use asset_signal_server::backend::{
    AssetRegistry, SharedRegistry, SignalProvider, SignalUpdater, SimulatedValueGenerator,
};
use asset_signal_server::{Asset, Result, Signal, SignalValue};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

/// Provider generating `assets` assets with `signals` signals each, cycling types
struct SyntheticProvider {
    assets: usize,
    signals: usize,
}

impl SignalProvider for SyntheticProvider {
    fn asset_names(&self) -> Result<Vec<String>> {
        Ok((0..self.assets).map(|a| format!("Asset_{:04}", a)).collect())
    }

    fn get_asset(&self, name: &str) -> Result<Option<Asset>> {
        let mut asset = Asset::new(name)?;
        for s in 0..self.signals {
            let value = match s % 4 {
                0 => SignalValue::Double(s as f64 + 0.5),
                1 => SignalValue::Integer(s as i32),
                2 => SignalValue::Boolean(s % 2 == 0),
                _ => SignalValue::String(format!("Status_{}", s)),
            };
            asset.add_signal(Signal::with_value(format!("Signal_{:03}", s), value)?)?;
        }
        Ok(Some(asset))
    }
}

fn registry(assets: usize, signals: usize) -> SharedRegistry {
    let registry = AssetRegistry::shared(Box::new(SyntheticProvider { assets, signals }));
    registry.load().expect("synthetic load");
    registry
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_sweep");

    for assets in [10, 100, 1000].iter() {
        let registry = registry(*assets, 20);
        let mut updater = SignalUpdater::new(
            Arc::clone(&registry),
            Box::new(SimulatedValueGenerator::with_seed(42)),
        );

        group.throughput(Throughput::Elements(registry.signal_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(assets), assets, |b, _| {
            b.iter(|| black_box(updater.sweep()));
        });
    }

    group.finish();
}

fn bench_sync_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("address_space_sync");

    for assets in [10, 100, 1000].iter() {
        let registry = registry(*assets, 20);
        let bridge = AddressSpaceBridge::new(Arc::clone(&registry), "urn:bench");
        bridge.build().expect("build");

        group.throughput(Throughput::Elements(registry.signal_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(assets), assets, |b, _| {
            b.iter(|| black_box(bridge.sync_tick()));
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let registry = registry(100, 20);
    let bridge = AddressSpaceBridge::new(Arc::clone(&registry), "urn:bench");
    bridge.build().expect("build");
    let space = bridge.space();

    c.bench_function("address_space_snapshot_2000", |b| {
        b.iter(|| black_box(lock_space(&space).snapshot()));
    });
}

criterion_group!(benches, bench_sweep, bench_sync_tick, bench_snapshot);
criterion_main!(benches);
