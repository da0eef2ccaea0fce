//! Configuration resolution and client cache benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use monstera_benchmarks::criterion_config;
use monstera_client::ApiClientFactory;
use monstera_config::{ConfigLayering, ConfigOverrides};
use monstera_core::{ApiVersion, Environment, Preset};

fn bench_resolve_presets(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_preset");
    let layering = ConfigLayering::default();
    let overrides = ConfigOverrides::new();

    for preset in Preset::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(preset), &preset, |b, &preset| {
            b.iter(|| black_box(layering.resolve(preset, None, None, &overrides)))
        });
    }

    group.finish();
}

fn bench_resolve_layered(c: &mut Criterion) {
    let layering = ConfigLayering::default();
    let version: ApiVersion = "v2".parse().expect("valid version");
    let overrides = ConfigOverrides::new()
        .header("X-Request-Source", "bench")
        .max_retries(5);

    c.bench_function("resolve_versioned_environment_overrides", |b| {
        b.iter(|| {
            black_box(layering.resolve(
                Preset::Batch,
                Some(&version),
                Some(Environment::Staging),
                &overrides,
            ))
        })
    });
}

fn bench_cache_hit(c: &mut Criterion) {
    let factory = ApiClientFactory::default();
    factory.default_client().expect("default client");

    c.bench_function("factory_cached_client", |b| {
        b.iter(|| black_box(factory.client(Preset::Default)))
    });
}

fn bench_cache_miss(c: &mut Criterion) {
    let factory = ApiClientFactory::default();

    c.bench_function("factory_build_after_clear", |b| {
        b.iter(|| {
            factory.clear_cache();
            black_box(factory.client(Preset::Default))
        })
    });
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_resolve_presets, bench_resolve_layered, bench_cache_hit, bench_cache_miss
}
criterion_main!(benches);
