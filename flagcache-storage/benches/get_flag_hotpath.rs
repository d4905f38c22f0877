use flagcache_core::{CacheConfig, FeatureKey, TenantId, WaitStrategy};
use flagcache_storage::{FlagRegistry, TenantFlagCache};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;

const USERNAME_LOGGING: FeatureKey = FeatureKey::new("logs.username");
const NICKNAME_LOGGING: FeatureKey = FeatureKey::new("logs.nickname");

fn bench_cache(strategy: WaitStrategy) -> TenantFlagCache {
    let mut builder = FlagRegistry::builder();
    builder
        .register_fn(USERNAME_LOGGING, "Username logging", "logs", |tenant| Ok(tenant.as_i64() % 2 == 0))
        .expect("register username logging");
    builder
        .register_fn(NICKNAME_LOGGING, "Nickname logging", "logs", |_| Ok(true))
        .expect("register nickname logging");
    TenantFlagCache::new(
        Arc::new(builder.build()),
        CacheConfig::new().with_wait_strategy(strategy),
    )
}

fn bench_get_flag_hit(c: &mut Criterion) {
    let cache = bench_cache(WaitStrategy::Shared);
    for tenant in 0..1_000 {
        cache
            .get_flag(TenantId::new(tenant), USERNAME_LOGGING)
            .expect("warm cache");
    }

    let mut tenant = 0i64;
    c.bench_function("get_flag/hit", |b| {
        b.iter(|| {
            tenant = (tenant + 1) % 1_000;
            let enabled = cache
                .get_flag(black_box(TenantId::new(tenant)), black_box(USERNAME_LOGGING))
                .expect("cached flag");
            black_box(enabled);
        });
    });
}

fn bench_get_flag_cold(c: &mut Criterion) {
    let cache = bench_cache(WaitStrategy::PerKey);
    let mut tenant = 0i64;
    c.bench_function("get_flag/cold", |b| {
        b.iter(|| {
            tenant += 1;
            let enabled = cache
                .get_flag(black_box(TenantId::new(tenant)), black_box(NICKNAME_LOGGING))
                .expect("fetch flag");
            black_box(enabled);
        });
    });
}

criterion_group!(benches, bench_get_flag_hit, bench_get_flag_cold);
criterion_main!(benches);
