use criterion::{Criterion, criterion_group, criterion_main};
use esox_resourcepool::{Context, FnManager, Pool, PoolConfiguration};
use std::convert::Infallible;

fn manager() -> impl esox_resourcepool::ResourceManager<Resource = u64, Error = Infallible> {
    FnManager::new(
        |_ctx: Context| async { Ok::<_, Infallible>(7u64) },
        |_ctx: Context, _conn: u64| async { Ok::<_, Infallible>(()) },
    )
}

fn take_put(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let ctx = Context::background();

    let pool = Pool::new(16, manager(), PoolConfiguration::new());
    c.bench_function("take_put", |b| {
        b.to_async(&runtime).iter(|| async {
            let conn = pool.take(&ctx).await.unwrap();
            pool.put(&ctx, conn).await.unwrap();
        })
    });

    let pool = Pool::new(16, manager(), PoolConfiguration::new().without_admission_control());
    c.bench_function("take_put_without_admission_control", |b| {
        b.to_async(&runtime).iter(|| async {
            let conn = pool.take(&ctx).await.unwrap();
            pool.put(&ctx, conn).await.unwrap();
        })
    });

    let pool = Pool::new(16, manager(), PoolConfiguration::new());
    c.bench_function("status", |b| b.iter(|| pool.status()));
}

criterion_group!(benches, take_put);
criterion_main!(benches);
