//! Basic usage: take, put, fast-fail, status, and shutdown

use esox_resourcepool::{Context, FnManager, Pool, PoolConfiguration, PoolError};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug)]
struct Connection {
    id: usize,
}

#[tokio::main]
async fn main() -> Result<(), PoolError<io::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "esox_resourcepool=debug".into()),
        )
        .init();

    println!("=== EsoxSolutions.ResourcePool - Basic Examples ===\n");

    let next_id = Arc::new(AtomicUsize::new(0));
    let manager = FnManager::new(
        move |_ctx: Context| {
            let next_id = Arc::clone(&next_id);
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, io::Error>(Connection {
                    id: next_id.fetch_add(1, Ordering::SeqCst),
                })
            }
        },
        |_ctx: Context, conn: Connection| async move {
            println!("   Closing connection {}", conn.id);
            Ok::<_, io::Error>(())
        },
    );

    let pool = Pool::new(2, manager, PoolConfiguration::new().with_fast_fail());
    let ctx = Context::with_timeout(Duration::from_secs(5));

    println!("1. Take and put:");
    let first = pool.take(&ctx).await?;
    println!("   Got connection {}", first.id);
    pool.put(&ctx, first).await?;
    println!("   Status after put: {:?}\n", pool.status());

    println!("2. Fast-fail on exhaustion:");
    let a = pool.take(&ctx).await?;
    let b = pool.take(&ctx).await?;
    match pool.take(&ctx).await {
        Ok(_) => println!("   Unexpectedly got a third connection"),
        Err(err) => println!("   Error: {}", err),
    }
    pool.put(&ctx, a).await?;
    pool.put(&ctx, b).await?;
    println!();

    println!("3. RAII guard:");
    {
        let conn = pool.get(&ctx).await?;
        println!("   Using connection {} through a guard", conn.id);
        conn.release(&ctx).await?;
    }
    println!("   Status: {:?}\n", pool.status());

    println!("4. Close:");
    pool.close(&ctx).await?;
    match pool.take(&ctx).await {
        Ok(_) => println!("   Unexpectedly got a connection"),
        Err(err) => println!("   Error after close: {}", err),
    }

    Ok(())
}
