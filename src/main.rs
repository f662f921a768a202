use clap::Parser;
use reservation_store::api::router;
use reservation_store::config::Config;
use reservation_store::shutdown::{drain_deadline, second_ctrl_c, shutdown_signal};
use reservation_store::store::Store;
use std::future::IntoFuture;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_max_level(if config.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    // 1. Store:
    let store = Arc::new(Store::new().with_lock_timeout(config.lock_timeout()));
    match config.lock_timeout() {
        Some(limit) => tracing::info!("Lock waits time out after {:?}", limit),
        None => tracing::info!("Lock waits never time out"),
    }

    // 2. HTTP Router:
    let app = router(store.clone());

    // 3. Spawn stats reporter:
    if let Some(period) = config.stats_interval() {
        let stats_store = store.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;
                let stats = stats_store.stats().await;
                tracing::info!("Store stats: {} keys, {} locked", stats.keys, stats.locked);
            }
        });
    }

    // 4. Start HTTP server:
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    tracing::info!("HTTP server listening on {}", listener.local_addr()?);
    tracing::info!("Press Ctrl+C to shutdown");

    // 5. Serve until Ctrl+C, bounding the drain so parked waiters cannot
    // hold the process open:
    let (draining_tx, draining_rx) = tokio::sync::watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(draining_tx))
        .into_future();

    tokio::select! {
        result = server => result?,
        _ = drain_deadline(draining_rx, config.shutdown_grace(), second_ctrl_c()) => {}
    }

    tracing::info!("Server stopped");
    Ok(())
}
