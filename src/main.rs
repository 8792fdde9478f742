use std::sync::Arc;

use log::{error, info};

use rate_limit_optimizer::{logger, server, AppState, RateLimitOptimizer, Settings};

#[tokio::main]
async fn main() {
    logger::init_logger();

    // ── 1. Load settings ─────────────────────────────────────────
    let settings = Settings::from_env().unwrap_or_else(|e| {
        error!("invalid configuration: {e}");
        std::process::exit(1);
    });

    // ── 2. Build the optimizer and start the janitor ─────────────
    let optimizer = Arc::new(RateLimitOptimizer::new(settings.optimizer));
    optimizer.start();

    // ── 3. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState::new(optimizer.clone(), settings.limits));
    info!("{} configured limits loaded", state.limits.read().len());

    // ── 4. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 5. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .unwrap_or_else(|e| {
            error!("failed to bind {}: {e}", settings.bind_addr);
            std::process::exit(1);
        });

    info!("listening on http://{}", settings.bind_addr);
    info!("  health report   → GET  /api/health/endpoints");
    info!("  recommendations → GET  /api/rate-limits/recommendations");
    info!("  ingest samples  → POST /api/metrics/samples");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server exited with error: {e}");
    }

    // ── 6. Cancel the janitor ────────────────────────────────────
    optimizer.stop().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
