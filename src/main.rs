use std::{net::SocketAddr, sync::Arc};

use tokio::signal;
use tracing::info;

use dentpal_ops_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(&cfg.log_level, cfg.log_json);

    // In-memory document store. Swap in a real driver behind the same
    // trait when deploying against the production database.
    let store: Arc<dyn api::store::DocumentStore> = Arc::new(api::store::MemoryStore::new());

    let courier = Arc::new(api::clients::JrsCourierClient::new(
        cfg.courier.api_url.clone(),
        cfg.courier.api_key.clone(),
    ));
    let gateway = Arc::new(api::clients::PaymongoClient::new(
        cfg.gateway.api_url.clone(),
        cfg.gateway.secret_key.clone(),
        cfg.gateway.wallet_id.clone(),
    ));

    let port = cfg.port;
    let state = api::AppState::new(cfg, store, courier, gateway);
    let app = api::app_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("dentpal-ops-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
