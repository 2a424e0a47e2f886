//! `abf-server`: the gRPC front door for the guard.
//!
//! Loads configuration, establishes the list store, starts one sweeper per
//! bucket dimension, and serves `AntiBruteForce` until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use abf_core::clock::SystemClock;
use abf_guard::config::load_from_file;
use abf_guard::{logger, sweeper, Guard};
use abf_rpc::pb::anti_brute_force_server::AntiBruteForceServer;
use abf_rpc::{interceptor::LoggingLayer, AbfService};
use abf_storage::bwlist::{ConnectOptions, ListStore};
use tokio::sync::watch;
use tonic::transport::Server;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config/abf.yaml".to_string());
    let cfg = load_from_file(&config_path)?;

    logger::init(&cfg.logger)?;
    info!(path = %config_path, "configuration loaded");

    let list_store = Arc::new(ListStore::new(ConnectOptions {
        host: cfg.db.host.clone(),
        port: cfg.db.port,
        dbname: cfg.db.dbname.clone(),
        user: cfg.db.user.clone(),
        password: cfg.db.password.clone(),
        sslmode: cfg.db.sslmode.clone(),
        timeout: cfg.db.timeout,
    }));
    list_store.connect().await?;
    list_store.migrate().await?;

    let clock: Arc<dyn abf_core::clock::Clock> = Arc::new(SystemClock);
    let guard = Arc::new(Guard::new(
        list_store,
        clock.clone(),
        cfg.main.max_logins,
        cfg.main.max_passwords,
        cfg.main.max_ips,
        cfg.main.cache_size,
        cfg.main.cache_ttl,
        cfg.main.bucket_ttl,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    for (name, store) in guard.store_handles() {
        let rx = shutdown_rx.clone();
        let clock = clock.clone();
        tokio::spawn(sweeper::run(name, store, clock, rx));
    }

    let addr: SocketAddr = format!("{}:{}", cfg.api_server.host, cfg.api_server.port).parse()?;
    info!(%addr, "abf-server listening");

    let service = AbfService::new(guard);
    Server::builder()
        .layer(LoggingLayer)
        .add_service(AntiBruteForceServer::new(service))
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    Ok(())
}

/// Waits for SIGINT or SIGTERM (Unix), matching `original_source`'s
/// `signal.NotifyContext(... SIGINT, SIGTERM, SIGHUP)`.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
