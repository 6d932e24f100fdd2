use anyhow::{Context, Result};
use axum::Router;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::api::create_router;
use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::search::{SearchBackend, SearchParams};
use crate::selftest::run_self_test;

/// Binds the listeners, runs the startup self-test and serves until Ctrl-C.
pub async fn run(config: Arc<ServerConfig>, backend: Arc<dyn SearchBackend>) -> Result<()> {
    let dispatcher = Dispatcher::new(backend, config.max_concurrent_searches());
    let router = create_router(dispatcher, &config.route_prefix);

    let mut servers = JoinSet::new();

    let listener = TcpListener::bind(config.http_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.http_addr()))?;
    servers.spawn(serve(listener, router.clone()));

    if let Some(addr) = config.grpc_addr() {
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind auxiliary port {addr}"))?;
        log::info!("Auxiliary listener on {addr}");
        servers.spawn(serve(listener, router));
    }

    let external_ip = external_ip();
    log::info!("API deployed at {}", config.base_url());
    log::info!(
        "External access: http://{}:{}{}",
        external_ip,
        config.port,
        config.route_prefix
    );
    log::info!(
        "Run following command to forward the port:\n`echo RUNNING && socat TCP-LISTEN:{port},fork,reuseaddr TCP:{external_ip}:{port}`",
        port = config.port
    );

    if config.num_tests > 0 {
        tokio::spawn(self_test(config.clone()));
    }

    while let Some(res) = servers.join_next().await {
        res??;
    }
    log::info!("Server stopped");
    Ok(())
}

async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {:#}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}

async fn self_test(config: Arc<ServerConfig>) {
    let params = SearchParams::new(config.self_test_query.clone())
        .with_root_dir(config.self_test_root_dir.clone());
    let client = reqwest::Client::new();

    match run_self_test(&client, &config.base_url(), config.num_tests, &params).await {
        Ok(report) => {
            log::info!(
                "Processed {} items in {:.3?} ({} failed):\n{:#?}",
                report.results.len(),
                report.elapsed,
                report.failures(),
                report.results
            );
        }
        Err(e) => log::error!("Self-test failed: {:#}", e),
    }
}

/// The address this host uses for outbound traffic. No packet is sent;
/// connecting a UDP socket only selects a route.
pub fn external_ip() -> IpAddr {
    let probe = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(("8.8.8.8", 80))?;
        Ok(socket.local_addr()?.ip())
    };
    probe().unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
