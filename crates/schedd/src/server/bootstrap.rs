use std::rc::Rc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::task::LocalSet;

use crate::queue::JobQueueRef;
use crate::server::ServerConfig;
use crate::server::connection::handle_connection;

pub async fn start_listener(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    let address = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Cannot listen on {address}"))?;
    log::info!("Listening for negotiators on {}", listener.local_addr()?);
    Ok(listener)
}

async fn handle_negotiator_connections(
    listener: TcpListener,
    queue: JobQueueRef,
    config: Rc<ServerConfig>,
) {
    while let Ok((connection, address)) = listener.accept().await {
        log::debug!("New negotiator connection from {address}");
        let queue = queue.clone();
        let config = config.clone();
        tokio::task::spawn_local(async move {
            match handle_connection(connection, queue, &config).await {
                Ok(()) => log::debug!("Negotiator connection {address} ended"),
                Err(e) => log::error!("Negotiator connection {address} failed: {e}"),
            }
        });
    }
}

/// Accepts negotiator connections until SIGINT is received.
pub async fn run_server(
    listener: TcpListener,
    queue: JobQueueRef,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let local_set = LocalSet::new();
    local_set
        .run_until(async move {
            tokio::select! {
                _ = handle_negotiator_connections(listener, queue, Rc::new(config)) => {
                    log::warn!("Listener stopped accepting connections");
                }
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Received SIGINT, stopping");
                }
            }
        })
        .await;
    Ok(())
}
