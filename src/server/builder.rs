// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use crate::server::StatusHandler;
use anyhow::Result;
use hyper::server::conn::Http;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Accept loop for the status surface; one Tokio task per connection.
pub struct StatusServer {
    addr: SocketAddr,
    handler: StatusHandler,
}

impl StatusServer {
    pub fn new(addr: SocketAddr, handler: StatusHandler) -> Self {
        Self { addr, handler }
    }

    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("status server listening on http://{}", self.addr);

        loop {
            let (stream, peer) = listener.accept().await?;
            let svc = self.handler.clone();

            tokio::spawn(async move {
                if let Err(err) = Http::new().serve_connection(stream, svc).await {
                    tracing::warn!(%peer, %err, "connection error");
                }
            });
        }
    }
}
