//! sbguard server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use sbguard_client::{LookupClient, LookupConfig, SafebrowsingService};
use sbguard_core::config::AppConfig;
use sbguard_core::{Settings, StorageDb};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(db_path = %config.db_path.display(), lookup_url = %config.lookup_url, "Starting sbguard server on stdio transport");

    let storage = Arc::new(StorageDb::open(&config.db_path).await?);
    let lookup = Arc::new(LookupClient::new(LookupConfig::from(&config))?);
    let settings = Arc::new(Settings::new(config.safebrowsing_disabled));

    let service = Arc::new(
        SafebrowsingService::new(storage, lookup, settings.clone()).with_warning_page(config.warning_page_url.clone()),
    );
    service.init().await;

    let handler = handler::SbGuardServer::new(service.clone(), settings);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    tokio::select! {
        result = server.waiting() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received interrupt, shutting down");
        }
    }

    if let Err(e) = service.shutdown().await {
        tracing::warn!(error = %e, "failed to flush safebrowsing cache on shutdown");
    }

    Ok(())
}
