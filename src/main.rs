//! Binary entrypoint: loads config, sets up logging, builds the Axum app, and serves the contact endpoint.

use std::{net::SocketAddr, sync::Arc};

use dotenvy::dotenv;
use tracing::{debug, info};

use leadrelay::{
    config::ApiConfig,
    email::Mailer,
    logger::set_logger,
    routes::{router, AppState},
    validator::DnsResolver,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Load environment (.env is optional)
    dotenv().ok();
    let config = ApiConfig::from_env()?;

    // 2) Logging
    set_logger(&config).map_err(|e| anyhow::anyhow!("logger setup failed: {e}"))?;

    // 3) Collaborators: mail transport and DNS resolver
    let mailer = Mailer::from_config(&config)?;
    debug!(
        transport = ?config.transport,
        smtp_host = %config.smtp_host,
        smtp_port = config.smtp_port,
        admin = %config.admin_email,
        "mail transport ready"
    );
    let state = Arc::new(AppState::new(
        &config,
        Arc::new(mailer),
        Arc::new(DnsResolver::from_system()),
    )?);

    // 4) Router
    let app = router(state);

    // 5) Bind address
    let addr: SocketAddr = format!("{}:{}", config.listen_addr, config.listen_port).parse()?;
    info!("Starting server on {addr}");

    // 6) Serve
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
