use backend::{api, config::ProxyConfig};

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    llmchess::core::logging::init();

    let config = ProxyConfig::from_env()?;
    let app = api::router(&config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("[PROXY] Backend server running on {}", addr);
    info!("[PROXY] Llama server URL: {}", config.upstream);
    info!("[PROXY] Serving static files from {}", config.static_dir.display());

    axum::serve(listener, app).await?;
    Ok(())
}
