use std::sync::Arc;

use graphrag_serve::config::ServerConfig;
use graphrag_serve::search::GraphRagCli;
use graphrag_serve::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(ServerConfig::load());

    // Initialize tracing subscriber (also installs the log -> tracing bridge)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    log::info!("Arguments: {:?}", config);

    let backend = Arc::new(GraphRagCli::new(config.python.clone()));
    server::run(config, backend).await
}
