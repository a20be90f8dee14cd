use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

use tesouraria::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let cfg = AppConfig::from_env();
    info!(target: "tesouraria", "Tesouraria starting: RUST_LOG='{}', http_port={}", rust_log, cfg.http_port);

    tesouraria::server::run(cfg).await
}
