use anyhow::Context;
use rask_log_bus::app::{self, TailApp, TailConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = TailConfig::from_args(std::env::args()).context("Configuration error")?;
    app::setup_logging_safe(config.log_level, config.log_format)
        .context("Failed to initialize logging")?;

    TailApp::from_config(config)
        .run()
        .await
        .context("rask-log-tail failed")?;
    Ok(())
}
