use anyhow::Context;
use rask_log_bus::app::{self, App, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args(std::env::args()).context("Configuration error")?;
    app::setup_logging_safe(config.log_level, config.log_format)
        .context("Failed to initialize logging")?;

    let app = App::from_config(config).context("Failed to build publishers")?;
    app.run().await.context("rask-log-bus failed")?;
    Ok(())
}
