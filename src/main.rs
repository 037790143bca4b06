use clap::Parser;
use copilot_metrics::cli::{Cli, Command};
use copilot_metrics::runner::{run_dashboard, run_export, serve};
use copilot_metrics::{load_config, resolve_config_path};
use std::env;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let config = load_config(&config_path).await?;

    match &cli.command {
        Some(Command::Dashboard { out }) => run_dashboard(&config, out.as_deref()).await?,
        Some(Command::Serve { port }) => {
            let port = port
                .or_else(|| env::var("PORT").ok().and_then(|value| value.parse::<u16>().ok()))
                .unwrap_or(8080);
            serve(&config, port).await?;
        }
        None => run_export(&cli, &config).await?,
    }

    Ok(())
}
