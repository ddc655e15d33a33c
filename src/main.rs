use clap::Parser;
use moviematch::cli::{App, Cli};
use moviematch::config::Config;

fn configure_logging() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // stdout carries command output
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    configure_logging();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    tracing::debug!(
        backend = ?config.storage_backend,
        data_dir = %config.data_dir.display(),
        "Loaded configuration"
    );

    let app = App::open(config)?;
    let mut stdout = std::io::stdout().lock();
    app.run(cli.command, &mut stdout).await
}
