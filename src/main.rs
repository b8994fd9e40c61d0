//! compscope - comparable-sales analysis from the terminal.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use compscope::cli::{self, Cli, Reported};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging based on verbosity, then the configured level
    // (the `compscope` target prefix also covers compscope_core and compscope_client)
    let default_filter = if cli.verbose {
        "compscope=info".to_string()
    } else {
        let level = cli
            .configured_log_level()
            .unwrap_or_else(|| "warn".to_string());
        format!("compscope={}", level)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli::run(cli).await {
        Err(e) if e.is::<Reported>() => std::process::exit(1),
        other => other,
    }
}
