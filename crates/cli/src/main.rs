use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hvsum_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;
mod error;

use args::{Cli, Command};
use commands::App;

/// Log filter: `RUST_LOG` wins, then `--debug`, then the config's `debug_mode`.
fn log_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }))
}

fn init_tracing(debug: bool, json: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(log_filter(debug)).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(cli.debug || config.debug_mode, cli.json_logs);

    tracing::debug!(config_dir = %config.config_dir.display(), "starting hvsum");

    let app = App::open(config).await?;
    let mut stdout = std::io::stdout().lock();

    if cli.clean_cache {
        return app.cache(args::CacheCommand::Clear, &mut stdout).await;
    }

    app.sweep_on_startup().await;

    let Some(command) = cli.command else {
        writeln!(stdout, "Nothing to do. Run `hvsum --help` for usage.")?;
        return Ok(());
    };

    match command {
        Command::Search(search) => {
            let provider = hvsum_client::providers_from_config(&app.config)?;
            app.search(Arc::new(provider), &search, &mut stdout).await
        }
        Command::Cache(cache) => app.cache(cache, &mut stdout).await,
        Command::Session(session) => app.session(session, &mut stdout).await,
    }
}
