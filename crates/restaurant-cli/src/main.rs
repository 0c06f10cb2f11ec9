mod cli;
mod commands;
mod config;
mod format;

use anyhow::{Context as _, Result};
use clap::Parser;
use restaurant_store::Store;
use restaurant_sync::{Connectivity, HttpGateway, SyncCoordinator};
use restaurant_types::ReviewDraft;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, OutputFormat};
use commands::Context;
use config::{Config, default_config_path};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    if let Some(database) = &cli.database {
        config.storage.path = database.clone();
    }
    if let Some(api) = &cli.api {
        config.api.base_url = api.clone();
    }
    config.validate()?;

    match cli.command {
        Commands::Config { action } => {
            commands::cmd_config(action, &config, &config_path, cli.format)
        }
        command => {
            let probe = !cli.offline && command.uses_network();
            let ctx = connect(&config, probe, cli.format).await?;
            dispatch(&ctx, command, cli.offline).await
        }
    }
}

async fn dispatch(ctx: &Context, command: Commands, offline: bool) -> Result<()> {
    match command {
        Commands::List {
            cuisine,
            neighborhood,
            refresh,
        } => commands::cmd_list(ctx, cuisine.as_deref(), neighborhood.as_deref(), refresh).await,
        Commands::Show { id } => commands::cmd_show(ctx, id).await,
        Commands::Neighborhoods => commands::cmd_neighborhoods(ctx).await,
        Commands::Cuisines => commands::cmd_cuisines(ctx).await,
        Commands::Reviews { restaurant_id } => commands::cmd_reviews(ctx, restaurant_id).await,
        Commands::Review {
            restaurant_id,
            name,
            rating,
            comments,
        } => {
            let draft = ReviewDraft::new(restaurant_id, name, rating, comments);
            commands::cmd_review(ctx, draft).await
        }
        Commands::Favorite { id, unset } => commands::cmd_favorite(ctx, id, !unset).await,
        Commands::Pending => commands::cmd_pending(ctx).await,
        Commands::Drain => commands::cmd_drain(ctx).await,
        Commands::Watch { interval } => commands::cmd_watch(ctx, interval, offline).await,
        // Never opens the cache; handled in main.
        Commands::Config { .. } => Ok(()),
    }
}

/// Open the cache, build the gateway and decide whether we are online.
async fn connect(config: &Config, probe: bool, format: OutputFormat) -> Result<Context> {
    let store = Store::open(&config.storage.path)
        .with_context(|| format!("Failed to open cache at {}", config.storage.path.display()))?;
    let gateway = HttpGateway::with_timeout(&config.api.base_url, config.api.timeout())
        .context("Failed to create API client")?;

    let coordinator = SyncCoordinator::new(
        store,
        gateway,
        Connectivity::offline(),
        config.sync_options(),
    );

    if !probe {
        debug!("Not probing the API; working offline");
    } else if !coordinator.check_connectivity().await {
        warn!("API at {} is unreachable; working from the local cache", config.api.base_url);
    }

    Ok(Context::new(coordinator, format))
}
