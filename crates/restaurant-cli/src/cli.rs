//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "restaurants")]
#[command(
    author,
    version,
    about = "Browse and review restaurants, online or offline",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "RESTAURANTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Local cache database (overrides config)
    #[arg(long, global = true, env = "RESTAURANTS_DB")]
    pub database: Option<PathBuf>,

    /// Remote API base URL (overrides config)
    #[arg(long, global = true, env = "RESTAURANTS_API")]
    pub api: Option<String>,

    /// Do not contact the remote API; writes are queued locally
    #[arg(long, global = true)]
    pub offline: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List restaurants, optionally filtered
    List {
        /// Only this cuisine ("all" for every cuisine)
        #[arg(short, long)]
        cuisine: Option<String>,

        /// Only this neighborhood ("all" for every neighborhood)
        #[arg(short, long)]
        neighborhood: Option<String>,

        /// Re-fetch the list from the API before showing it
        #[arg(long)]
        refresh: bool,
    },

    /// Show one restaurant
    Show {
        /// Restaurant id
        id: i64,
    },

    /// List neighborhoods
    Neighborhoods,

    /// List cuisines
    Cuisines,

    /// Show reviews of a restaurant, including ones not yet sent
    Reviews {
        /// Restaurant id
        restaurant_id: i64,
    },

    /// Write a review (queued if offline)
    Review {
        /// Restaurant id
        restaurant_id: i64,

        /// Your name
        #[arg(long)]
        name: String,

        /// Rating from 1 to 5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,

        /// Review text
        #[arg(long)]
        comments: String,
    },

    /// Mark a restaurant as favorite (queued if offline)
    Favorite {
        /// Restaurant id
        id: i64,

        /// Remove the favorite mark instead
        #[arg(long)]
        unset: bool,
    },

    /// Show writes waiting to be sent
    Pending,

    /// Send writes queued while offline
    Drain,

    /// Watch connectivity and send queued writes whenever it returns
    Watch {
        /// Probe interval in seconds
        #[arg(
            short,
            long,
            default_value = "30",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval: u64,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Commands {
    /// Whether the command talks to the API at all.
    pub fn uses_network(&self) -> bool {
        !matches!(self, Commands::Pending | Commands::Config { .. })
    }
}

/// Configuration subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Treat "all" (any case) as no filter.
pub fn filter_value(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.eq_ignore_ascii_case("all"))
}
