//! Command implementations for the CLI.

mod browse;
mod config;
mod favorite;
mod review;
mod sync;

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use restaurant_sync::{HttpGateway, SyncCoordinator};

use crate::cli::OutputFormat;

pub use browse::{cmd_cuisines, cmd_list, cmd_neighborhoods, cmd_show};
pub use config::cmd_config;
pub use favorite::cmd_favorite;
pub use review::{cmd_pending, cmd_review, cmd_reviews};
pub use sync::{cmd_drain, cmd_watch};

pub type Coordinator = SyncCoordinator<HttpGateway>;

/// Shared state handed to every command that touches the cache.
pub struct Context {
    pub coordinator: Arc<Coordinator>,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(coordinator: Coordinator, format: OutputFormat) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            format,
        }
    }
}

/// Write already-formatted output to stdout.
pub(crate) fn write_output(content: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
