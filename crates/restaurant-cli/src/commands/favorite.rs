//! Favorite toggling.

use anyhow::{Context as _, Result};
use restaurant_sync::FavoriteOutcome;
use serde::Serialize;

use super::{Context, write_output};
use crate::cli::OutputFormat;
use crate::format::format_json;

#[derive(Serialize)]
struct FavoriteJson {
    id: i64,
    is_favorite: bool,
    synced: bool,
}

pub async fn cmd_favorite(ctx: &Context, id: i64, is_favorite: bool) -> Result<()> {
    let outcome = ctx
        .coordinator
        .set_favorite(id, is_favorite)
        .await
        .with_context(|| format!("Failed to update favorite for restaurant {}", id))?;

    let (is_favorite, synced) = match &outcome {
        FavoriteOutcome::Synced(restaurant) => (restaurant.is_favorite, true),
        FavoriteOutcome::Queued { is_favorite, .. } => (*is_favorite, false),
    };

    let output = match ctx.format {
        OutputFormat::Text => {
            let verb = if is_favorite { "marked as" } else { "removed from" };
            if synced {
                format!("Restaurant {} {} favorite.\n", id, verb)
            } else {
                format!(
                    "Offline: restaurant {} {} favorite locally. \
                     The change will be sent when the connection returns.\n",
                    id, verb
                )
            }
        }
        OutputFormat::Json => format_json(&FavoriteJson {
            id,
            is_favorite,
            synced,
        })?,
    };
    write_output(&output)
}
