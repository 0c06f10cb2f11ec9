//! Review commands.

use anyhow::{Context as _, Result};
use restaurant_sync::SubmitOutcome;
use restaurant_types::{PendingReview, Review, ReviewDraft};
use serde::Serialize;
use tracing::info;

use super::{Context, write_output};
use crate::cli::OutputFormat;
use crate::format::{format_json, format_pending_text, format_reviews_text};

/// JSON shape of a submitted review.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum SubmitJson<'a> {
    Synced { review: &'a Review },
    Queued { pending: &'a PendingReview },
}

pub async fn cmd_reviews(ctx: &Context, restaurant_id: i64) -> Result<()> {
    let reviews = ctx.coordinator.fetch_reviews_for(restaurant_id).await?;

    let output = match ctx.format {
        OutputFormat::Text => format_reviews_text(&reviews),
        OutputFormat::Json => format_json(&reviews)?,
    };
    write_output(&output)
}

pub async fn cmd_review(ctx: &Context, draft: ReviewDraft) -> Result<()> {
    let restaurant_id = draft.restaurant_id;
    let outcome = ctx
        .coordinator
        .submit_review(draft)
        .await
        .with_context(|| format!("Failed to submit review for restaurant {}", restaurant_id))?;

    let output = match (&outcome, ctx.format) {
        (SubmitOutcome::Synced(review), OutputFormat::Text) => {
            format!(
                "Review #{} posted for restaurant {}.\n",
                review.id, review.restaurant_id
            )
        }
        (SubmitOutcome::Queued(pending), OutputFormat::Text) => {
            info!("Review stored offline as pending #{}", pending.id);
            format!(
                "Offline: review saved as pending #{}. \
                 It will be sent when the connection returns.\n",
                pending.id
            )
        }
        (SubmitOutcome::Synced(review), OutputFormat::Json) => {
            format_json(&SubmitJson::Synced { review })?
        }
        (SubmitOutcome::Queued(pending), OutputFormat::Json) => {
            format_json(&SubmitJson::Queued { pending })?
        }
    };
    write_output(&output)
}

pub async fn cmd_pending(ctx: &Context) -> Result<()> {
    let pending = ctx.coordinator.pending_reviews().await?;
    let stats = ctx.coordinator.stats().await?;

    let output = match ctx.format {
        OutputFormat::Text => format_pending_text(&pending, &stats),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct PendingJson<'a> {
                reviews: &'a [PendingReview],
                unsynced_favorites: u64,
            }
            format_json(&PendingJson {
                reviews: &pending,
                unsynced_favorites: stats.unsynced_favorites,
            })?
        }
    };
    write_output(&output)
}
