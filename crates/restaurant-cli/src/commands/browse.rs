//! Read-only commands over restaurants.

use anyhow::Result;

use super::{Context, write_output};
use crate::cli::{OutputFormat, filter_value};
use crate::format::{
    format_json, format_names_text, format_restaurant_text, format_restaurants_text,
};

pub async fn cmd_list(
    ctx: &Context,
    cuisine: Option<&str>,
    neighborhood: Option<&str>,
    refresh: bool,
) -> Result<()> {
    if refresh {
        ctx.coordinator.refresh_restaurants().await?;
    }

    let restaurants = ctx
        .coordinator
        .fetch_by_cuisine_and_neighborhood(filter_value(cuisine), filter_value(neighborhood))
        .await?;

    let output = match ctx.format {
        OutputFormat::Text => format_restaurants_text(&restaurants),
        OutputFormat::Json => format_json(&restaurants)?,
    };
    write_output(&output)
}

pub async fn cmd_show(ctx: &Context, id: i64) -> Result<()> {
    let restaurant = ctx.coordinator.fetch_restaurant_by_id(id).await?;

    let output = match ctx.format {
        OutputFormat::Text => format_restaurant_text(&restaurant),
        OutputFormat::Json => format_json(&restaurant)?,
    };
    write_output(&output)
}

pub async fn cmd_neighborhoods(ctx: &Context) -> Result<()> {
    let names = ctx.coordinator.fetch_neighborhoods().await?;
    write_names(ctx, "neighborhoods", &names)
}

pub async fn cmd_cuisines(ctx: &Context) -> Result<()> {
    let names = ctx.coordinator.fetch_cuisines().await?;
    write_names(ctx, "cuisines", &names)
}

fn write_names(ctx: &Context, kind: &str, names: &[String]) -> Result<()> {
    let output = match ctx.format {
        OutputFormat::Text => format_names_text(kind, names),
        OutputFormat::Json => format_json(names)?,
    };
    write_output(&output)
}
