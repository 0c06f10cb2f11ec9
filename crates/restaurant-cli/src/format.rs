//! Output formatting for text and JSON.

use anyhow::Result;
use restaurant_store::StoreStats;
use restaurant_sync::{DrainReport, RestaurantReviews};
use restaurant_types::{PendingReview, Restaurant, Review};
use serde::Serialize;

/// Pretty-printed JSON with a trailing newline.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)? + "\n")
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "*".repeat(filled), ".".repeat(5 - filled))
}

fn favorite_mark(restaurant: &Restaurant) -> &'static str {
    if restaurant.is_favorite { " [fav]" } else { "" }
}

#[must_use]
pub fn format_restaurants_text(restaurants: &[Restaurant]) -> String {
    if restaurants.is_empty() {
        return "No restaurants found.\n".to_string();
    }

    let id_width = restaurants
        .iter()
        .map(|r| r.id.to_string().len())
        .max()
        .unwrap_or(1);

    let mut output = String::new();
    for r in restaurants {
        output.push_str(&format!(
            "{:>width$}  {}{} ({}, {})\n",
            r.id,
            r.name,
            favorite_mark(r),
            r.cuisine_type,
            r.neighborhood,
            width = id_width
        ));
    }
    output
}

#[must_use]
pub fn format_restaurant_text(restaurant: &Restaurant) -> String {
    let mut output = format!(
        "{}{}\n  Cuisine:      {}\n  Neighborhood: {}\n",
        restaurant.name,
        favorite_mark(restaurant),
        restaurant.cuisine_type,
        restaurant.neighborhood
    );
    if !restaurant.address.is_empty() {
        output.push_str(&format!("  Address:      {}\n", restaurant.address));
    }
    output.push_str(&format!(
        "  Location:     {:.4}, {:.4}\n",
        restaurant.latlng.lat, restaurant.latlng.lng
    ));
    if !restaurant.operating_hours.is_empty() {
        output.push_str("  Hours:\n");
        for (day, hours) in &restaurant.operating_hours {
            output.push_str(&format!("    {:<10} {}\n", day, hours));
        }
    }
    output
}

/// One name per line, or a note when there are none.
#[must_use]
pub fn format_names_text(kind: &str, names: &[String]) -> String {
    if names.is_empty() {
        return format!("No {} found.\n", kind);
    }
    names.iter().map(|n| format!("{}\n", n)).collect()
}

fn review_line(name: &str, rating: u8, comments: &str, date: time::Date, tag: &str) -> String {
    format!("{} {} ({}){}\n    {}\n", stars(rating), name, date, tag, comments)
}

#[must_use]
pub fn format_reviews_text(reviews: &RestaurantReviews) -> String {
    if reviews.is_empty() {
        return "No reviews yet.\n".to_string();
    }

    let mut output = String::new();
    for Review {
        name,
        rating,
        comments,
        created_at,
        ..
    } in &reviews.synced
    {
        output.push_str(&review_line(name, *rating, comments, created_at.date(), ""));
    }
    for pending in &reviews.pending {
        output.push_str(&review_line(
            &pending.draft.name,
            pending.draft.rating,
            &pending.draft.comments,
            pending.created_at.date(),
            " [pending]",
        ));
    }
    output
}

#[must_use]
pub fn format_pending_text(pending: &[PendingReview], stats: &StoreStats) -> String {
    let mut output = String::new();

    if pending.is_empty() {
        output.push_str("No reviews waiting to be sent.\n");
    } else {
        output.push_str(&format!("{} review(s) waiting to be sent:\n", pending.len()));
        for p in pending {
            output.push_str(&format!(
                "  #{} restaurant {} by {} ({}/5, written {})\n",
                p.id,
                p.restaurant_id(),
                p.draft.name,
                p.draft.rating,
                p.created_at.date()
            ));
        }
    }

    if stats.unsynced_favorites > 0 {
        output.push_str(&format!(
            "{} favorite change(s) waiting to be sent.\n",
            stats.unsynced_favorites
        ));
    }
    output
}

#[must_use]
pub fn format_drain_text(report: &DrainReport) -> String {
    if report.is_empty() {
        return "Nothing to send.\n".to_string();
    }

    let mut output = format!("Sent {} of {} pending review(s)", report.synced, report.attempted);
    if report.failed > 0 {
        if report.discarded > 0 {
            output.push_str(&format!(", {} rejected and discarded", report.discarded));
        } else {
            output.push_str(&format!(", {} rejected and kept", report.failed));
        }
    }
    output.push_str(".\n");
    if report.favorites_synced > 0 {
        output.push_str(&format!("Sent {} favorite change(s).\n", report.favorites_synced));
    }
    output
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use restaurant_types::{LatLng, ReviewDraft, from_unix_millis};

    use super::*;

    fn restaurant(id: i64, name: &str, favorite: bool) -> Restaurant {
        Restaurant {
            id,
            name: name.to_string(),
            address: "171 E Broadway".to_string(),
            neighborhood: "Manhattan".to_string(),
            cuisine_type: "Asian".to_string(),
            latlng: LatLng {
                lat: 40.713829,
                lng: -73.989667,
            },
            photograph: None,
            operating_hours: BTreeMap::from([(
                "Monday".to_string(),
                "5:30 pm - 11:00 pm".to_string(),
            )]),
            is_favorite: favorite,
            created_at: from_unix_millis(0).unwrap(),
        }
    }

    #[test]
    fn test_restaurants_text_aligns_ids() {
        let text = format_restaurants_text(&[
            restaurant(1, "Mission Chinese Food", true),
            restaurant(10, "Emily", false),
        ]);
        assert_eq!(
            text,
            " 1  Mission Chinese Food [fav] (Asian, Manhattan)\n10  Emily (Asian, Manhattan)\n"
        );
    }

    #[test]
    fn test_restaurants_text_empty() {
        assert_eq!(format_restaurants_text(&[]), "No restaurants found.\n");
    }

    #[test]
    fn test_restaurant_detail_includes_hours() {
        let text = format_restaurant_text(&restaurant(1, "Emily", false));
        assert!(text.starts_with("Emily\n"));
        assert!(text.contains("Address:      171 E Broadway"));
        assert!(text.contains("Monday     5:30 pm - 11:00 pm"));
    }

    #[test]
    fn test_reviews_text_marks_pending() {
        let reviews = RestaurantReviews {
            synced: vec![Review {
                id: 7,
                restaurant_id: 1,
                name: "Steve".to_string(),
                rating: 4,
                comments: "Solid".to_string(),
                created_at: from_unix_millis(1_504_095_567_183).unwrap(),
            }],
            pending: vec![PendingReview {
                id: 1,
                draft: ReviewDraft::new(1, "Ana", 5, "Great"),
                created_at: from_unix_millis(1_504_095_567_183).unwrap(),
            }],
        };
        let text = format_reviews_text(&reviews);
        assert_eq!(
            text,
            "****. Steve (2017-08-30)\n    Solid\n***** Ana (2017-08-30) [pending]\n    Great\n"
        );
    }

    #[test]
    fn test_pending_text_mentions_favorites() {
        let stats = StoreStats {
            unsynced_favorites: 2,
            ..Default::default()
        };
        let text = format_pending_text(&[], &stats);
        assert!(text.contains("No reviews waiting"));
        assert!(text.contains("2 favorite change(s)"));
    }

    #[test]
    fn test_drain_text() {
        assert_eq!(format_drain_text(&DrainReport::default()), "Nothing to send.\n");

        let report = DrainReport {
            attempted: 3,
            synced: 2,
            failed: 1,
            discarded: 0,
            favorites_synced: 1,
        };
        assert_eq!(
            format_drain_text(&report),
            "Sent 2 of 3 pending review(s), 1 rejected and kept.\nSent 1 favorite change(s).\n"
        );
    }

    #[test]
    fn test_format_json_report() {
        let json = format_json(&DrainReport::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["attempted"], 0);
        assert!(json.ends_with('\n'));
    }

    #[test]
    fn test_names_text() {
        assert_eq!(
            format_names_text("cuisines", &["Asian".to_string(), "Pizza".to_string()]),
            "Asian\nPizza\n"
        );
        assert_eq!(format_names_text("cuisines", &[]), "No cuisines found.\n");
    }
}
