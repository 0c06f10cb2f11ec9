//! Main store implementation.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;
use tracing::{debug, info};

use restaurant_types::{
    FavoriteMarker, LatLng, PendingReview, Restaurant, Review, ReviewDraft, from_unix_millis,
    to_unix_millis,
};

use crate::error::{Error, Result};
use crate::models::{RecordSet, StoreStats};
use crate::queries::ReviewQuery;
use crate::schema;

const RESTAURANT_COLUMNS: &str = "id, name, address, neighborhood, cuisine_type, lat, lng, \
     photograph, operating_hours, is_favorite, created_at";

/// SQLite-based store for restaurants, reviews and favorites.
///
/// Every method takes `&self`; multi-statement operations run inside a
/// single transaction so that they commit all-or-nothing.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    // === Record set operations ===

    /// Number of records in a set.
    pub fn count(&self, set: RecordSet) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", set.table());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Remove every record from a set.
    pub fn clear(&self, set: RecordSet) -> Result<usize> {
        let removed = self.conn.execute(&format!("DELETE FROM {}", set.table()), [])?;
        info!("Cleared {} record(s) from {}", removed, set);
        Ok(removed)
    }

    /// Evict all but the `keep` most recent records of a set.
    ///
    /// Recency is `createdAt` (`updated_at` for favorites), newest first,
    /// ties broken by id. Returns the number of evicted records.
    pub fn delete_oldest(&self, set: RecordSet, keep: usize) -> Result<usize> {
        delete_oldest_in(&self.conn, set, keep)
    }

    /// Row counts for every set.
    pub fn stats(&self) -> Result<StoreStats> {
        let unsynced: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM favorites WHERE synced = 0",
            [],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            restaurants: self.count(RecordSet::Restaurants)?,
            reviews: self.count(RecordSet::Reviews)?,
            pending_reviews: self.count(RecordSet::PendingReviews)?,
            favorites: self.count(RecordSet::Favorites)?,
            unsynced_favorites: unsynced as u64,
        })
    }
}

// Restaurant operations
impl Store {
    /// Insert or overwrite a restaurant by id.
    pub fn put_restaurant(&self, restaurant: &Restaurant) -> Result<()> {
        upsert_restaurant(&self.conn, restaurant)
    }

    /// Store a batch of restaurants and trim the set to `keep`, atomically.
    ///
    /// Favorite toggles that have not reached the server yet are re-applied
    /// on top of the incoming records. Returns the number of evicted rows.
    pub fn put_restaurants_capped(&self, restaurants: &[Restaurant], keep: usize) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for restaurant in restaurants {
            upsert_restaurant(&tx, restaurant)?;
        }
        tx.execute(
            "UPDATE restaurants
             SET is_favorite = (
                 SELECT is_favorite FROM favorites WHERE favorites.id = restaurants.id
             )
             WHERE id IN (SELECT id FROM favorites WHERE synced = 0)",
            [],
        )?;
        let evicted = delete_oldest_in(&tx, RecordSet::Restaurants, keep)?;
        tx.commit()?;

        debug!(
            "Stored {} restaurant(s), evicted {}",
            restaurants.len(),
            evicted
        );
        Ok(evicted)
    }

    /// Get a restaurant by id.
    pub fn get_restaurant(&self, id: i64) -> Result<Option<Restaurant>> {
        let sql = format!("SELECT {} FROM restaurants WHERE id = ?", RESTAURANT_COLUMNS);
        let restaurant = self
            .conn
            .query_row(&sql, [id], restaurant_from_row)
            .optional()?;
        Ok(restaurant)
    }

    /// All cached restaurants, oldest `createdAt` first.
    pub fn list_restaurants(&self) -> Result<Vec<Restaurant>> {
        let sql = format!(
            "SELECT {} FROM restaurants ORDER BY created_at ASC, id ASC",
            RESTAURANT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let restaurants = stmt
            .query_map([], restaurant_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(restaurants)
    }

    /// Set the cached `is_favorite` flag. Returns false if the restaurant is
    /// not cached.
    pub fn set_restaurant_favorite(&self, id: i64, is_favorite: bool) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE restaurants SET is_favorite = ?2 WHERE id = ?1",
            rusqlite::params![id, is_favorite],
        )?;
        Ok(updated > 0)
    }
}

// Review operations
impl Store {
    /// Insert or overwrite a synced review by id.
    pub fn put_review(&self, review: &Review) -> Result<()> {
        upsert_review(&self.conn, "reviews", review.id, review)
    }

    /// Store a batch of synced reviews and trim the set to `keep`, atomically.
    pub fn put_reviews_capped(&self, reviews: &[Review], keep: usize) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for review in reviews {
            upsert_review(&tx, "reviews", review.id, review)?;
        }
        let evicted = delete_oldest_in(&tx, RecordSet::Reviews, keep)?;
        tx.commit()?;

        debug!("Stored {} review(s), evicted {}", reviews.len(), evicted);
        Ok(evicted)
    }

    /// Get a synced review by id.
    pub fn get_review(&self, id: i64) -> Result<Option<Review>> {
        let review = self
            .conn
            .query_row(
                "SELECT id, restaurant_id, name, rating, comments, created_at
                 FROM reviews WHERE id = ?",
                [id],
                review_from_row,
            )
            .optional()?;
        Ok(review)
    }

    /// Query synced reviews.
    pub fn query_reviews(&self, query: &ReviewQuery) -> Result<Vec<Review>> {
        let sql = query.build_sql("reviews");
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let reviews = stmt
            .query_map(params_ref.as_slice(), review_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(reviews)
    }

    /// Synced reviews of one restaurant, in display order.
    pub fn reviews_for_restaurant(&self, restaurant_id: i64) -> Result<Vec<Review>> {
        self.query_reviews(&ReviewQuery::new().restaurant(restaurant_id).oldest_first())
    }
}

// Pending review operations
impl Store {
    /// The temporary id the next queued review will get.
    ///
    /// One past the highest id in the pending set, so ids stay unique even
    /// when earlier entries were replayed out of order.
    pub fn next_pending_id(&self) -> Result<i64> {
        next_pending_id_in(&self.conn)
    }

    /// Queue a review written offline. Id assignment and insert share one
    /// transaction.
    pub fn insert_pending_review(
        &self,
        draft: &ReviewDraft,
        created_at: OffsetDateTime,
    ) -> Result<PendingReview> {
        let tx = self.conn.unchecked_transaction()?;
        let pending = PendingReview {
            id: next_pending_id_in(&tx)?,
            draft: draft.clone(),
            created_at,
        };
        upsert_pending(&tx, &pending)?;
        tx.commit()?;

        info!(
            "Queued review {} for restaurant {}",
            pending.id, pending.draft.restaurant_id
        );
        Ok(pending)
    }

    /// Insert or overwrite a pending review by its temporary id.
    pub fn put_pending_review(&self, pending: &PendingReview) -> Result<()> {
        upsert_pending(&self.conn, pending)
    }

    /// Get a pending review by temporary id.
    pub fn get_pending_review(&self, id: i64) -> Result<Option<PendingReview>> {
        let pending = self
            .conn
            .query_row(
                "SELECT id, restaurant_id, name, rating, comments, created_at
                 FROM pending_reviews WHERE id = ?",
                [id],
                pending_from_row,
            )
            .optional()?;
        Ok(pending)
    }

    /// The whole queue in submission order.
    pub fn pending_reviews(&self) -> Result<Vec<PendingReview>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, restaurant_id, name, rating, comments, created_at
             FROM pending_reviews ORDER BY id ASC",
        )?;
        let pending = stmt
            .query_map([], pending_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pending)
    }

    /// Query pending reviews.
    pub fn query_pending_reviews(&self, query: &ReviewQuery) -> Result<Vec<PendingReview>> {
        let sql = query.build_sql("pending_reviews");
        let (_, params) = query.build_where();

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let pending = stmt
            .query_map(params_ref.as_slice(), pending_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(pending)
    }

    /// Pending reviews of one restaurant, in display order.
    pub fn pending_reviews_for_restaurant(&self, restaurant_id: i64) -> Result<Vec<PendingReview>> {
        self.query_pending_reviews(&ReviewQuery::new().restaurant(restaurant_id).oldest_first())
    }

    /// Remove the given pending ids, leaving anything queued since untouched.
    pub fn delete_pending(&self, ids: &[i64]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM pending_reviews WHERE id = ?")?;
            for id in ids {
                removed += stmt.execute([id])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    /// Move a replayed review from the pending set to the synced set.
    ///
    /// Inserting the confirmed record, removing the pending one and trimming
    /// the synced set to `keep` commit together. Returns false when the
    /// pending id was already gone, in which case nothing is written.
    pub fn promote_pending(
        &self,
        pending_id: i64,
        confirmed: &Review,
        keep: usize,
    ) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM pending_reviews WHERE id = ?", [pending_id])?;
        if removed == 0 {
            return Ok(false);
        }
        upsert_review(&tx, "reviews", confirmed.id, confirmed)?;
        delete_oldest_in(&tx, RecordSet::Reviews, keep)?;
        tx.commit()?;

        debug!("Promoted pending {} to review {}", pending_id, confirmed.id);
        Ok(true)
    }
}

// Favorite operations
impl Store {
    /// Record a local favorite toggle.
    pub fn mark_favorite(&self, id: i64, is_favorite: bool, synced: bool) -> Result<()> {
        upsert_favorite(&self.conn, id, is_favorite, synced)
    }

    /// Apply a favorite toggle made offline.
    ///
    /// The cached restaurant's flag and an unsynced marker commit together.
    /// Returns false when the restaurant is not cached; the marker is
    /// stored anyway.
    pub fn queue_favorite(&self, id: i64, is_favorite: bool) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let updated = tx.execute(
            "UPDATE restaurants SET is_favorite = ?2 WHERE id = ?1",
            rusqlite::params![id, is_favorite],
        )?;
        upsert_favorite(&tx, id, is_favorite, false)?;
        tx.commit()?;
        Ok(updated > 0)
    }

    /// Get the marker for a restaurant.
    pub fn get_favorite(&self, id: i64) -> Result<Option<FavoriteMarker>> {
        let marker = self
            .conn
            .query_row(
                "SELECT id, is_favorite, synced FROM favorites WHERE id = ?",
                [id],
                favorite_from_row,
            )
            .optional()?;
        Ok(marker)
    }

    /// True when the restaurant is marked favorite locally.
    pub fn is_marked_favorite(&self, id: i64) -> Result<bool> {
        Ok(self.get_favorite(id)?.is_some_and(|m| m.is_favorite))
    }

    /// Toggles made offline that the server has not seen yet.
    pub fn unsynced_favorites(&self) -> Result<Vec<FavoriteMarker>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, is_favorite, synced FROM favorites
             WHERE synced = 0 ORDER BY updated_at ASC",
        )?;
        let markers = stmt
            .query_map([], favorite_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(markers)
    }

    /// Flag a marker as acknowledged by the server. Returns false if there is
    /// no marker.
    pub fn mark_favorite_synced(&self, id: i64) -> Result<bool> {
        let updated = self
            .conn
            .execute("UPDATE favorites SET synced = 1 WHERE id = ?", [id])?;
        Ok(updated > 0)
    }

    /// Remove the marker for a restaurant.
    pub fn unmark_favorite(&self, id: i64) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM favorites WHERE id = ?", [id])?;
        Ok(removed > 0)
    }

    /// Apply the server's answer to a favorite toggle.
    ///
    /// The returned restaurant overwrites the cached one; the marker is kept
    /// (synced) when it is a favorite and removed otherwise.
    pub fn confirm_favorite(&self, restaurant: &Restaurant) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        upsert_restaurant(&tx, restaurant)?;
        if restaurant.is_favorite {
            upsert_favorite(&tx, restaurant.id, true, true)?;
        } else {
            tx.execute("DELETE FROM favorites WHERE id = ?", [restaurant.id])?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn delete_oldest_in(conn: &Connection, set: RecordSet, keep: usize) -> Result<usize> {
    let sql = format!(
        "DELETE FROM {table} WHERE id IN (
             SELECT id FROM {table} ORDER BY {column} DESC, id DESC LIMIT -1 OFFSET ?1
         )",
        table = set.table(),
        column = set.recency_column(),
    );
    // Anything past i64::MAX keeps every row.
    let offset = i64::try_from(keep).unwrap_or(i64::MAX);
    let evicted = conn.execute(&sql, [offset])?;
    if evicted > 0 {
        debug!("Evicted {} record(s) from {} (keep {})", evicted, set, keep);
    }
    Ok(evicted)
}

fn next_pending_id_in(conn: &Connection) -> Result<i64> {
    let id: i64 = conn.query_row(
        "SELECT COALESCE(MAX(id), 0) + 1 FROM pending_reviews",
        [],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn upsert_restaurant(conn: &Connection, r: &Restaurant) -> Result<()> {
    let hours = serde_json::to_string(&r.operating_hours)?;
    conn.execute(
        "INSERT INTO restaurants (id, name, address, neighborhood, cuisine_type, lat, lng,
             photograph, operating_hours, is_favorite, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            address = excluded.address,
            neighborhood = excluded.neighborhood,
            cuisine_type = excluded.cuisine_type,
            lat = excluded.lat,
            lng = excluded.lng,
            photograph = excluded.photograph,
            operating_hours = excluded.operating_hours,
            is_favorite = excluded.is_favorite,
            created_at = excluded.created_at",
        rusqlite::params![
            r.id,
            r.name,
            r.address,
            r.neighborhood,
            r.cuisine_type,
            r.latlng.lat,
            r.latlng.lng,
            r.photograph,
            hours,
            r.is_favorite,
            to_unix_millis(r.created_at),
        ],
    )?;
    Ok(())
}

fn upsert_review(conn: &Connection, table: &str, id: i64, review: &Review) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (id, restaurant_id, name, rating, comments, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            restaurant_id = excluded.restaurant_id,
            name = excluded.name,
            rating = excluded.rating,
            comments = excluded.comments,
            created_at = excluded.created_at",
        table
    );
    conn.execute(
        &sql,
        rusqlite::params![
            id,
            review.restaurant_id,
            review.name,
            review.rating,
            review.comments,
            to_unix_millis(review.created_at),
        ],
    )?;
    Ok(())
}

fn upsert_pending(conn: &Connection, pending: &PendingReview) -> Result<()> {
    let as_review = pending.draft.clone().confirm(pending.id, pending.created_at);
    upsert_review(conn, "pending_reviews", pending.id, &as_review)
}

fn upsert_favorite(conn: &Connection, id: i64, is_favorite: bool, synced: bool) -> Result<()> {
    conn.execute(
        "INSERT INTO favorites (id, is_favorite, synced, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            is_favorite = excluded.is_favorite,
            synced = excluded.synced,
            updated_at = excluded.updated_at",
        rusqlite::params![
            id,
            is_favorite,
            synced,
            to_unix_millis(OffsetDateTime::now_utc())
        ],
    )?;
    Ok(())
}

fn conversion_error<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn millis_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<OffsetDateTime> {
    let millis: i64 = row.get(idx)?;
    from_unix_millis(millis).ok_or_else(|| {
        conversion_error(idx, Type::Integer, Error::InvalidTimestamp(millis.to_string()))
    })
}

fn rating_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<u8> {
    let rating: i64 = row.get(idx)?;
    u8::try_from(rating).map_err(|e| conversion_error(idx, Type::Integer, e))
}

fn restaurant_from_row(row: &Row<'_>) -> rusqlite::Result<Restaurant> {
    let hours: String = row.get(8)?;
    let operating_hours: BTreeMap<String, String> =
        serde_json::from_str(&hours).map_err(|e| conversion_error(8, Type::Text, e))?;

    Ok(Restaurant {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        neighborhood: row.get(3)?,
        cuisine_type: row.get(4)?,
        latlng: LatLng {
            lat: row.get(5)?,
            lng: row.get(6)?,
        },
        photograph: row.get(7)?,
        operating_hours,
        is_favorite: row.get(9)?,
        created_at: millis_column(row, 10)?,
    })
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        restaurant_id: row.get(1)?,
        name: row.get(2)?,
        rating: rating_column(row, 3)?,
        comments: row.get(4)?,
        created_at: millis_column(row, 5)?,
    })
}

fn pending_from_row(row: &Row<'_>) -> rusqlite::Result<PendingReview> {
    Ok(PendingReview {
        id: row.get(0)?,
        draft: ReviewDraft {
            restaurant_id: row.get(1)?,
            name: row.get(2)?,
            rating: rating_column(row, 3)?,
            comments: row.get(4)?,
        },
        created_at: millis_column(row, 5)?,
    })
}

fn favorite_from_row(row: &Row<'_>) -> rusqlite::Result<FavoriteMarker> {
    Ok(FavoriteMarker {
        id: row.get(0)?,
        is_favorite: row.get(1)?,
        synced: row.get(2)?,
    })
}
