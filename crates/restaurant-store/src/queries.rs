//! Query builder for cached reviews.
//!
//! [`ReviewQuery`] filters the synced and pending review sets through the
//! `restaurant_id` index, optionally narrowed to a `createdAt` window and
//! paginated.
//!
//! # Example
//!
//! ```
//! use restaurant_store::{ReviewQuery, Store};
//!
//! let store = Store::open_in_memory()?;
//!
//! // Latest five reviews for restaurant 3
//! let query = ReviewQuery::new().restaurant(3).limit(5);
//! let reviews = store.query_reviews(&query)?;
//! assert!(reviews.is_empty());
//! # Ok::<(), restaurant_store::Error>(())
//! ```

use time::OffsetDateTime;

use restaurant_types::to_unix_millis;

/// Fluent query builder for reviews.
///
/// Used by [`Store::query_reviews`](crate::Store::query_reviews) and
/// [`Store::query_pending_reviews`](crate::Store::query_pending_reviews).
/// By default results are ordered by `createdAt` descending (newest first).
#[derive(Debug, Default, Clone)]
pub struct ReviewQuery {
    /// Filter by restaurant.
    pub restaurant_id: Option<i64>,
    /// Include only reviews created at or after this time.
    pub since: Option<OffsetDateTime>,
    /// Include only reviews created at or before this time.
    pub until: Option<OffsetDateTime>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
    /// Order by `createdAt` descending (newest first).
    pub newest_first: bool,
}

impl ReviewQuery {
    /// Create a new query: every restaurant, no window, no limit, newest first.
    pub fn new() -> Self {
        Self {
            newest_first: true,
            ..Default::default()
        }
    }

    /// Only reviews of the given restaurant.
    pub fn restaurant(mut self, restaurant_id: i64) -> Self {
        self.restaurant_id = Some(restaurant_id);
        self
    }

    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.since = Some(time);
        self
    }

    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.until = Some(time);
        self
    }

    /// Limit the maximum number of results returned.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first N results.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Chronological order, the order reviews are displayed in.
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(restaurant_id) = self.restaurant_id {
            conditions.push("restaurant_id = ?");
            params.push(Box::new(restaurant_id));
        }

        if let Some(since) = self.since {
            conditions.push("created_at >= ?");
            params.push(Box::new(to_unix_millis(since)));
        }

        if let Some(until) = self.until {
            conditions.push("created_at <= ?");
            params.push(Box::new(to_unix_millis(until)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    /// Build the full SQL query against `table` (`reviews` or `pending_reviews`).
    pub(crate) fn build_sql(&self, table: &str) -> String {
        let (where_clause, _) = self.build_where();
        let order = if self.newest_first { "DESC" } else { "ASC" };

        let mut sql = format!(
            "SELECT id, restaurant_id, name, rating, comments, created_at \
             FROM {} {} ORDER BY created_at {}, id {}",
            table, where_clause, order, order
        );

        // SQLite only accepts OFFSET after a LIMIT clause.
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset))
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        sql
    }
}
