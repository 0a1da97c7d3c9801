//! Deduplicated item upserts and per-collection queries.

use crate::error::DatabaseError;
use crate::types::Post;
use crate::{Error, Result};
use chrono::{DateTime, Utc};

use super::{Database, ItemRow};

/// What an upsert did to the item row
///
/// `Inserted` and `Updated` count as accepted; a byte-identical
/// re-delivery is `Unchanged` and does not advance task progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The item was new to its collection
    Inserted,
    /// The item existed and at least one field changed
    Updated,
    /// The item existed with identical content
    Unchanged,
}

impl UpsertOutcome {
    /// Whether this outcome counts toward a task's accepted items
    pub fn is_accepted(&self) -> bool {
        matches!(self, UpsertOutcome::Inserted | UpsertOutcome::Updated)
    }
}

impl Database {
    /// Upsert a post into its collection, keyed by `(collection, post_id)`
    ///
    /// `scraped_at` is written on insert and refreshed on update; an
    /// unchanged row keeps its original timestamp.
    pub async fn upsert_item(
        &self,
        collection: &str,
        post: &Post,
        source_type: &str,
        query: &str,
        scraped_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to begin upsert transaction: {}",
                e
            )))
        })?;

        let existing = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT
                id, collection, post_id, author, title, score, url,
                created_at, permalink, num_comments, selftext, community,
                source_type, query, scraped_at
            FROM items
            WHERE collection = ? AND post_id = ?
            "#,
        )
        .bind(collection)
        .bind(&post.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to look up item: {}",
                e
            )))
        })?;

        let outcome = match existing {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO items (
                        collection, post_id, author, title, score, url,
                        created_at, permalink, num_comments, selftext,
                        community, source_type, query, scraped_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(collection)
                .bind(&post.id)
                .bind(&post.author)
                .bind(&post.title)
                .bind(post.score)
                .bind(&post.url)
                .bind(post.created_at.timestamp())
                .bind(&post.permalink)
                .bind(post.num_comments)
                .bind(&post.selftext)
                .bind(&post.community)
                .bind(source_type)
                .bind(query)
                .bind(scraped_at.timestamp())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to insert item: {}",
                        e
                    )))
                })?;

                UpsertOutcome::Inserted
            }
            Some(row) if item_matches(&row, post) => UpsertOutcome::Unchanged,
            Some(row) => {
                sqlx::query(
                    r#"
                    UPDATE items
                    SET author = ?, title = ?, score = ?, url = ?,
                        permalink = ?, num_comments = ?, selftext = ?,
                        scraped_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&post.author)
                .bind(&post.title)
                .bind(post.score)
                .bind(&post.url)
                .bind(&post.permalink)
                .bind(post.num_comments)
                .bind(&post.selftext)
                .bind(scraped_at.timestamp())
                .bind(row.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to update item: {}",
                        e
                    )))
                })?;

                UpsertOutcome::Updated
            }
        };

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit upsert: {}",
                e
            )))
        })?;

        Ok(outcome)
    }

    /// List a collection's items, newest first by platform creation time
    pub async fn list_items(&self, collection: &str) -> Result<Vec<ItemRow>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT
                id, collection, post_id, author, title, score, url,
                created_at, permalink, num_comments, selftext, community,
                source_type, query, scraped_at
            FROM items
            WHERE collection = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list items: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Number of items stored in a collection
    pub async fn count_items(&self, collection: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count items: {}",
                    e
                )))
            })?;

        Ok(count)
    }

    /// Number of items stored across all collections
    pub async fn count_all_items(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count all items: {}",
                    e
                )))
            })?;

        Ok(count)
    }
}

/// Whether the stored row already reflects this post's mutable fields
fn item_matches(row: &ItemRow, post: &Post) -> bool {
    row.author == post.author
        && row.title == post.title
        && row.score == post.score
        && row.url == post.url
        && row.permalink == post.permalink
        && row.num_comments == post.num_comments
        && row.selftext == post.selftext
}
