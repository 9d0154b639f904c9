//! SQLite database operations
//!
//! All database access goes through this module.
//!
//! The follow graph is stored as two independent tables with no
//! cross-table transaction; callers (the relationship service) own the
//! write order and the reconciliation of asymmetric edges. Everything
//! else is ordinary single-statement or single-transaction CRUD.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert a new account
    pub async fn insert_account(&self, account: &Account) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, username, email, password_hash, display_name, bio, website,
                avatar_key, role, average_likes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.display_name)
        .bind(&account.bio)
        .bind(&account.website)
        .bind(&account.avatar_key)
        .bind(&account.role)
        .bind(account.average_likes)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get account by ID
    pub async fn get_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Get account by username
    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Get account by email
    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Check whether an account row exists
    pub async fn account_exists(&self, id: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists > 0)
    }

    /// Resolve a set of account ids to summary records (batch, chunked)
    pub async fn get_account_summaries(
        &self,
        ids: &[String],
    ) -> Result<Vec<AccountSummary>, AppError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut all_summaries = Vec::new();

        for chunk in ids.chunks(100) {
            let placeholders = chunk.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let query = format!(
                "SELECT id, username, display_name, avatar_key FROM accounts WHERE id IN ({})",
                placeholders
            );

            let mut query_builder = sqlx::query_as::<_, AccountSummary>(&query);
            for id in chunk {
                query_builder = query_builder.bind(id);
            }

            let summaries = query_builder.fetch_all(&self.pool).await?;
            all_summaries.extend(summaries);
        }

        Ok(all_summaries)
    }

    /// Update account avatar key by account ID.
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching account row exists.
    pub async fn update_account_avatar_key(
        &self,
        account_id: &str,
        avatar_key: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET avatar_key = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(avatar_key)
        .bind(updated_at)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Persist the derived average-likes aggregate for an account.
    pub async fn update_average_likes(
        &self,
        account_id: &str,
        average_likes: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE accounts SET average_likes = ? WHERE id = ?")
            .bind(average_likes)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Change an account's role ("user" or "admin").
    pub async fn set_account_role(&self, account_id: &str, role: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE accounts SET role = ? WHERE id = ?")
            .bind(role)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete an account row.
    ///
    /// Cascade cleanup (edges, posts, likes, comments) is orchestrated by
    /// the account service, not here.
    pub async fn delete_account(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Follow graph
    //
    // Two independent tables, written by the relationship service in a
    // fixed order: actor side first. No cross-table transaction.
    // =========================================================================

    /// Insert actor-side follow edge.
    ///
    /// # Returns
    /// `false` if the edge already existed (conflict-guarded insert).
    pub async fn insert_following_edge(
        &self,
        account_id: &str,
        target_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO account_following (account_id, target_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (account_id, target_id) DO NOTHING
            "#,
        )
        .bind(account_id)
        .bind(target_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Insert counterparty-side follower edge.
    ///
    /// Tolerates an already-present row so reconciliation and retried
    /// requests converge instead of failing.
    pub async fn insert_follower_edge(
        &self,
        account_id: &str,
        follower_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO account_followers (account_id, follower_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (account_id, follower_id) DO NOTHING
            "#,
        )
        .bind(account_id)
        .bind(follower_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove actor-side follow edge.
    pub async fn delete_following_edge(
        &self,
        account_id: &str,
        target_id: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM account_following WHERE account_id = ? AND target_id = ?")
                .bind(account_id)
                .bind(target_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove counterparty-side follower edge.
    pub async fn delete_follower_edge(
        &self,
        account_id: &str,
        follower_id: &str,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM account_followers WHERE account_id = ? AND follower_id = ?")
                .bind(account_id)
                .bind(follower_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Whether an actor-side edge actor -> target exists.
    pub async fn is_following(&self, account_id: &str, target_id: &str) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(1) FROM account_following WHERE account_id = ? AND target_id = ?",
        )
        .bind(account_id)
        .bind(target_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Ids this account follows (actor side).
    pub async fn get_following_ids(&self, account_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT target_id FROM account_following WHERE account_id = ? ORDER BY created_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Ids following this account (counterparty side).
    pub async fn get_follower_ids(&self, account_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT follower_id FROM account_followers WHERE account_id = ? ORDER BY created_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// All actor-side edges as (actor, target, created_at). Used by reconciliation.
    pub async fn all_following_edges(&self) -> Result<Vec<FollowEdge>, AppError> {
        let edges = sqlx::query_as::<_, FollowEdge>(
            "SELECT account_id, target_id, created_at FROM account_following",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(edges)
    }

    /// All counterparty-side edges reshaped as (actor, target, created_at),
    /// i.e. follower -> account. Used by reconciliation.
    pub async fn all_follower_edges(&self) -> Result<Vec<FollowEdge>, AppError> {
        let edges = sqlx::query_as::<_, FollowEdge>(
            r#"
            SELECT follower_id AS account_id, account_id AS target_id, created_at
            FROM account_followers
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(edges)
    }

    /// Remove every follow edge involving this account, in both tables
    /// and both directions. Used by the account-deletion cascade.
    pub async fn remove_account_from_graph(&self, account_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM account_following WHERE account_id = ? OR target_id = ?")
            .bind(account_id)
            .bind(account_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM account_followers WHERE account_id = ? OR follower_id = ?")
            .bind(account_id)
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert a new post
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, owner_id, caption, image_key, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.owner_id)
        .bind(&post.caption)
        .bind(&post.image_key)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get post by ID
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// Delete a post and its likes/comments in one transaction.
    pub async fn delete_post(&self, id: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM post_likes WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM post_comments WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() == 1)
    }

    /// Posts by a single owner, reverse-chronological.
    pub async fn get_posts_by_owner(&self, owner_id: &str) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Posts by any owner in the set (batch operation to avoid N+1).
    ///
    /// Chunked because of SQLite's bound-parameter limit; the final
    /// newest-first ordering across chunks is restored by the caller.
    pub async fn get_posts_by_owners(&self, owner_ids: &[String]) -> Result<Vec<Post>, AppError> {
        if owner_ids.is_empty() {
            return Ok(vec![]);
        }

        let mut all_posts = Vec::new();

        for chunk in owner_ids.chunks(100) {
            let placeholders = chunk.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let query = format!(
                "SELECT * FROM posts WHERE owner_id IN ({}) ORDER BY created_at DESC, id DESC",
                placeholders
            );

            let mut query_builder = sqlx::query_as::<_, Post>(&query);
            for owner_id in chunk {
                query_builder = query_builder.bind(owner_id);
            }

            let posts = query_builder.fetch_all(&self.pool).await?;
            all_posts.extend(posts);
        }

        Ok(all_posts)
    }

    /// Global reverse-chronological post listing with external pagination.
    pub async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Like count per post for one owner; one row per post, zero included.
    ///
    /// Input to the average-likes aggregate.
    pub async fn get_owner_like_counts(&self, owner_id: &str) -> Result<Vec<i64>, AppError> {
        let counts = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(l.id)
            FROM posts p
            LEFT JOIN post_likes l ON l.post_id = p.id
            WHERE p.owner_id = ?
            GROUP BY p.id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Like counts for a set of posts as (post_id, count).
    pub async fn get_like_counts(
        &self,
        post_ids: &[String],
    ) -> Result<Vec<(String, i64)>, AppError> {
        self.count_rows_by_post("post_likes", post_ids).await
    }

    /// Comment counts for a set of posts as (post_id, count).
    pub async fn get_comment_counts(
        &self,
        post_ids: &[String],
    ) -> Result<Vec<(String, i64)>, AppError> {
        self.count_rows_by_post("post_comments", post_ids).await
    }

    async fn count_rows_by_post(
        &self,
        table: &str,
        post_ids: &[String],
    ) -> Result<Vec<(String, i64)>, AppError> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        let mut all_counts = Vec::new();

        for chunk in post_ids.chunks(100) {
            let placeholders = chunk.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let query = format!(
                "SELECT post_id, COUNT(1) FROM {} WHERE post_id IN ({}) GROUP BY post_id",
                table, placeholders
            );

            let mut query_builder = sqlx::query_as::<_, (String, i64)>(&query);
            for post_id in chunk {
                query_builder = query_builder.bind(post_id);
            }

            let counts = query_builder.fetch_all(&self.pool).await?;
            all_counts.extend(counts);
        }

        Ok(all_counts)
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Record a like.
    ///
    /// # Returns
    /// `false` if this account already liked the post (conflict-guarded).
    pub async fn insert_like(&self, like: &Like) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO post_likes (id, post_id, account_id, liked_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (post_id, account_id) DO NOTHING
            "#,
        )
        .bind(&like.id)
        .bind(&like.post_id)
        .bind(&like.account_id)
        .bind(like.liked_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove a like.
    ///
    /// # Returns
    /// `false` if the account had not liked the post.
    pub async fn delete_like(&self, post_id: &str, account_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND account_id = ?")
            .bind(post_id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Likes for a post, newest-first (ULID tiebreak for same-instant likes).
    pub async fn get_likes(&self, post_id: &str) -> Result<Vec<Like>, AppError> {
        let likes = sqlx::query_as::<_, Like>(
            "SELECT * FROM post_likes WHERE post_id = ? ORDER BY liked_at DESC, id DESC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(likes)
    }

    /// Delete every like placed by this account and return the distinct
    /// owners whose aggregates need recomputation. Cascade helper.
    pub async fn delete_likes_by_account(&self, account_id: &str) -> Result<Vec<String>, AppError> {
        let affected_owners = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT p.owner_id
            FROM post_likes l
            JOIN posts p ON p.id = l.post_id
            WHERE l.account_id = ?
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        sqlx::query("DELETE FROM post_likes WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(affected_owners)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert a comment
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO post_comments (id, post_id, account_id, body, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.post_id)
        .bind(&comment.account_id)
        .bind(&comment.body)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get one comment scoped to its post
    pub async fn get_comment(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<Option<Comment>, AppError> {
        let comment =
            sqlx::query_as::<_, Comment>("SELECT * FROM post_comments WHERE post_id = ? AND id = ?")
                .bind(post_id)
                .bind(comment_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(comment)
    }

    /// Delete exactly one comment by id within a post.
    pub async fn delete_comment(&self, post_id: &str, comment_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM post_comments WHERE post_id = ? AND id = ?")
            .bind(post_id)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Comments for a post, newest-first.
    pub async fn get_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM post_comments WHERE post_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Delete every comment authored by this account. Cascade helper.
    pub async fn delete_comments_by_account(&self, account_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM post_comments WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
