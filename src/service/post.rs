//! Post service
//!
//! Create/delete posts, likes, and comments, plus the derived
//! average-likes aggregate on the owning account.
//!
//! Aggregate recomputation is best-effort: it runs after every
//! like-count-affecting mutation, and a failure is logged and counted
//! but never propagated to the caller. The triggering operation has
//! already committed; a stale aggregate is tolerated until the next
//! successful recomputation.

use std::sync::Arc;

use chrono::Utc;

use crate::data::Database;
use crate::data::models::{Comment, EntityId, Like, Post, Role};
use crate::error::AppError;
use crate::metrics::{AGGREGATE_RECOMPUTE_FAILURES_TOTAL, POSTS_TOTAL};
use crate::service::guard::{ResourceKind, can_mutate};
use crate::storage::MediaStorage;

/// Caption limit in Unicode code points
const MAX_CAPTION_CHARS: usize = 2200;
/// Comment body limit in Unicode code points
const MAX_COMMENT_CHARS: usize = 1000;

/// Post service
pub struct PostService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
}

impl PostService {
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>) -> Self {
        Self { db, storage }
    }

    /// Create a new post with an image.
    ///
    /// The image is uploaded to media storage first; the post row
    /// references it by key. A post without an image is invalid.
    pub async fn create_post(
        &self,
        owner_id: &str,
        caption: &str,
        image_data: Vec<u8>,
        content_type: &str,
    ) -> Result<Post, AppError> {
        let caption = caption.trim();
        if caption.chars().count() > MAX_CAPTION_CHARS {
            return Err(AppError::Validation(format!(
                "Caption must be at most {} characters",
                MAX_CAPTION_CHARS
            )));
        }
        if image_data.is_empty() {
            return Err(AppError::Validation("Post image is required".to_string()));
        }

        let id = EntityId::new();
        let (image_key, _url) = self
            .storage
            .upload_post_image(&id.0, image_data, content_type)
            .await?;

        let post = Post {
            id: id.0,
            owner_id: owner_id.to_string(),
            caption: caption.to_string(),
            image_key,
            created_at: Utc::now(),
        };

        self.db.insert_post(&post).await?;
        POSTS_TOTAL.inc();
        tracing::info!(post_id = %post.id, owner_id = %owner_id, "Post created");

        // A new zero-like post shifts the owner's mean.
        self.recompute_average_likes(owner_id).await;

        Ok(post)
    }

    /// Get a post with its likes and comments (both newest-first).
    pub async fn get_post(
        &self,
        post_id: &str,
    ) -> Result<(Post, Vec<Like>, Vec<Comment>), AppError> {
        let post = self.db.get_post(post_id).await?.ok_or(AppError::NotFound)?;
        let likes = self.db.get_likes(post_id).await?;
        let comments = self.db.get_comments(post_id).await?;
        Ok((post, likes, comments))
    }

    /// Delete a post, its likes and comments, and its stored image.
    ///
    /// # Errors
    /// - `NotFound` if the post does not exist
    /// - `Forbidden` if the actor neither owns the post nor is admin
    pub async fn delete_post(
        &self,
        actor_id: &str,
        actor_role: Role,
        post_id: &str,
    ) -> Result<(), AppError> {
        let post = self.db.get_post(post_id).await?.ok_or(AppError::NotFound)?;

        if !can_mutate(actor_id, actor_role, &post.owner_id) {
            tracing::warn!(
                actor_id = %actor_id,
                post_id = %post_id,
                resource = ResourceKind::Post.as_str(),
                "Mutation denied"
            );
            return Err(AppError::Forbidden);
        }

        self.db.delete_post(post_id).await?;
        POSTS_TOTAL.dec();
        tracing::info!(post_id = %post_id, actor_id = %actor_id, "Post deleted");

        // Image removal is best-effort; the row is already gone and an
        // orphaned object only costs storage.
        let storage = self.storage.clone();
        let image_key = post.image_key.clone();
        tokio::spawn(async move {
            if let Err(e) = storage.delete(&image_key).await {
                tracing::warn!(key = %image_key, error = %e, "Failed to delete post image");
            }
        });

        self.recompute_average_likes(&post.owner_id).await;

        Ok(())
    }

    /// Like a post.
    ///
    /// # Errors
    /// - `NotFound` if the post does not exist
    /// - `AlreadyLiked` if this account already liked it
    pub async fn like(&self, actor_id: &str, post_id: &str) -> Result<(), AppError> {
        let post = self.db.get_post(post_id).await?.ok_or(AppError::NotFound)?;

        let like = Like {
            id: EntityId::new().0,
            post_id: post_id.to_string(),
            account_id: actor_id.to_string(),
            liked_at: Utc::now(),
        };

        if !self.db.insert_like(&like).await? {
            return Err(AppError::AlreadyLiked);
        }

        self.recompute_average_likes(&post.owner_id).await;

        Ok(())
    }

    /// Remove a like from a post.
    ///
    /// # Errors
    /// - `NotFound` if the post does not exist
    /// - `NotLiked` if this account had not liked it
    pub async fn unlike(&self, actor_id: &str, post_id: &str) -> Result<(), AppError> {
        let post = self.db.get_post(post_id).await?.ok_or(AppError::NotFound)?;

        if !self.db.delete_like(post_id, actor_id).await? {
            return Err(AppError::NotLiked);
        }

        self.recompute_average_likes(&post.owner_id).await;

        Ok(())
    }

    /// Add a comment to a post.
    ///
    /// Comments are stored newest-first; readers get them in reverse
    /// insertion order.
    pub async fn add_comment(
        &self,
        actor_id: &str,
        post_id: &str,
        body: &str,
    ) -> Result<Comment, AppError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::Validation("Comment cannot be empty".to_string()));
        }
        if body.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::Validation(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_CHARS
            )));
        }

        if self.db.get_post(post_id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let comment = Comment {
            id: EntityId::new().0,
            post_id: post_id.to_string(),
            account_id: actor_id.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        };

        self.db.insert_comment(&comment).await?;

        Ok(comment)
    }

    /// Delete a comment.
    ///
    /// Allowed for the comment author, the post owner, and admins.
    ///
    /// # Errors
    /// - `NotFound` if the post or the comment does not exist
    /// - `Forbidden` otherwise
    pub async fn delete_comment(
        &self,
        actor_id: &str,
        actor_role: Role,
        post_id: &str,
        comment_id: &str,
    ) -> Result<(), AppError> {
        let post = self.db.get_post(post_id).await?.ok_or(AppError::NotFound)?;
        let comment = self
            .db
            .get_comment(post_id, comment_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let allowed =
            can_mutate(actor_id, actor_role, &comment.account_id) || actor_id == post.owner_id;
        if !allowed {
            tracing::warn!(
                actor_id = %actor_id,
                post_id = %post_id,
                comment_id = %comment_id,
                resource = ResourceKind::Comment.as_str(),
                "Mutation denied"
            );
            return Err(AppError::Forbidden);
        }

        if !self.db.delete_comment(post_id, comment_id).await? {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    /// Recompute an account's average-likes aggregate, best-effort.
    ///
    /// `ceil(mean(like count per post))`, 0 for an account with no
    /// posts. Failures are logged and counted, never propagated.
    pub async fn recompute_average_likes(&self, owner_id: &str) {
        if let Err(e) = self.try_recompute_average_likes(owner_id).await {
            AGGREGATE_RECOMPUTE_FAILURES_TOTAL.inc();
            tracing::warn!(
                owner_id = %owner_id,
                error = %e,
                "Average-likes recomputation failed; aggregate left stale"
            );
        }
    }

    async fn try_recompute_average_likes(&self, owner_id: &str) -> Result<(), AppError> {
        let counts = self.db.get_owner_like_counts(owner_id).await?;

        let average = if counts.is_empty() {
            0
        } else {
            let total: i64 = counts.iter().sum();
            let n = counts.len() as i64;
            // Integer ceiling of total / n.
            (total + n - 1) / n
        };

        self.db.update_average_likes(owner_id, average).await?;
        Ok(())
    }
}
