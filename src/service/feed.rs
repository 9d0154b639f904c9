//! Feed assembler
//!
//! Read-only projections over accounts, the follow graph, and posts.
//! The home feed is recomputed per request from current state; nothing
//! is materialized or cached.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::data::Database;
use crate::data::models::{AccountSummary, Post};
use crate::error::AppError;
use crate::metrics::FEED_BUILD_DURATION_SECONDS;

/// One feed entry: a post joined with its author and counters.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub post: Post,
    pub author: AccountSummary,
    pub like_count: i64,
    pub comment_count: i64,
}

/// Feed service
pub struct FeedService {
    db: Arc<Database>,
}

impl FeedService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Build the home feed for a viewer.
    ///
    /// Source set: posts by accounts the viewer follows plus the
    /// viewer's own posts. Ordered newest-first by `created_at` with
    /// post id (ULID, time-sortable) as the tiebreaker, so the order
    /// is deterministic for same-instant posts.
    pub async fn build_feed(&self, viewer_id: &str) -> Result<Vec<FeedItem>, AppError> {
        let timer = FEED_BUILD_DURATION_SECONDS.start_timer();

        if !self.db.account_exists(viewer_id).await? {
            return Err(AppError::NotFound);
        }

        let mut owner_ids = self.db.get_following_ids(viewer_id).await?;
        owner_ids.push(viewer_id.to_string());

        let mut posts = self.db.get_posts_by_owners(&owner_ids).await?;
        // Chunked retrieval orders within chunks only; restore the
        // global newest-first order here.
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let items = self.enrich(posts).await?;
        timer.observe_duration();

        Ok(items)
    }

    /// Build the global feed page: every post, newest-first, paginated
    /// by the caller's limit/offset.
    pub async fn build_global_feed(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FeedItem>, AppError> {
        let posts = self.db.list_posts(limit, offset).await?;
        self.enrich(posts).await
    }

    /// Join posts with author summaries and like/comment counts in
    /// three batch queries. A post whose owner row no longer exists is
    /// omitted from the result.
    async fn enrich(&self, posts: Vec<Post>) -> Result<Vec<FeedItem>, AppError> {
        if posts.is_empty() {
            return Ok(vec![]);
        }

        let owner_ids: Vec<String> = {
            let mut ids: Vec<String> = posts.iter().map(|p| p.owner_id.clone()).collect();
            ids.sort();
            ids.dedup();
            ids
        };
        let post_ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();

        let authors: HashMap<String, AccountSummary> = self
            .db
            .get_account_summaries(&owner_ids)
            .await?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();
        let like_counts: HashMap<String, i64> =
            self.db.get_like_counts(&post_ids).await?.into_iter().collect();
        let comment_counts: HashMap<String, i64> = self
            .db
            .get_comment_counts(&post_ids)
            .await?
            .into_iter()
            .collect();

        Ok(posts
            .into_iter()
            .filter_map(|post| {
                let author = authors.get(&post.owner_id)?.clone();
                let like_count = like_counts.get(&post.id).copied().unwrap_or(0);
                let comment_count = comment_counts.get(&post.id).copied().unwrap_or(0);
                Some(FeedItem {
                    post,
                    author,
                    like_count,
                    comment_count,
                })
            })
            .collect())
    }
}
