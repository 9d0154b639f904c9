//! Model-to-DTO converters
//!
//! Media keys are resolved to public URLs here, at the API boundary,
//! so the service layer only ever deals in storage keys.

use crate::api::dto::*;
use crate::data::models::{Account, AccountSummary, Comment, Like};
use crate::service::FeedItem;
use crate::storage::MediaStorage;

pub fn account_to_response(
    account: Account,
    followers_count: i64,
    following_count: i64,
    storage: &MediaStorage,
) -> AccountResponse {
    AccountResponse {
        avatar: account
            .avatar_key
            .as_deref()
            .map(|key| storage.get_public_url(key)),
        id: account.id,
        username: account.username,
        display_name: account.display_name,
        bio: account.bio,
        website: account.website,
        role: account.role,
        average_likes: account.average_likes,
        followers_count,
        following_count,
        created_at: account.created_at,
    }
}

pub fn summary_to_response(summary: AccountSummary, storage: &MediaStorage) -> AccountSummaryResponse {
    AccountSummaryResponse {
        avatar: summary
            .avatar_key
            .as_deref()
            .map(|key| storage.get_public_url(key)),
        id: summary.id,
        username: summary.username,
        display_name: summary.display_name,
    }
}

pub fn feed_item_to_response(item: FeedItem, storage: &MediaStorage) -> PostResponse {
    PostResponse {
        id: item.post.id,
        author: summary_to_response(item.author, storage),
        caption: item.post.caption,
        image_url: storage.get_public_url(&item.post.image_key),
        like_count: item.like_count,
        comment_count: item.comment_count,
        created_at: item.post.created_at,
    }
}

pub fn like_to_response(like: Like) -> LikeResponse {
    LikeResponse {
        id: like.id,
        account_id: like.account_id,
        liked_at: like.liked_at,
    }
}

pub fn comment_to_response(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        account_id: comment.account_id,
        body: comment.body,
        created_at: comment.created_at,
    }
}
