//! API request/response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub account: AccountResponse,
}

// =============================================================================
// Accounts
// =============================================================================

/// Full account profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    /// Public media URL, if a profile photo is set
    pub avatar: Option<String>,
    pub role: String,
    pub average_likes: i64,
    pub followers_count: i64,
    pub following_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Compact account record for lists and embedded authors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummaryResponse {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
}

// =============================================================================
// Posts
// =============================================================================

/// Post with author and counters, as it appears in feeds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub author: AccountSummaryResponse,
    pub caption: String,
    pub image_url: String,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Single-post view with full like and comment lists (newest-first)
#[derive(Debug, Clone, Serialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub likes: Vec<LikeResponse>,
    pub comments: Vec<CommentResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub id: String,
    pub account_id: String,
    pub liked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: String,
    pub account_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    pub body: String,
}

/// Pagination for the global feed
#[derive(Debug, Clone, Deserialize)]
pub struct FeedPageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
