//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// ULIDs are lexicographically time-sortable, which makes `id DESC` a
/// deterministic newest-first tiebreaker wherever records share a timestamp.
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Account
// =============================================================================

/// Actor role used by the mutation guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// A registered account
///
/// The follow graph is not embedded here: it lives in the
/// `account_following` / `account_followers` tables and is resolved
/// through the relationship service.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    /// Salted one-way hash, never the raw password
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    /// Media store key for the profile photo
    pub avatar_key: Option<String>,
    /// "user" or "admin"
    pub role: String,
    /// Derived aggregate: ceil(mean(like count over this account's posts)).
    /// Recomputed best-effort after any like-count-affecting mutation.
    pub average_likes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn role(&self) -> Role {
        Role::from_str(&self.role)
    }
}

/// Compact account record for follower/following lists and feed items
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountSummary {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_key: Option<String>,
}

// =============================================================================
// Post
// =============================================================================

/// A photo post
///
/// `owner_id` and `created_at` are immutable after creation. Likes and
/// comments live in their own tables, newest-first by construction.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub owner_id: String,
    pub caption: String,
    /// Media store key for the image (required)
    pub image_key: String,
    pub created_at: DateTime<Utc>,
}

/// A like on a post
///
/// `(post_id, account_id)` is unique: an account likes a post at most once.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: String,
    pub post_id: String,
    pub account_id: String,
    pub liked_at: DateTime<Utc>,
}

/// A comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub account_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A follow edge as stored on the actor side
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowEdge {
    pub account_id: String,
    pub target_id: String,
    pub created_at: DateTime<Utc>,
}
