//! Account service
//!
//! Registration, login, profile photos, and account deletion with its
//! full cascade (follow edges, likes, comments, posts, media).

use std::sync::Arc;

use chrono::Utc;

use crate::auth::password::{hash_password, verify_password};
use crate::data::Database;
use crate::data::models::{Account, EntityId, Role};
use crate::error::AppError;
use crate::metrics::POSTS_TOTAL;
use crate::service::guard::{ResourceKind, can_mutate};
use crate::service::post::PostService;
use crate::storage::MediaStorage;

/// Username limit in Unicode code points
const MAX_USERNAME_CHARS: usize = 20;
/// Minimum password length in Unicode code points
const MIN_PASSWORD_CHARS: usize = 6;

fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
    posts: PostService,
}

impl AccountService {
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>) -> Self {
        let posts = PostService::new(db.clone(), storage.clone());
        Self { db, storage, posts }
    }

    /// Register a new account.
    ///
    /// The raw password is hashed with a per-account salt before it
    /// touches the database; it is never stored or logged.
    ///
    /// # Errors
    /// - `Validation` for an empty/overlong username or short password
    /// - `AlreadyExists` if the username or email is taken
    pub async fn register(
        &self,
        username: &str,
        email: Option<String>,
        password: &str,
        display_name: Option<String>,
    ) -> Result<Account, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("Username cannot be empty".to_string()));
        }
        if username.chars().count() > MAX_USERNAME_CHARS {
            return Err(AppError::Validation(format!(
                "Username must be at most {} characters",
                MAX_USERNAME_CHARS
            )));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_CHARS
            )));
        }

        let email = normalize_optional_text(email);

        if self.db.get_account_by_username(username).await?.is_some() {
            return Err(AppError::AlreadyExists("Username is taken".to_string()));
        }
        if let Some(email) = &email {
            if self.db.get_account_by_email(email).await?.is_some() {
                return Err(AppError::AlreadyExists("Email is already in use".to_string()));
            }
        }

        let now = Utc::now();
        let account = Account {
            id: EntityId::new().0,
            username: username.to_string(),
            email,
            password_hash: hash_password(password)?,
            display_name: normalize_optional_text(display_name),
            bio: None,
            website: None,
            avatar_key: None,
            role: Role::User.as_str().to_string(),
            average_likes: 0,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_account(&account).await?;
        tracing::info!(account_id = %account.id, username = %account.username, "Account registered");

        Ok(account)
    }

    /// Authenticate by username or email plus password.
    ///
    /// Unknown identifier and wrong password both return
    /// `Unauthorized`; callers cannot distinguish them.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<Account, AppError> {
        let identifier = identifier.trim();

        let account = match self.db.get_account_by_username(identifier).await? {
            Some(account) => Some(account),
            None => self.db.get_account_by_email(identifier).await?,
        };

        let account = account.ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &account.password_hash) {
            return Err(AppError::Unauthorized);
        }

        Ok(account)
    }

    /// Get an account by id.
    pub async fn get_account(&self, id: &str) -> Result<Account, AppError> {
        self.db.get_account(id).await?.ok_or(AppError::NotFound)
    }

    /// Upload and set a profile photo.
    ///
    /// The previous photo, if any, is deleted best-effort after the
    /// new key is committed.
    pub async fn update_profile_photo(
        &self,
        actor_id: &str,
        actor_role: Role,
        target_id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<Account, AppError> {
        let account = self.get_account(target_id).await?;

        if !can_mutate(actor_id, actor_role, &account.id) {
            tracing::warn!(
                actor_id = %actor_id,
                target_id = %target_id,
                resource = ResourceKind::Account.as_str(),
                "Mutation denied"
            );
            return Err(AppError::Forbidden);
        }

        if data.is_empty() {
            return Err(AppError::Validation("Photo data is required".to_string()));
        }

        let (key, _url) = self
            .storage
            .upload_avatar(&EntityId::new().0, data, content_type)
            .await?;

        self.db
            .update_account_avatar_key(target_id, Some(&key), Utc::now())
            .await?;

        if let Some(old_key) = account.avatar_key {
            let storage = self.storage.clone();
            tokio::spawn(async move {
                if let Err(e) = storage.delete(&old_key).await {
                    tracing::warn!(key = %old_key, error = %e, "Failed to delete old profile photo");
                }
            });
        }

        self.get_account(target_id).await
    }

    /// Delete an account and everything it owns or authored.
    ///
    /// Cascade order:
    /// 1. follow edges involving the account, both tables and directions
    /// 2. the account's likes (then recompute affected owners' aggregates)
    /// 3. the account's comments on other posts
    /// 4. the account's posts, including their likes/comments and media
    /// 5. the profile photo
    /// 6. the account row itself
    ///
    /// # Errors
    /// - `NotFound` if the account does not exist
    /// - `Forbidden` if the actor is neither the account nor admin
    pub async fn delete_account(
        &self,
        actor_id: &str,
        actor_role: Role,
        target_id: &str,
    ) -> Result<(), AppError> {
        let account = self.get_account(target_id).await?;

        if !can_mutate(actor_id, actor_role, &account.id) {
            tracing::warn!(
                actor_id = %actor_id,
                target_id = %target_id,
                resource = ResourceKind::Account.as_str(),
                "Mutation denied"
            );
            return Err(AppError::Forbidden);
        }

        self.db.remove_account_from_graph(target_id).await?;

        let affected_owners = self.db.delete_likes_by_account(target_id).await?;

        self.db.delete_comments_by_account(target_id).await?;

        let posts = self.db.get_posts_by_owner(target_id).await?;
        for post in &posts {
            self.db.delete_post(&post.id).await?;
            POSTS_TOTAL.dec();

            let storage = self.storage.clone();
            let image_key = post.image_key.clone();
            tokio::spawn(async move {
                if let Err(e) = storage.delete(&image_key).await {
                    tracing::warn!(key = %image_key, error = %e, "Failed to delete post image");
                }
            });
        }

        if let Some(avatar_key) = account.avatar_key {
            let storage = self.storage.clone();
            tokio::spawn(async move {
                if let Err(e) = storage.delete(&avatar_key).await {
                    tracing::warn!(key = %avatar_key, error = %e, "Failed to delete profile photo");
                }
            });
        }

        self.db.delete_account(target_id).await?;
        tracing::info!(
            account_id = %target_id,
            posts_removed = posts.len(),
            "Account deleted"
        );

        // The deleted account's likes are gone; other owners' means shift.
        for owner_id in affected_owners {
            if owner_id != target_id {
                self.posts.recompute_average_likes(&owner_id).await;
            }
        }

        Ok(())
    }
}
