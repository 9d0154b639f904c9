//! User endpoints
//!
//! Profiles, the follow graph, profile photos, account deletion, and
//! the admin-only follow-graph reconciliation sweep.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};

use crate::AppState;
use crate::api::converters::{account_to_response, summary_to_response};
use crate::api::dto::{AccountResponse, AccountSummaryResponse};
use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::service::{AccountService, ReconcileReport, RelationshipService};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/users/:id", get(get_profile))
        .route("/users/followers/:id", get(list_followers))
        .route("/users/following/:id", get(list_following))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/users/:id", delete(delete_account))
        .route("/users/follow/:id", put(follow))
        .route("/users/unfollow/:id", put(unfollow))
        .route("/users/photo", put(update_photo))
        .route("/users/reconcile", post(reconcile))
}

/// GET /users/:id
async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccountResponse>> {
    let account = state.db.get_account(&id).await?.ok_or(AppError::NotFound)?;

    let followers = state.db.get_follower_ids(&id).await?.len() as i64;
    let following = state.db.get_following_ids(&id).await?.len() as i64;

    Ok(Json(account_to_response(
        account,
        followers,
        following,
        &state.storage,
    )))
}

/// PUT /users/follow/:id
async fn follow(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["PUT", "/api/v1/users/follow/:id"])
        .start_timer();

    let service = RelationshipService::new(state.db.clone());
    service.follow(&session.account_id, &id).await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["PUT", "/api/v1/users/follow/:id", "204"])
        .inc();

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /users/unfollow/:id
async fn unfollow(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["PUT", "/api/v1/users/unfollow/:id"])
        .start_timer();

    let service = RelationshipService::new(state.db.clone());
    service.unfollow(&session.account_id, &id).await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["PUT", "/api/v1/users/unfollow/:id", "204"])
        .inc();

    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/followers/:id
async fn list_followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AccountSummaryResponse>>> {
    let service = RelationshipService::new(state.db.clone());
    let summaries = service.list_followers(&id).await?;

    Ok(Json(
        summaries
            .into_iter()
            .map(|s| summary_to_response(s, &state.storage))
            .collect(),
    ))
}

/// GET /users/following/:id
async fn list_following(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AccountSummaryResponse>>> {
    let service = RelationshipService::new(state.db.clone());
    let summaries = service.list_following(&id).await?;

    Ok(Json(
        summaries
            .into_iter()
            .map(|s| summary_to_response(s, &state.storage))
            .collect(),
    ))
}

/// PUT /users/photo
///
/// Multipart upload with a single `photo` field.
async fn update_photo(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<AccountResponse>> {
    let mut photo: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("photo") {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read photo: {}", e)))?;
            photo = Some((data.to_vec(), content_type));
        }
    }

    let (data, content_type) =
        photo.ok_or_else(|| AppError::Validation("Missing photo field".to_string()))?;

    let service = AccountService::new(state.db.clone(), state.storage.clone());
    let account = service
        .update_profile_photo(
            &session.account_id,
            session.role,
            &session.account_id,
            data,
            &content_type,
        )
        .await?;

    let followers = state.db.get_follower_ids(&account.id).await?.len() as i64;
    let following = state.db.get_following_ids(&account.id).await?.len() as i64;

    Ok(Json(account_to_response(
        account,
        followers,
        following,
        &state.storage,
    )))
}

/// DELETE /users/:id
async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let service = AccountService::new(state.db.clone(), state.storage.clone());
    service
        .delete_account(&session.account_id, session.role, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/reconcile
///
/// Admin-only sweep repairing asymmetric follow edges.
async fn reconcile(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<ReconcileReport>> {
    if !session.role.is_admin() {
        return Err(AppError::Forbidden);
    }

    let service = RelationshipService::new(state.db.clone());
    let report = service.reconcile().await?;
    Ok(Json(report))
}
