//! Post endpoints
//!
//! Posts, likes, comments, the home feed, and the paginated global feed.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};

use crate::AppState;
use crate::api::converters::{
    comment_to_response, feed_item_to_response, like_to_response, summary_to_response,
};
use crate::api::dto::{
    CommentRequest, CommentResponse, FeedPageParams, PostDetailResponse, PostResponse,
};
use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::service::{FeedService, PostService};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(global_feed))
        .route("/posts/:id", get(get_post))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/feed", get(home_feed))
        .route("/posts/:id", delete(delete_post))
        .route("/posts/like/:id", put(like))
        .route("/posts/unlike/:id", put(unlike))
        .route("/posts/comment/:id", post(add_comment))
        .route("/posts/comment/:id/:comment_id", delete(delete_comment))
}

/// POST /posts
///
/// Multipart upload: an `image` field (required) and an optional
/// `caption` text field.
async fn create_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PostResponse>)> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/v1/posts"])
        .start_timer();

    let mut image: Option<(Vec<u8>, String)> = None;
    let mut caption = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("image") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read image: {}", e)))?;
                image = Some((data.to_vec(), content_type));
            }
            Some("caption") => {
                caption = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read caption: {}", e)))?;
            }
            _ => {}
        }
    }

    let (data, content_type) =
        image.ok_or_else(|| AppError::Validation("Missing image field".to_string()))?;

    let service = PostService::new(state.db.clone(), state.storage.clone());
    let created = service
        .create_post(&session.account_id, &caption, data, &content_type)
        .await?;

    let author = state
        .db
        .get_account_summaries(std::slice::from_ref(&created.owner_id))
        .await?
        .into_iter()
        .next()
        .ok_or(AppError::NotFound)?;

    let response = PostResponse {
        id: created.id.clone(),
        author: summary_to_response(author, &state.storage),
        caption: created.caption.clone(),
        image_url: state.storage.get_public_url(&created.image_key),
        like_count: 0,
        comment_count: 0,
        created_at: created.created_at,
    };

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["POST", "/api/v1/posts", "201"])
        .inc();

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /posts/:id
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostDetailResponse>> {
    let service = PostService::new(state.db.clone(), state.storage.clone());
    let (post, likes, comments) = service.get_post(&id).await?;

    let author = state
        .db
        .get_account_summaries(std::slice::from_ref(&post.owner_id))
        .await?
        .into_iter()
        .next()
        .ok_or(AppError::NotFound)?;

    let response = PostDetailResponse {
        post: PostResponse {
            id: post.id.clone(),
            author: summary_to_response(author, &state.storage),
            caption: post.caption.clone(),
            image_url: state.storage.get_public_url(&post.image_key),
            like_count: likes.len() as i64,
            comment_count: comments.len() as i64,
            created_at: post.created_at,
        },
        likes: likes.into_iter().map(like_to_response).collect(),
        comments: comments.into_iter().map(comment_to_response).collect(),
    };

    Ok(Json(response))
}

/// DELETE /posts/:id
async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let service = PostService::new(state.db.clone(), state.storage.clone());
    service
        .delete_post(&session.account_id, session.role, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /posts/feed
///
/// Home feed: posts by followed accounts plus the viewer's own,
/// newest-first.
async fn home_feed(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<PostResponse>>> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/v1/posts/feed"])
        .start_timer();

    let service = FeedService::new(state.db.clone());
    let items = service.build_feed(&session.account_id).await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/api/v1/posts/feed", "200"])
        .inc();

    Ok(Json(
        items
            .into_iter()
            .map(|item| feed_item_to_response(item, &state.storage))
            .collect(),
    ))
}

/// GET /posts
///
/// Global feed: every post, newest-first, paginated with
/// `limit`/`offset` query parameters.
async fn global_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedPageParams>,
) -> Result<Json<Vec<PostResponse>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let service = FeedService::new(state.db.clone());
    let items = service.build_global_feed(limit, offset).await?;

    Ok(Json(
        items
            .into_iter()
            .map(|item| feed_item_to_response(item, &state.storage))
            .collect(),
    ))
}

/// PUT /posts/like/:id
async fn like(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let service = PostService::new(state.db.clone(), state.storage.clone());
    service.like(&session.account_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /posts/unlike/:id
async fn unlike(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let service = PostService::new(state.db.clone(), state.storage.clone());
    service.unlike(&session.account_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /posts/comment/:id
async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    let service = PostService::new(state.db.clone(), state.storage.clone());
    let comment = service.add_comment(&session.account_id, &id, &req.body).await?;

    Ok((StatusCode::CREATED, Json(comment_to_response(comment))))
}

/// DELETE /posts/comment/:id/:comment_id
async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let service = PostService::new(state.db.clone(), state.storage.clone());
    service
        .delete_comment(&session.account_id, session.role, &id, &comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
