//! API layer
//!
//! HTTP handlers for:
//! - Auth endpoints (register/login/me)
//! - User endpoints (profiles, follow graph)
//! - Post endpoints (posts, likes, comments, feeds)
//! - Metrics (Prometheus)

mod accounts;
mod auth;
mod converters;
mod dto;
pub mod metrics;
mod posts;

pub use converters::*;
pub use dto::*;

use axum::{Router, middleware};

use crate::AppState;

pub use metrics::metrics_router;

/// Compose the /api/v1 router.
///
/// Public routes (register, login, profile reads, global feed) are
/// merged with protected routes wrapped in the auth middleware.
pub fn api_v1_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(auth::protected_router())
        .merge(accounts::protected_router())
        .merge(posts::protected_router())
        .layer(middleware::from_fn_with_state(
            state,
            crate::auth::require_auth,
        ));

    Router::new()
        .merge(auth::public_router())
        .merge(accounts::public_router())
        .merge(posts::public_router())
        .merge(protected)
}
