//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database, storage, and aggregate operations.

mod account;
mod feed;
pub mod guard;
mod post;
mod relationship;

pub use account::AccountService;
pub use feed::{FeedItem, FeedService};
pub use guard::{ResourceKind, can_mutate};
pub use post::PostService;
pub use relationship::{ReconcileReport, RelationshipService};
