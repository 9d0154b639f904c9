//! Relationship service
//!
//! Owns the bidirectional follow graph. The graph is stored as two
//! independent tables (actor-side `account_following`, counterparty-side
//! `account_followers`) and every mutation writes them in a fixed order:
//! the actor side first, then the counterparty side, with no wrapping
//! transaction. A failure between the two writes leaves an asymmetric
//! edge; `reconcile` finds and repairs those, treating the actor side
//! as authoritative because it is written first on follow and removed
//! first on unfollow.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::data::Database;
use crate::data::models::AccountSummary;
use crate::error::AppError;
use crate::metrics::{FOLLOW_EDGES_TOTAL, RECONCILE_REPAIRS_TOTAL};

/// Outcome of one reconciliation sweep.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ReconcileReport {
    /// Actor-side edges that were missing their follower row (repaired
    /// by inserting the follower row).
    pub follower_rows_added: u64,
    /// Follower rows with no matching actor-side edge (repaired by
    /// deleting the follower row).
    pub follower_rows_removed: u64,
}

impl ReconcileReport {
    pub fn total_repairs(&self) -> u64 {
        self.follower_rows_added + self.follower_rows_removed
    }
}

/// Relationship service
pub struct RelationshipService {
    db: Arc<Database>,
}

impl RelationshipService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Follow another account.
    ///
    /// Writes the actor's following entry first, then the target's
    /// follower entry. If the second write fails the first is NOT
    /// rolled back; the asymmetry is surfaced as `Internal` and left
    /// for `reconcile` to repair.
    ///
    /// # Errors
    /// - `InvalidOperation` on self-follow
    /// - `NotFound` if the target account does not exist
    /// - `AlreadyExists` if the actor already follows the target
    pub async fn follow(&self, actor_id: &str, target_id: &str) -> Result<(), AppError> {
        if actor_id == target_id {
            return Err(AppError::InvalidOperation(
                "You can't follow yourself".to_string(),
            ));
        }

        if !self.db.account_exists(target_id).await? {
            return Err(AppError::NotFound);
        }

        let now = Utc::now();

        // Actor side first. The conflict guard doubles as the
        // already-following check.
        let inserted = self.db.insert_following_edge(actor_id, target_id, now).await?;
        if !inserted {
            return Err(AppError::AlreadyExists(
                "You already follow this user".to_string(),
            ));
        }

        // Counterparty side second. On failure the graph is asymmetric.
        if let Err(e) = self.db.insert_follower_edge(target_id, actor_id, now).await {
            tracing::error!(
                actor_id = %actor_id,
                target_id = %target_id,
                error = %e,
                "Follower-side write failed after following-side commit; graph left asymmetric"
            );
            return Err(AppError::Internal(anyhow::anyhow!(
                "follower-side write failed for {} -> {}: {}",
                actor_id,
                target_id,
                e
            )));
        }

        FOLLOW_EDGES_TOTAL.inc();
        tracing::info!(actor_id = %actor_id, target_id = %target_id, "Follow edge created");

        Ok(())
    }

    /// Unfollow an account.
    ///
    /// Removal mirrors `follow`: the actor's following entry goes
    /// first, then the target's follower entry, no transaction.
    ///
    /// # Errors
    /// - `InvalidOperation` on self-unfollow
    /// - `NotFound` if the target account does not exist
    /// - `NotFollowing` if no follow edge exists on the actor side
    pub async fn unfollow(&self, actor_id: &str, target_id: &str) -> Result<(), AppError> {
        if actor_id == target_id {
            return Err(AppError::InvalidOperation(
                "You can't unfollow yourself".to_string(),
            ));
        }

        if !self.db.account_exists(target_id).await? {
            return Err(AppError::NotFound);
        }

        let removed = self.db.delete_following_edge(actor_id, target_id).await?;
        if !removed {
            return Err(AppError::NotFollowing);
        }

        if let Err(e) = self.db.delete_follower_edge(target_id, actor_id).await {
            tracing::error!(
                actor_id = %actor_id,
                target_id = %target_id,
                error = %e,
                "Follower-side delete failed after following-side removal; graph left asymmetric"
            );
            return Err(AppError::Internal(anyhow::anyhow!(
                "follower-side delete failed for {} -> {}: {}",
                actor_id,
                target_id,
                e
            )));
        }

        FOLLOW_EDGES_TOTAL.dec();
        tracing::info!(actor_id = %actor_id, target_id = %target_id, "Follow edge removed");

        Ok(())
    }

    /// Ids the account follows, used by the feed assembler.
    pub async fn following_ids(&self, account_id: &str) -> Result<Vec<String>, AppError> {
        self.db.get_following_ids(account_id).await
    }

    /// Accounts following `account_id`, as summary records.
    pub async fn list_followers(&self, account_id: &str) -> Result<Vec<AccountSummary>, AppError> {
        if !self.db.account_exists(account_id).await? {
            return Err(AppError::NotFound);
        }

        let ids = self.db.get_follower_ids(account_id).await?;
        self.resolve_summaries(ids).await
    }

    /// Accounts that `account_id` follows, as summary records.
    pub async fn list_following(&self, account_id: &str) -> Result<Vec<AccountSummary>, AppError> {
        if !self.db.account_exists(account_id).await? {
            return Err(AppError::NotFound);
        }

        let ids = self.db.get_following_ids(account_id).await?;
        self.resolve_summaries(ids).await
    }

    /// Batch-resolve ids to summaries, preserving the input order and
    /// silently dropping ids whose account row no longer exists.
    async fn resolve_summaries(
        &self,
        ids: Vec<String>,
    ) -> Result<Vec<AccountSummary>, AppError> {
        let summaries = self.db.get_account_summaries(&ids).await?;

        let mut by_id: std::collections::HashMap<String, AccountSummary> = summaries
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();

        Ok(ids.into_iter().filter_map(|id| by_id.remove(&id)).collect())
    }

    /// Repair asymmetric follow edges.
    ///
    /// The actor side (`account_following`) is authoritative:
    /// - an actor-side edge without its follower row gets the follower
    ///   row inserted;
    /// - a follower row without its actor-side edge gets deleted.
    pub async fn reconcile(&self) -> Result<ReconcileReport, AppError> {
        let following = self.db.all_following_edges().await?;
        let followers = self.db.all_follower_edges().await?;

        let follower_pairs: HashSet<(String, String)> = followers
            .iter()
            .map(|e| (e.account_id.clone(), e.target_id.clone()))
            .collect();
        let following_pairs: HashSet<(String, String)> = following
            .iter()
            .map(|e| (e.account_id.clone(), e.target_id.clone()))
            .collect();

        let mut report = ReconcileReport::default();

        for edge in &following {
            let pair = (edge.account_id.clone(), edge.target_id.clone());
            if !follower_pairs.contains(&pair) {
                self.db
                    .insert_follower_edge(&edge.target_id, &edge.account_id, edge.created_at)
                    .await?;
                RECONCILE_REPAIRS_TOTAL
                    .with_label_values(&["follower_row_added"])
                    .inc();
                report.follower_rows_added += 1;
                tracing::warn!(
                    actor_id = %edge.account_id,
                    target_id = %edge.target_id,
                    "Reconcile: inserted missing follower row"
                );
            }
        }

        for edge in &followers {
            let pair = (edge.account_id.clone(), edge.target_id.clone());
            if !following_pairs.contains(&pair) {
                self.db
                    .delete_follower_edge(&edge.target_id, &edge.account_id)
                    .await?;
                RECONCILE_REPAIRS_TOTAL
                    .with_label_values(&["follower_row_removed"])
                    .inc();
                report.follower_rows_removed += 1;
                tracing::warn!(
                    actor_id = %edge.account_id,
                    target_id = %edge.target_id,
                    "Reconcile: removed dangling follower row"
                );
            }
        }

        if report.total_repairs() > 0 {
            tracing::info!(
                added = report.follower_rows_added,
                removed = report.follower_rows_removed,
                "Reconciliation repaired asymmetric edges"
            );
        }

        Ok(report)
    }
}
