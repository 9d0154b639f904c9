//! Mutation guard
//!
//! A single pure predicate answering "may this actor mutate this
//! resource". All destructive handlers consult it before touching
//! state; it performs no I/O and never mutates anything itself.

use crate::data::models::Role;

/// What kind of resource is being mutated. Currently informational
/// (the rule is uniform), but callers pass it so audit logs can say
/// what was touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Account,
    Post,
    Comment,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

/// Whether `actor` may mutate a resource owned by `owner`.
///
/// True iff the actor owns the resource or holds the admin role.
/// Deny-by-default: anything else is refused.
pub fn can_mutate(actor_id: &str, actor_role: Role, owner_id: &str) -> bool {
    actor_id == owner_id || actor_role.is_admin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_may_mutate_own_resource() {
        assert!(can_mutate("alice", Role::User, "alice"));
    }

    #[test]
    fn non_owner_is_denied() {
        assert!(!can_mutate("bob", Role::User, "alice"));
    }

    #[test]
    fn admin_may_mutate_anything() {
        assert!(can_mutate("admin", Role::Admin, "alice"));
        assert!(can_mutate("admin", Role::Admin, "admin"));
    }

    #[test]
    fn guard_is_case_sensitive_on_ids() {
        assert!(!can_mutate("Alice", Role::User, "alice"));
    }
}
