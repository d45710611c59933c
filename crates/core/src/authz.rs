//! Store-scoped permission engine.
//!
//! Every mutation of a store, category or product is reduced to a single
//! question: may this principal modify the store with this id? Categories and
//! products are evaluated against the id of the store that owns them.
//!
//! Rules, first match wins:
//!
//! 1. No principal: deny.
//! 2. `ADMIN`: allow.
//! 3. `OWNER`: allow iff the principal owns the target store.
//! 4. `EMPLOYEE`: allow iff the principal is employed at the target store.
//! 5. `CUSTOMER`: deny.
//!
//! Reads are public and never consult these rules.

use serde::Serialize;

use crate::types::{Email, Role, StoreId, UserId};

/// The acting identity of a request, loaded fresh from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub role: Role,
    /// Store this principal owns. Only ever set for `OWNER` and `ADMIN`.
    pub owned_store_id: Option<StoreId>,
    /// Store this principal works at. Only ever set for `EMPLOYEE`.
    pub employed_at_store_id: Option<StoreId>,
}

impl Principal {
    /// Whether this principal may administer user accounts.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Why a mutation was refused. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Anonymous,
    NotOwner,
    NotEmployedHere,
    CustomerRole,
}

impl DenyReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::NotOwner => "not_owner",
            Self::NotEmployedHere => "not_employed_here",
            Self::CustomerRole => "customer_role",
        }
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Evaluate the rules for `principal` acting on the store `target`.
#[must_use]
pub fn decide(principal: Option<&Principal>, target: StoreId) -> Decision {
    let Some(principal) = principal else {
        return Decision::Deny(DenyReason::Anonymous);
    };

    match principal.role {
        Role::Admin => Decision::Allow,
        Role::Owner if principal.owned_store_id == Some(target) => Decision::Allow,
        Role::Owner => Decision::Deny(DenyReason::NotOwner),
        Role::Employee if principal.employed_at_store_id == Some(target) => Decision::Allow,
        Role::Employee => Decision::Deny(DenyReason::NotEmployedHere),
        Role::Customer => Decision::Deny(DenyReason::CustomerRole),
    }
}

/// Whether `principal` may mutate the store `target` or anything inside it.
#[must_use]
pub fn authorize(principal: Option<&Principal>, target: StoreId) -> bool {
    decide(principal, target).is_allowed()
}

/// Reads of stores, categories and products are public.
#[must_use]
pub const fn can_read(_principal: Option<&Principal>) -> bool {
    true
}

/// Role gate for operations that are not scoped to a store.
#[must_use]
pub fn has_role_at_least(principal: Option<&Principal>, role: Role) -> bool {
    principal.is_some_and(|p| p.role.includes(role))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SHOP: StoreId = StoreId::new(1);
    const OTHER_SHOP: StoreId = StoreId::new(2);

    fn principal(role: Role, owned: Option<StoreId>, employed: Option<StoreId>) -> Principal {
        Principal {
            id: UserId::new(10),
            email: Email::parse("someone@example.com").unwrap(),
            full_name: "Someone".to_owned(),
            role,
            owned_store_id: owned,
            employed_at_store_id: employed,
        }
    }

    #[test]
    fn test_admin_is_allowed_everywhere() {
        let admin = principal(Role::Admin, None, None);
        for id in [1, 2, 999, i64::MAX] {
            assert!(authorize(Some(&admin), StoreId::new(id)));
        }
    }

    #[test]
    fn test_owner_is_scoped_to_owned_store() {
        let owner = principal(Role::Owner, Some(SHOP), None);
        assert!(authorize(Some(&owner), SHOP));
        assert!(!authorize(Some(&owner), OTHER_SHOP));
        assert_eq!(
            decide(Some(&owner), OTHER_SHOP),
            Decision::Deny(DenyReason::NotOwner)
        );
    }

    #[test]
    fn test_owner_without_store_is_denied() {
        let owner = principal(Role::Owner, None, None);
        assert!(!authorize(Some(&owner), SHOP));
    }

    #[test]
    fn test_customer_is_always_denied() {
        let customer = principal(Role::Customer, None, None);
        assert!(!authorize(Some(&customer), SHOP));
        assert!(!authorize(Some(&customer), OTHER_SHOP));
    }

    #[test]
    fn test_anonymous_is_always_denied() {
        assert!(!authorize(None, SHOP));
        assert_eq!(decide(None, SHOP), Decision::Deny(DenyReason::Anonymous));
    }

    #[test]
    fn test_employee_is_scoped_to_workplace() {
        let employee = principal(Role::Employee, None, Some(SHOP));
        assert!(authorize(Some(&employee), SHOP));
        assert!(!authorize(Some(&employee), OTHER_SHOP));
    }

    #[test]
    fn test_employee_workplace_does_not_grant_ownership_rules() {
        // An owned_store_id on an employee is ignored; only the workplace counts.
        let employee = principal(Role::Employee, Some(OTHER_SHOP), Some(SHOP));
        assert!(!authorize(Some(&employee), OTHER_SHOP));
    }

    #[test]
    fn test_reads_are_public() {
        assert!(can_read(None));
        assert!(can_read(Some(&principal(Role::Customer, None, None))));
    }

    #[test]
    fn test_role_gate() {
        let admin = principal(Role::Admin, None, None);
        let owner = principal(Role::Owner, Some(SHOP), None);
        assert!(has_role_at_least(Some(&admin), Role::Admin));
        assert!(!has_role_at_least(Some(&owner), Role::Admin));
        assert!(has_role_at_least(Some(&owner), Role::Employee));
        assert!(!has_role_at_least(None, Role::Customer));
    }
}
