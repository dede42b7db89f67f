use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, LedgerResult};

/// Account roles carried in session tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

/// The authenticated caller of a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: Uuid,
    pub role: Role,
}

impl Requester {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn user(id: Uuid) -> Self {
        Self::new(id, Role::User)
    }

    pub fn admin(id: Uuid) -> Self {
        Self::new(id, Role::Admin)
    }

    /// Admins pass; everyone else must be one of `parties`.
    pub fn authorize(&self, parties: &[Uuid], denial: &str) -> LedgerResult<()> {
        if self.role.is_admin() || parties.contains(&self.id) {
            Ok(())
        } else {
            Err(LedgerError::authorization(denial))
        }
    }

    /// Capability handed to acceptance operations.
    pub fn seller_scope(&self) -> SellerScope {
        if self.role.is_admin() {
            SellerScope::Any
        } else {
            SellerScope::Seller(self.id)
        }
    }
}

/// Which offers a caller may accept or un-accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellerScope {
    /// Only offers pinned to this seller.
    Seller(Uuid),
    /// Any offer; granted to admins by the authorization boundary.
    Any,
}

impl SellerScope {
    pub fn admits(&self, seller_id: Uuid) -> bool {
        match self {
            SellerScope::Seller(id) => *id == seller_id,
            SellerScope::Any => true,
        }
    }

    pub fn seller_id(&self) -> Option<Uuid> {
        match self {
            SellerScope::Seller(id) => Some(*id),
            SellerScope::Any => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_bypasses_party_check() {
        let admin = Requester::admin(Uuid::new_v4());
        assert!(admin.authorize(&[Uuid::new_v4()], "nope").is_ok());
        assert_eq!(admin.seller_scope(), SellerScope::Any);
    }

    #[test]
    fn test_user_must_be_a_party() {
        let me = Uuid::new_v4();
        let user = Requester::user(me);
        assert!(user.authorize(&[Uuid::new_v4(), me], "nope").is_ok());

        let err = user.authorize(&[Uuid::new_v4()], "only buyer and seller").unwrap_err();
        assert!(matches!(err, LedgerError::Authorization(msg) if msg == "only buyer and seller"));
    }

    #[test]
    fn test_seller_scope_admits_only_its_seller() {
        let seller = Uuid::new_v4();
        let scope = Requester::user(seller).seller_scope();
        assert!(scope.admits(seller));
        assert!(!scope.admits(Uuid::new_v4()));
        assert!(SellerScope::Any.admits(Uuid::new_v4()));
    }

    #[test]
    fn test_role_display_matches_claim_encoding() {
        assert_eq!(Role::User.to_string(), "USER");
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }
}
