//! Access Control Module
//!
//! Role-based gating for the administrative surface. Every administrative
//! operation calls `require` before touching state, so a rejected call
//! never mutates anything.
//!
//! ## Roles
//!
//! - **Admin**: protocol parameters, adapters, reserves, role management
//! - **MemberManager**: may add members directly
//! - **Guardian**: may pause and unpause

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{require_address, Address};
use crate::{BTreeSet, UnionError, UnionResult};

// ============================================================================
// Types
// ============================================================================

/// Protocol roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Role {
    /// Full administrative control
    Admin,
    /// Can add members without registration
    MemberManager,
    /// Can pause/unpause
    Guardian,
}

impl Role {
    /// Get role priority (higher = more powerful)
    pub fn priority(&self) -> u8 {
        match self {
            Role::Admin => 100,
            Role::Guardian => 60,
            Role::MemberManager => 40,
        }
    }

    /// Stable numeric id, used in events
    pub fn id(&self) -> u8 {
        match self {
            Role::Admin => 1,
            Role::MemberManager => 2,
            Role::Guardian => 3,
        }
    }
}

/// Permission types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Update protocol parameters
    UpdateParams,
    /// Add a member directly
    AddMember,
    /// Add, remove or reorder adapters
    ManageAdapters,
    /// Withdraw protocol reserves
    ManageReserves,
    /// Pause the protocol
    Pause,
    /// Unpause the protocol
    Unpause,
    /// Grant roles to others
    GrantRole,
    /// Revoke roles from others
    RevokeRole,
}

impl Permission {
    /// Get minimum role required for this permission
    pub fn min_role(&self) -> Role {
        match self {
            Permission::AddMember => Role::MemberManager,
            Permission::Pause | Permission::Unpause => Role::Guardian,
            _ => Role::Admin,
        }
    }
}

/// Access control state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AccessControl {
    /// Role assignments
    assignments: BTreeSet<(Address, Role)>,
}

impl AccessControl {
    /// Create access control with a single admin
    pub fn new(admin: Address) -> UnionResult<Self> {
        require_address(&admin)?;
        let mut assignments = BTreeSet::new();
        assignments.insert((admin, Role::Admin));
        Ok(Self { assignments })
    }

    /// Check if address holds exactly this role
    pub fn has_role(&self, address: &Address, role: Role) -> bool {
        self.assignments.contains(&(*address, role))
    }

    /// Check if address holds a role strong enough for the permission
    pub fn has_permission(&self, address: &Address, permission: Permission) -> bool {
        let min_priority = permission.min_role().priority();
        self.assignments
            .iter()
            .any(|(a, r)| a == address && r.priority() >= min_priority)
    }

    /// Fail with `SenderNotAdmin` unless the caller holds the permission
    pub fn require(&self, caller: &Address, permission: Permission) -> UnionResult<()> {
        if self.has_permission(caller, permission) {
            Ok(())
        } else {
            Err(UnionError::SenderNotAdmin { caller: *caller })
        }
    }

    /// Grant a role to an address
    pub fn grant_role(&mut self, granter: &Address, grantee: Address, role: Role) -> UnionResult<bool> {
        self.require(granter, Permission::GrantRole)?;
        require_address(&grantee)?;
        Ok(self.assignments.insert((grantee, role)))
    }

    /// Revoke a role from an address
    pub fn revoke_role(&mut self, revoker: &Address, target: Address, role: Role) -> UnionResult<bool> {
        self.require(revoker, Permission::RevokeRole)?;

        // The last admin cannot be removed
        if role == Role::Admin && self.admin_count() == 1 && self.has_role(&target, Role::Admin) {
            return Err(UnionError::InvalidParameter {
                param: "role",
                reason: "cannot revoke the last admin",
            });
        }
        Ok(self.assignments.remove(&(target, role)))
    }

    /// Number of admins
    pub fn admin_count(&self) -> usize {
        self.assignments.iter().filter(|(_, r)| *r == Role::Admin).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> [u8; 32] {
        [1u8; 32]
    }

    fn operator() -> [u8; 32] {
        [2u8; 32]
    }

    #[test]
    fn test_admin_has_every_permission() {
        let acl = AccessControl::new(admin()).unwrap();

        assert!(acl.has_permission(&admin(), Permission::UpdateParams));
        assert!(acl.has_permission(&admin(), Permission::AddMember));
        assert!(acl.has_permission(&admin(), Permission::Pause));
    }

    #[test]
    fn test_non_admin_rejected() {
        let acl = AccessControl::new(admin()).unwrap();

        assert_eq!(
            acl.require(&operator(), Permission::UpdateParams),
            Err(UnionError::SenderNotAdmin { caller: operator() })
        );
    }

    #[test]
    fn test_role_scoping() {
        let mut acl = AccessControl::new(admin()).unwrap();
        acl.grant_role(&admin(), operator(), Role::Guardian).unwrap();

        assert!(acl.has_permission(&operator(), Permission::Pause));
        assert!(acl.has_permission(&operator(), Permission::AddMember));
        assert!(!acl.has_permission(&operator(), Permission::UpdateParams));

        // Guardians cannot hand out roles
        assert!(acl.grant_role(&operator(), [3u8; 32], Role::Guardian).is_err());
    }

    #[test]
    fn test_last_admin_kept() {
        let mut acl = AccessControl::new(admin()).unwrap();
        assert!(acl.revoke_role(&admin(), admin(), Role::Admin).is_err());

        acl.grant_role(&admin(), operator(), Role::Admin).unwrap();
        assert!(acl.revoke_role(&admin(), admin(), Role::Admin).unwrap());
        assert!(!acl.has_role(&admin(), Role::Admin));
    }
}
