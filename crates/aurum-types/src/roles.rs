//! Capability-based authorization.
//!
//! Each component owns a [`RoleStore`] and consults
//! [`RoleStore::require`] at the top of every gated operation. Only holders
//! of [`Role::Admin`] may grant or revoke roles.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AccountId, AurumError, Result};

/// A capability that gates mutating operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Role {
    /// Grants and revokes roles; configures the swap engine.
    Admin,
    /// Mints and burns backed tokens; adjusts reserve usage.
    Issuer,
    /// Engages and releases the token circuit breaker.
    Pauser,
    /// Attests the total physical reserve.
    ReserveAdmin,
    /// Approves redemptions and configures the workflow.
    WorkflowAdmin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::Issuer => write!(f, "ISSUER"),
            Self::Pauser => write!(f, "PAUSER"),
            Self::ReserveAdmin => write!(f, "RESERVE_ADMIN"),
            Self::WorkflowAdmin => write!(f, "WORKFLOW_ADMIN"),
        }
    }
}

/// Role → members mapping owned by a single component.
#[derive(Debug, Clone, Default)]
pub struct RoleStore {
    members: HashMap<Role, BTreeSet<AccountId>>,
}

impl RoleStore {
    /// Create a store whose `admin` holds [`Role::Admin`] plus `extra` roles.
    #[must_use]
    pub fn with_admin(admin: AccountId, extra: &[Role]) -> Self {
        let mut store = Self::default();
        store.insert(Role::Admin, admin);
        for role in extra {
            store.insert(*role, admin);
        }
        store
    }

    /// Whether `account` holds `role`.
    #[must_use]
    pub fn has_role(&self, account: &AccountId, role: Role) -> bool {
        self.members
            .get(&role)
            .is_some_and(|set| set.contains(account))
    }

    /// Fail with `Unauthorized` unless `caller` holds `role`.
    pub fn require(&self, caller: &AccountId, role: Role) -> Result<()> {
        if self.has_role(caller, role) {
            Ok(())
        } else {
            tracing::warn!(caller = %caller, role = %role, "Unauthorized call rejected");
            Err(AurumError::Unauthorized {
                account: *caller,
                required: format!("role {role}"),
            })
        }
    }

    /// Grant `role` to `account`. Returns `false` if it was already held.
    pub fn grant(&mut self, caller: &AccountId, role: Role, account: AccountId) -> Result<bool> {
        self.require(caller, Role::Admin)?;
        account.ensure_not_null("role grantee")?;
        Ok(self.insert(role, account))
    }

    /// Revoke `role` from `account`. Returns `false` if it was not held.
    ///
    /// An admin may not revoke the last admin.
    pub fn revoke(&mut self, caller: &AccountId, role: Role, account: AccountId) -> Result<bool> {
        self.require(caller, Role::Admin)?;
        if role == Role::Admin && self.has_role(&account, Role::Admin) && self.count(Role::Admin) == 1
        {
            return Err(AurumError::invalid_state("cannot revoke the last admin"));
        }
        Ok(self
            .members
            .get_mut(&role)
            .is_some_and(|set| set.remove(&account)))
    }

    /// Number of accounts holding `role`.
    #[must_use]
    pub fn count(&self, role: Role) -> usize {
        self.members.get(&role).map_or(0, BTreeSet::len)
    }

    fn insert(&mut self, role: Role, account: AccountId) -> bool {
        self.members.entry(role).or_default().insert(account)
    }
}
