//! Attested reserve ledger.
//!
//! Single source of truth for reserve capacity. Tracks the custodian-attested
//! total and the share of it currently backing issued tokens.
//!
//! ```text
//! ∀ states: reserve_used <= total_reserve
//! ```
//!
//! The invariant is enforced on every mutation, never checked after the fact.
//! `add_reserve_used` / `reduce_reserve_used` are deltas: each call is one
//! real mint or burn, and callers are responsible for invoking them exactly
//! once per event.

use aurum_types::{
    AccountId, Amount, AuditEvent, AuditLog, AurumError, Component, ReentrancyGuard,
    ReserveParams, Result, Role, RoleStore,
};

/// Reserve capacity counter.
#[derive(Debug)]
pub struct ReserveLedger {
    /// Component identity.
    id: AccountId,
    /// Attested physical reserve, in base units.
    total_reserve: Amount,
    /// Reserve currently represented by issued tokens.
    reserve_used: Amount,
    roles: RoleStore,
    guard: ReentrancyGuard,
    audit: AuditLog,
}

impl ReserveLedger {
    /// Create an empty ledger. `admin` holds `Admin` and `ReserveAdmin`.
    #[must_use]
    pub fn new(admin: AccountId, audit: AuditLog) -> Self {
        Self {
            id: AccountId::new(),
            total_reserve: 0,
            reserve_used: 0,
            roles: RoleStore::with_admin(admin, &[Role::ReserveAdmin]),
            guard: ReentrancyGuard::new(),
            audit,
        }
    }

    /// Create a ledger seeded with the configured attested reserve.
    #[must_use]
    pub fn from_params(admin: AccountId, params: &ReserveParams, audit: AuditLog) -> Self {
        let mut ledger = Self::new(admin, audit);
        ledger.total_reserve = params.total_reserve;
        ledger
    }

    /// Attest a new total reserve.
    ///
    /// # Errors
    /// - `Unauthorized` without `ReserveAdmin`
    /// - `InvariantViolation` if `total < reserve_used`
    pub fn set_total_reserve(&mut self, caller: &AccountId, total: Amount) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::ReserveAdmin)?;

        if total < self.reserve_used {
            tracing::warn!(
                total,
                reserve_used = self.reserve_used,
                "Rejected reserve attestation below usage"
            );
            return Err(AurumError::InvariantViolation {
                reason: format!(
                    "total reserve {total} below reserve in use {}",
                    self.reserve_used
                ),
            });
        }

        let previous = std::mem::replace(&mut self.total_reserve, total);
        tracing::info!(previous, total, by = %caller, "Total reserve updated");
        self.audit.emit(
            Component::ReserveLedger,
            AuditEvent::TotalReserveSet {
                previous,
                total_reserve: total,
            },
        );
        Ok(())
    }

    /// Claim `amount` of reserve for newly issued tokens.
    ///
    /// # Errors
    /// - `Unauthorized` without `Issuer`
    /// - `InvalidArgument` for a zero amount
    /// - `CapacityExceeded` if `reserve_used + amount > total_reserve`
    pub fn add_reserve_used(&mut self, caller: &AccountId, amount: Amount) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::Issuer)?;
        if amount == 0 {
            return Err(AurumError::invalid_argument("reserve delta must be positive"));
        }

        let available = self.available();
        if amount > available {
            return Err(AurumError::CapacityExceeded {
                requested: amount,
                available,
            });
        }

        self.reserve_used += amount;
        tracing::debug!(amount, reserve_used = self.reserve_used, "Reserve claimed");
        self.audit.emit(
            Component::ReserveLedger,
            AuditEvent::ReserveUsedAdded {
                amount,
                reserve_used: self.reserve_used,
            },
        );
        Ok(())
    }

    /// Release `amount` of reserve after tokens are burned.
    ///
    /// # Errors
    /// - `Unauthorized` without `Issuer`
    /// - `InvalidArgument` for a zero amount
    /// - `Underflow` if `amount > reserve_used`
    pub fn reduce_reserve_used(&mut self, caller: &AccountId, amount: Amount) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::Issuer)?;
        if amount == 0 {
            return Err(AurumError::invalid_argument("reserve delta must be positive"));
        }
        if amount > self.reserve_used {
            return Err(AurumError::Underflow {
                requested: amount,
                available: self.reserve_used,
            });
        }

        self.reserve_used -= amount;
        tracing::debug!(amount, reserve_used = self.reserve_used, "Reserve released");
        self.audit.emit(
            Component::ReserveLedger,
            AuditEvent::ReserveUsedReduced {
                amount,
                reserve_used: self.reserve_used,
            },
        );
        Ok(())
    }

    /// Unclaimed reserve: `total_reserve - reserve_used`.
    #[must_use]
    pub fn available(&self) -> Amount {
        self.total_reserve - self.reserve_used
    }

    #[must_use]
    pub fn total_reserve(&self) -> Amount {
        self.total_reserve
    }

    #[must_use]
    pub fn reserve_used(&self) -> Amount {
        self.reserve_used
    }

    /// Component identity.
    #[must_use]
    pub fn id(&self) -> AccountId {
        self.id
    }

    #[must_use]
    pub fn has_role(&self, account: &AccountId, role: Role) -> bool {
        self.roles.has_role(account, role)
    }

    /// Grant `role` on this ledger (admin only).
    pub fn grant_role(&mut self, caller: &AccountId, role: Role, account: AccountId) -> Result<()> {
        if self.roles.grant(caller, role, account)? {
            self.audit.emit(
                Component::ReserveLedger,
                AuditEvent::RoleGranted {
                    role,
                    account,
                    by: *caller,
                },
            );
        }
        Ok(())
    }

    /// Revoke `role` on this ledger (admin only).
    pub fn revoke_role(&mut self, caller: &AccountId, role: Role, account: AccountId) -> Result<()> {
        if self.roles.revoke(caller, role, account)? {
            self.audit.emit(
                Component::ReserveLedger,
                AuditEvent::RoleRevoked {
                    role,
                    account,
                    by: *caller,
                },
            );
        }
        Ok(())
    }

    /// Handle to this ledger's reentrancy guard.
    #[must_use]
    pub fn guard(&self) -> ReentrancyGuard {
        self.guard.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        ledger: ReserveLedger,
        admin: AccountId,
        issuer: AccountId,
        audit: AuditLog,
    }

    fn setup(total: Amount) -> Fixture {
        let admin = AccountId::new();
        let issuer = AccountId::new();
        let audit = AuditLog::new(64);
        let mut ledger = ReserveLedger::from_params(
            admin,
            &ReserveParams {
                total_reserve: total,
            },
            audit.clone(),
        );
        ledger.grant_role(&admin, Role::Issuer, issuer).unwrap();
        Fixture {
            ledger,
            admin,
            issuer,
            audit,
        }
    }

    #[test]
    fn add_and_reduce_track_usage() {
        let mut f = setup(1000);
        f.ledger.add_reserve_used(&f.issuer, 98).unwrap();
        assert_eq!(f.ledger.reserve_used(), 98);
        assert_eq!(f.ledger.available(), 902);

        f.ledger.reduce_reserve_used(&f.issuer, 10).unwrap();
        assert_eq!(f.ledger.reserve_used(), 88);
        assert_eq!(f.ledger.available(), 912);
    }

    #[test]
    fn add_beyond_capacity_fails() {
        let mut f = setup(100);
        f.ledger.add_reserve_used(&f.issuer, 60).unwrap();
        let err = f.ledger.add_reserve_used(&f.issuer, 41).unwrap_err();
        assert_eq!(
            err,
            AurumError::CapacityExceeded {
                requested: 41,
                available: 40
            }
        );
        assert_eq!(f.ledger.reserve_used(), 60);
        f.ledger.add_reserve_used(&f.issuer, 40).unwrap();
        assert_eq!(f.ledger.available(), 0);
    }

    #[test]
    fn reduce_below_zero_fails() {
        let mut f = setup(100);
        f.ledger.add_reserve_used(&f.issuer, 5).unwrap();
        let err = f.ledger.reduce_reserve_used(&f.issuer, 6).unwrap_err();
        assert!(matches!(err, AurumError::Underflow { .. }));
        assert_eq!(f.ledger.reserve_used(), 5);
    }

    #[test]
    fn total_below_usage_is_invariant_violation() {
        let mut f = setup(1000);
        f.ledger.add_reserve_used(&f.issuer, 500).unwrap();
        let err = f.ledger.set_total_reserve(&f.admin, 499).unwrap_err();
        assert!(matches!(err, AurumError::InvariantViolation { .. }));
        assert_eq!(f.ledger.total_reserve(), 1000);

        f.ledger.set_total_reserve(&f.admin, 500).unwrap();
        assert_eq!(f.ledger.available(), 0);
    }

    #[test]
    fn non_admin_rejected_repeatedly_without_mutation() {
        let mut f = setup(1000);
        let stranger = AccountId::new();
        let before = f.audit.len();
        for _ in 0..5 {
            let err = f.ledger.set_total_reserve(&stranger, 5).unwrap_err();
            assert!(matches!(err, AurumError::Unauthorized { .. }));
            let err = f.ledger.add_reserve_used(&stranger, 5).unwrap_err();
            assert!(matches!(err, AurumError::Unauthorized { .. }));
        }
        assert_eq!(f.ledger.total_reserve(), 1000);
        assert_eq!(f.ledger.reserve_used(), 0);
        assert_eq!(f.audit.len(), before);
    }

    #[test]
    fn zero_delta_rejected() {
        let mut f = setup(10);
        assert!(matches!(
            f.ledger.add_reserve_used(&f.issuer, 0).unwrap_err(),
            AurumError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn mutations_emit_audit_records() {
        let mut f = setup(1000);
        f.ledger.set_total_reserve(&f.admin, 2000).unwrap();
        f.ledger.add_reserve_used(&f.issuer, 7).unwrap();
        let records = f.audit.records_for(Component::ReserveLedger);
        let events: Vec<_> = records.into_iter().map(|r| r.event).collect();
        assert!(events.contains(&AuditEvent::TotalReserveSet {
            previous: 1000,
            total_reserve: 2000
        }));
        assert_eq!(
            events.last(),
            Some(&AuditEvent::ReserveUsedAdded {
                amount: 7,
                reserve_used: 7
            })
        );
    }

    #[test]
    fn reentrant_mutation_rejected() {
        let mut f = setup(1000);
        let guard = f.ledger.guard();
        let _held = guard.enter().unwrap();
        let err = f.ledger.add_reserve_used(&f.issuer, 1).unwrap_err();
        assert!(matches!(err, AurumError::InvalidState { .. }));
        assert_eq!(f.ledger.reserve_used(), 0);
    }

    #[test]
    fn revoked_issuer_loses_access() {
        let mut f = setup(1000);
        f.ledger
            .revoke_role(&f.admin, Role::Issuer, f.issuer)
            .unwrap();
        assert!(f.ledger.add_reserve_used(&f.issuer, 1).is_err());
    }
}
