//! Reserve-backed fungible token.
//!
//! Balances are owned exclusively by the token. Mint and burn are the only
//! supply-changing paths and each is coupled to the [`ReserveLedger`]:
//!
//! ```text
//! mint:  checks → ledger.add_reserve_used(amount)    → credit recipient
//! burn:  checks → ledger.reduce_reserve_used(amount) → debit holder
//! ```
//!
//! Every fallible check (role, pause, arguments, capacity, balance,
//! overflow) runs before the ledger call and the balance update after it
//! cannot fail, so the pair commits or aborts as one unit. Hence
//! `Σ balances == total_supply == ledger.reserve_used()`.
//!
//! Accounts registered as escrow can only be credited by the escrow owner
//! itself, so a component's escrow balance always matches its own books.

use std::collections::{HashMap, HashSet};

use aurum_types::{
    AccountId, Amount, AuditEvent, AuditLog, AurumError, Component, ReentrancyGuard, Result,
    Role, RoleStore,
};

use crate::reserve_ledger::ReserveLedger;

/// Fungible token whose supply is gated by the reserve ledger.
#[derive(Debug)]
pub struct BackedToken {
    /// Component identity; must hold `Issuer` on the ledger.
    id: AccountId,
    balances: HashMap<AccountId, Amount>,
    /// Per-(owner, spender) allowances.
    allowances: HashMap<(AccountId, AccountId), Amount>,
    total_supply: Amount,
    /// Component accounts that only they themselves may credit.
    escrow_accounts: HashSet<AccountId>,
    paused: bool,
    roles: RoleStore,
    guard: ReentrancyGuard,
    audit: AuditLog,
}

impl BackedToken {
    /// Create an empty token. `admin` holds `Admin` and `Pauser`.
    #[must_use]
    pub fn new(admin: AccountId, audit: AuditLog) -> Self {
        Self {
            id: AccountId::new(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
            escrow_accounts: HashSet::new(),
            paused: false,
            roles: RoleStore::with_admin(admin, &[Role::Pauser]),
            guard: ReentrancyGuard::new(),
            audit,
        }
    }

    /// Mint `amount` to `to`, claiming the same amount of reserve.
    ///
    /// # Errors
    /// - `Unauthorized` without `Issuer`
    /// - `Paused` while the circuit breaker is engaged
    /// - `InvalidArgument` for a null recipient, zero amount, or overflow
    /// - `CapacityExceeded` if the ledger cannot back `amount`
    pub fn mint(
        &mut self,
        ledger: &mut ReserveLedger,
        caller: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::Issuer)?;
        self.ensure_not_paused()?;
        to.ensure_not_null("mint recipient")?;
        self.ensure_may_credit(caller, to)?;
        ensure_positive(amount)?;

        let available = ledger.available();
        if available < amount {
            tracing::warn!(amount, available, to = %to, "Mint rejected: reserve exhausted");
            return Err(AurumError::CapacityExceeded {
                requested: amount,
                available,
            });
        }
        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| AurumError::overflow("mint"))?;
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| AurumError::overflow("mint"))?;

        // Ledger first: if the claim fails, no balance has moved.
        ledger.add_reserve_used(&self.id, amount)?;
        self.balances.insert(*to, new_balance);
        self.total_supply = new_supply;

        tracing::info!(to = %to, amount, supply = self.total_supply, "Minted");
        self.audit
            .emit(Component::BackedToken, AuditEvent::Minted { to: *to, amount });
        Ok(())
    }

    /// Burn `amount` held by `holder`, releasing the same amount of reserve.
    ///
    /// # Errors
    /// - `Unauthorized` without `Issuer`
    /// - `Paused` while the circuit breaker is engaged
    /// - `InvalidArgument` for a zero amount
    /// - `InsufficientBalance` if `holder` holds less than `amount`
    pub fn burn_from_escrow(
        &mut self,
        ledger: &mut ReserveLedger,
        caller: &AccountId,
        holder: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::Issuer)?;
        self.ensure_not_paused()?;
        ensure_positive(amount)?;

        let balance = self.balance_of(holder);
        if balance < amount {
            return Err(AurumError::InsufficientBalance {
                needed: amount,
                available: balance,
            });
        }

        ledger.reduce_reserve_used(&self.id, amount)?;
        self.balances.insert(*holder, balance - amount);
        self.total_supply -= amount;

        tracing::info!(holder = %holder, amount, supply = self.total_supply, "Burned");
        self.audit.emit(
            Component::BackedToken,
            AuditEvent::Burned {
                holder: *holder,
                amount,
            },
        );
        Ok(())
    }

    /// Move `amount` from `caller` to `to`.
    ///
    /// # Errors
    /// `Unauthorized` if `to` is an escrow account other than `caller`.
    pub fn transfer(&mut self, caller: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.ensure_not_paused()?;
        self.ensure_may_credit(caller, to)?;
        self.move_balance(caller, to, amount)
    }

    /// Let `spender` move up to `amount` of `owner`'s tokens.
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) -> Result<()> {
        let _entered = self.guard.enter()?;
        spender.ensure_not_null("spender")?;
        self.allowances.insert((*owner, *spender), amount);
        self.audit.emit(
            Component::BackedToken,
            AuditEvent::Approved {
                owner: *owner,
                spender: *spender,
                amount,
            },
        );
        Ok(())
    }

    /// Move `amount` from `from` to `to` against `spender`'s allowance.
    ///
    /// # Errors
    /// - `Unauthorized` if `to` is an escrow account other than `spender`
    /// - `InsufficientBalance` if the allowance or the balance is too low
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.ensure_not_paused()?;
        self.ensure_may_credit(spender, to)?;
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(AurumError::InsufficientBalance {
                needed: amount,
                available: allowed,
            });
        }
        self.move_balance(from, to, amount)?;
        self.allowances.insert((*from, *spender), allowed - amount);
        Ok(())
    }

    /// Mark `account` as escrow (admin only). From then on only `account`
    /// itself can move tokens into it.
    pub fn register_escrow(&mut self, caller: &AccountId, account: AccountId) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::Admin)?;
        account.ensure_not_null("escrow account")?;
        if self.escrow_accounts.insert(account) {
            tracing::info!(account = %account, by = %caller, "Escrow registered");
            self.audit.emit(
                Component::BackedToken,
                AuditEvent::EscrowRegistered {
                    account,
                    by: *caller,
                },
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn is_escrow(&self, account: &AccountId) -> bool {
        self.escrow_accounts.contains(account)
    }

    /// Engage the circuit breaker.
    pub fn pause(&mut self, caller: &AccountId) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::Pauser)?;
        if self.paused {
            return Err(AurumError::invalid_state("token already paused"));
        }
        self.paused = true;
        tracing::warn!(by = %caller, "Token paused");
        self.audit
            .emit(Component::BackedToken, AuditEvent::Paused { by: *caller });
        Ok(())
    }

    /// Release the circuit breaker.
    pub fn unpause(&mut self, caller: &AccountId) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::Pauser)?;
        if !self.paused {
            return Err(AurumError::invalid_state("token not paused"));
        }
        self.paused = false;
        tracing::info!(by = %caller, "Token unpaused");
        self.audit
            .emit(Component::BackedToken, AuditEvent::Unpaused { by: *caller });
        Ok(())
    }

    #[must_use]
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Sum of every account balance, computed from scratch.
    #[must_use]
    pub fn sum_of_balances(&self) -> Amount {
        self.balances.values().sum()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
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

    /// Grant `role` on this token (admin only).
    pub fn grant_role(&mut self, caller: &AccountId, role: Role, account: AccountId) -> Result<()> {
        if self.roles.grant(caller, role, account)? {
            self.audit.emit(
                Component::BackedToken,
                AuditEvent::RoleGranted {
                    role,
                    account,
                    by: *caller,
                },
            );
        }
        Ok(())
    }

    /// Revoke `role` on this token (admin only).
    pub fn revoke_role(&mut self, caller: &AccountId, role: Role, account: AccountId) -> Result<()> {
        if self.roles.revoke(caller, role, account)? {
            self.audit.emit(
                Component::BackedToken,
                AuditEvent::RoleRevoked {
                    role,
                    account,
                    by: *caller,
                },
            );
        }
        Ok(())
    }

    /// Handle to this token's reentrancy guard.
    #[must_use]
    pub fn guard(&self) -> ReentrancyGuard {
        self.guard.clone()
    }

    fn ensure_not_paused(&self) -> Result<()> {
        if self.paused {
            Err(AurumError::Paused)
        } else {
            Ok(())
        }
    }

    fn ensure_may_credit(&self, actor: &AccountId, to: &AccountId) -> Result<()> {
        if self.escrow_accounts.contains(to) && actor != to {
            tracing::warn!(actor = %actor, escrow = %to, "Credit to escrow rejected");
            return Err(AurumError::Unauthorized {
                account: *actor,
                required: format!("ownership of escrow {to}"),
            });
        }
        Ok(())
    }

    fn move_balance(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        to.ensure_not_null("transfer recipient")?;
        ensure_positive(amount)?;
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(AurumError::InsufficientBalance {
                needed: amount,
                available: from_balance,
            });
        }
        if from != to {
            let to_balance = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or_else(|| AurumError::overflow("transfer"))?;
            self.balances.insert(*from, from_balance - amount);
            self.balances.insert(*to, to_balance);
        }
        tracing::debug!(from = %from, to = %to, amount, "Transferred");
        self.audit.emit(
            Component::BackedToken,
            AuditEvent::Transferred {
                from: *from,
                to: *to,
                amount,
            },
        );
        Ok(())
    }
}

fn ensure_positive(amount: Amount) -> Result<()> {
    if amount == 0 {
        Err(AurumError::invalid_argument("amount must be positive"))
    } else {
        Ok(())
    }
}
