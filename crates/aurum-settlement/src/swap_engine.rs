//! Stable ↔ backed conversion with a basis-point fee.
//!
//! ```text
//! swap_to_backed: pull amount stable → forward fee → mint net
//! swap_to_stable: pay net stable → forward fee → burn amount
//! ```
//!
//! The engine holds stable custody under its own identity and must hold
//! `Issuer` on the token. Each swap runs inside a stable-asset savepoint with
//! the token mutation last, so a refused transfer or a failed mint/burn
//! leaves both ledgers untouched.

use aurum_reserve::{BackedToken, ReserveLedger};
use aurum_types::{
    AccountId, Amount, AuditEvent, AuditLog, AurumError, Component, FeeSplit, ReentrancyGuard,
    Result, Role, RoleStore, StableAsset, SwapParams, split_fee,
};

use crate::unit_of_work::{atomically, pull, push};

/// Result of a committed swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    pub split: FeeSplit,
    /// Sequence number of the swap's audit record.
    pub audit_seq: u64,
}

/// Converts the stable settlement asset into backed tokens and back.
#[derive(Debug)]
pub struct SwapEngine {
    id: AccountId,
    fee_bps: u32,
    max_fee_bps: u32,
    fee_collector: AccountId,
    roles: RoleStore,
    guard: ReentrancyGuard,
    audit: AuditLog,
}

impl SwapEngine {
    /// Create an engine from its resolved config section.
    ///
    /// # Errors
    /// `InvalidArgument` if the fee exceeds the ceiling or the collector is
    /// null.
    pub fn new(admin: AccountId, params: &SwapParams, audit: AuditLog) -> Result<Self> {
        params.fee_collector.ensure_not_null("swap fee collector")?;
        check_fee(params.fee_bps, params.max_fee_bps)?;
        Ok(Self {
            id: AccountId::new(),
            fee_bps: params.fee_bps,
            max_fee_bps: params.max_fee_bps,
            fee_collector: params.fee_collector,
            roles: RoleStore::with_admin(admin, &[]),
            guard: ReentrancyGuard::new(),
            audit,
        })
    }

    /// Pay `amount` stable, receive `amount - fee` backed tokens.
    ///
    /// Capacity is checked against the full `amount`, not the net mint.
    ///
    /// # Errors
    /// - `InvalidArgument` for a zero amount or null caller
    /// - `CapacityExceeded` if the reserve cannot cover `amount`
    /// - `ExternalTransferFailed` if the pull or the fee leg is refused
    /// - any error of [`BackedToken::mint`]
    pub fn swap_to_backed<S: StableAsset + ?Sized>(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        ledger: &mut ReserveLedger,
        token: &mut BackedToken,
        stable: &mut S,
    ) -> Result<SwapOutcome> {
        let _entered = self.guard.enter()?;
        caller.ensure_not_null("swap caller")?;
        ensure_positive(amount)?;

        let available = ledger.available();
        if available < amount {
            tracing::warn!(caller = %caller, amount, available, "Swap to backed rejected: reserve exhausted");
            return Err(AurumError::CapacityExceeded {
                requested: amount,
                available,
            });
        }
        let split = split_fee(amount, self.fee_bps)?;

        let engine = self.id;
        let collector = self.fee_collector;
        atomically(stable, "swap_to_backed", |stable| {
            pull(stable, &engine, caller, &engine, amount, "swap payment")?;
            if split.fee > 0 {
                push(stable, &engine, &collector, split.fee, "swap fee")?;
            }
            token.mint(ledger, &engine, caller, split.net)
        })?;

        tracing::info!(caller = %caller, amount, net = split.net, fee = split.fee, "Swapped stable to backed");
        let audit_seq = self.audit.emit(
            Component::SwapEngine,
            AuditEvent::SwappedToBacked {
                caller: *caller,
                amount,
                net: split.net,
                fee: split.fee,
            },
        );
        Ok(SwapOutcome { split, audit_seq })
    }

    /// Return `amount` backed tokens, receive `amount - fee` stable.
    ///
    /// # Errors
    /// - `InvalidArgument` for a zero amount or null caller
    /// - `CapacityExceeded` if engine custody holds less than `amount`
    /// - `InsufficientBalance` if the caller holds less than `amount` tokens
    /// - `Paused` while the token circuit breaker is engaged
    /// - `ExternalTransferFailed` if a payout leg is refused
    pub fn swap_to_stable<S: StableAsset + ?Sized>(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        ledger: &mut ReserveLedger,
        token: &mut BackedToken,
        stable: &mut S,
    ) -> Result<SwapOutcome> {
        let _entered = self.guard.enter()?;
        caller.ensure_not_null("swap caller")?;
        ensure_positive(amount)?;

        let custody = stable.balance_of(&self.id);
        if custody < amount {
            tracing::warn!(caller = %caller, amount, custody, "Swap to stable rejected: custody short");
            return Err(AurumError::CapacityExceeded {
                requested: amount,
                available: custody,
            });
        }
        if token.is_paused() {
            return Err(AurumError::Paused);
        }
        let held = token.balance_of(caller);
        if held < amount {
            return Err(AurumError::InsufficientBalance {
                needed: amount,
                available: held,
            });
        }
        let split = split_fee(amount, self.fee_bps)?;

        let engine = self.id;
        let collector = self.fee_collector;
        atomically(stable, "swap_to_stable", |stable| {
            push(stable, &engine, caller, split.net, "swap payout")?;
            if split.fee > 0 {
                push(stable, &engine, &collector, split.fee, "swap fee")?;
            }
            token.burn_from_escrow(ledger, &engine, caller, amount)
        })?;

        tracing::info!(caller = %caller, amount, net = split.net, fee = split.fee, "Swapped backed to stable");
        let audit_seq = self.audit.emit(
            Component::SwapEngine,
            AuditEvent::SwappedToStable {
                caller: *caller,
                amount,
                net: split.net,
                fee: split.fee,
            },
        );
        Ok(SwapOutcome { split, audit_seq })
    }

    /// Redirect future fees to `collector`.
    pub fn update_fee_collector(&mut self, caller: &AccountId, collector: AccountId) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::Admin)?;
        collector.ensure_not_null("swap fee collector")?;
        self.fee_collector = collector;
        tracing::info!(collector = %collector, "Swap fee collector updated");
        self.audit.emit(
            Component::SwapEngine,
            AuditEvent::FeeCollectorUpdated { collector },
        );
        Ok(())
    }

    /// Set the swap fee. Capped at `max_fee_bps`.
    pub fn update_fee_percent(&mut self, caller: &AccountId, fee_bps: u32) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::Admin)?;
        check_fee(fee_bps, self.max_fee_bps)?;
        self.fee_bps = fee_bps;
        tracing::info!(fee_bps, "Swap fee updated");
        self.audit
            .emit(Component::SwapEngine, AuditEvent::FeeUpdated { fee_bps });
        Ok(())
    }

    /// Fee and net for swapping `amount` at the current rate.
    pub fn quote(&self, amount: Amount) -> Result<FeeSplit> {
        split_fee(amount, self.fee_bps)
    }

    #[must_use]
    pub fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    #[must_use]
    pub fn max_fee_bps(&self) -> u32 {
        self.max_fee_bps
    }

    #[must_use]
    pub fn fee_collector(&self) -> AccountId {
        self.fee_collector
    }

    /// Custody identity; spender of user stable allowances.
    #[must_use]
    pub fn id(&self) -> AccountId {
        self.id
    }

    #[must_use]
    pub fn has_role(&self, account: &AccountId, role: Role) -> bool {
        self.roles.has_role(account, role)
    }

    pub fn grant_role(&mut self, caller: &AccountId, role: Role, account: AccountId) -> Result<()> {
        if self.roles.grant(caller, role, account)? {
            self.audit.emit(
                Component::SwapEngine,
                AuditEvent::RoleGranted {
                    role,
                    account,
                    by: *caller,
                },
            );
        }
        Ok(())
    }

    pub fn revoke_role(&mut self, caller: &AccountId, role: Role, account: AccountId) -> Result<()> {
        if self.roles.revoke(caller, role, account)? {
            self.audit.emit(
                Component::SwapEngine,
                AuditEvent::RoleRevoked {
                    role,
                    account,
                    by: *caller,
                },
            );
        }
        Ok(())
    }

    /// Handle to the engine's in-progress flag.
    #[must_use]
    pub fn guard(&self) -> ReentrancyGuard {
        self.guard.clone()
    }
}

fn check_fee(fee_bps: u32, max_fee_bps: u32) -> Result<()> {
    if fee_bps > max_fee_bps {
        return Err(AurumError::invalid_argument(format!(
            "fee {fee_bps} bps exceeds ceiling {max_fee_bps} bps"
        )));
    }
    Ok(())
}

fn ensure_positive(amount: Amount) -> Result<()> {
    if amount == 0 {
        return Err(AurumError::invalid_argument("amount must be positive"));
    }
    Ok(())
}
