//! Physical redemption workflow.
//!
//! Users lock backed tokens in escrow (the workflow's own token account) and
//! pay a stable-asset fee up front. An operator then either approves the
//! request, burning the escrow and releasing reserve, or the requester
//! cancels it and gets the tokens back. The fee is never refunded.
//!
//! ```text
//! request_redeem → Pending ─┬─ approve_redeem → Approved (burned)
//!                           └─ cancel_redeem  → Canceled (returned)
//! ```
//!
//! Invariant: the workflow's token balance equals [`RedemptionWorkflow::escrowed_total`].

use std::collections::{BTreeMap, HashMap};

use aurum_reserve::{BackedToken, ReserveLedger};
use aurum_types::{
    AccountId, Amount, AuditEvent, AuditLog, AurumError, Component, RedemptionParams,
    RedemptionRequest, RedemptionStatus, ReentrancyGuard, RequestId, Result, Role, RoleStore,
    StableAsset, constants::FIRST_REQUEST_ID, redemption_fee,
};

use crate::unit_of_work::{atomically, pull};

/// Request book and configuration of the redemption workflow.
#[derive(Debug)]
pub struct RedemptionWorkflow {
    /// Component identity; token escrow account and stable fee spender.
    id: AccountId,
    min_redeem: Amount,
    /// Reference price scaled by `price_scale`.
    gold_price: Amount,
    price_scale: Amount,
    fee_bps: u32,
    max_fee_bps: u32,
    fee_collector: AccountId,
    requests: BTreeMap<RequestId, RedemptionRequest>,
    /// Per-user request ids in insertion order.
    by_requester: HashMap<AccountId, Vec<RequestId>>,
    next_id: RequestId,
    roles: RoleStore,
    guard: ReentrancyGuard,
    audit: AuditLog,
}

impl RedemptionWorkflow {
    /// Create a workflow from its resolved config section. `admin` holds
    /// `Admin` and `WorkflowAdmin`.
    ///
    /// # Errors
    /// `InvalidArgument` for a null collector, a zero price or scale, or a
    /// fee above the ceiling.
    pub fn new(admin: AccountId, params: &RedemptionParams, audit: AuditLog) -> Result<Self> {
        params
            .fee_collector
            .ensure_not_null("redemption fee collector")?;
        if params.gold_price == 0 || params.price_scale == 0 {
            return Err(AurumError::invalid_argument(
                "gold price and price scale must be positive",
            ));
        }
        check_fee(params.fee_bps, params.max_fee_bps)?;
        Ok(Self {
            id: AccountId::new(),
            min_redeem: params.min_redeem,
            gold_price: params.gold_price,
            price_scale: params.price_scale,
            fee_bps: params.fee_bps,
            max_fee_bps: params.max_fee_bps,
            fee_collector: params.fee_collector,
            requests: BTreeMap::new(),
            by_requester: HashMap::new(),
            next_id: RequestId(FIRST_REQUEST_ID),
            roles: RoleStore::with_admin(admin, &[Role::WorkflowAdmin]),
            guard: ReentrancyGuard::new(),
            audit,
        })
    }

    /// Open a redemption of `amount` backed tokens.
    ///
    /// The caller must have approved the workflow as spender on both the
    /// token (`amount`) and the stable asset (the fee).
    ///
    /// # Errors
    /// - `InvalidArgument` below the minimum, for zero, or a null caller
    /// - `InsufficientBalance` if the token or stable balance is short
    /// - `ExternalTransferFailed` if the fee transfer is refused
    /// - any error of [`BackedToken::transfer_from`]
    pub fn request_redeem<S: StableAsset + ?Sized>(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        token: &mut BackedToken,
        stable: &mut S,
    ) -> Result<RequestId> {
        let _entered = self.guard.enter()?;
        caller.ensure_not_null("requester")?;
        if amount == 0 || amount < self.min_redeem {
            return Err(AurumError::invalid_argument(format!(
                "redeem amount {amount} below minimum {}",
                self.min_redeem.max(1)
            )));
        }
        let held = token.balance_of(caller);
        if held < amount {
            return Err(AurumError::InsufficientBalance {
                needed: amount,
                available: held,
            });
        }
        let fee = self.fee_quote(amount)?;
        let stable_held = stable.balance_of(caller);
        if stable_held < fee {
            return Err(AurumError::InsufficientBalance {
                needed: fee,
                available: stable_held,
            });
        }

        let workflow = self.id;
        let collector = self.fee_collector;
        atomically(stable, "request_redeem", |stable| {
            if fee > 0 {
                pull(stable, &workflow, caller, &collector, fee, "redemption fee")?;
            }
            token.transfer_from(&workflow, caller, &workflow, amount)
        })?;

        let id = self.next_id;
        self.next_id = id.next();
        self.requests
            .insert(id, RedemptionRequest::pending(id, *caller, amount, fee));
        self.by_requester.entry(*caller).or_default().push(id);

        tracing::info!(%id, requester = %caller, amount, fee, "Redemption requested");
        self.audit.emit(
            Component::RedemptionWorkflow,
            AuditEvent::RedeemRequested {
                id,
                requester: *caller,
                amount,
                fee,
            },
        );
        Ok(id)
    }

    /// Approve a pending request: burn its escrow and release the reserve.
    ///
    /// # Errors
    /// - `Unauthorized` without `WorkflowAdmin`
    /// - `InvalidArgument` for an unknown id
    /// - `InvalidState` unless the request is `Pending`
    /// - any error of [`BackedToken::burn_from_escrow`]
    pub fn approve_redeem(
        &mut self,
        caller: &AccountId,
        id: RequestId,
        ledger: &mut ReserveLedger,
        token: &mut BackedToken,
    ) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::WorkflowAdmin)?;
        let request = lookup(&mut self.requests, id)?;
        request.ensure_transition(RedemptionStatus::Approved)?;
        let amount = request.amount;

        token.burn_from_escrow(ledger, &self.id, &self.id, amount)?;
        request.mark_approved()?;

        tracing::info!(%id, amount, "Redemption approved");
        self.audit.emit(
            Component::RedemptionWorkflow,
            AuditEvent::RedeemApproved { id, amount },
        );
        Ok(())
    }

    /// Cancel a pending request and return its escrow. Requester only.
    ///
    /// # Errors
    /// - `InvalidArgument` for an unknown id
    /// - `Unauthorized` if `caller` is not the requester
    /// - `InvalidState` unless the request is `Pending`
    /// - any error of [`BackedToken::transfer`]
    pub fn cancel_redeem(
        &mut self,
        caller: &AccountId,
        id: RequestId,
        token: &mut BackedToken,
    ) -> Result<()> {
        let _entered = self.guard.enter()?;
        let request = lookup(&mut self.requests, id)?;
        if request.requester != *caller {
            tracing::warn!(%id, caller = %caller, "Cancel rejected: not the requester");
            return Err(AurumError::Unauthorized {
                account: *caller,
                required: format!("ownership of {id}"),
            });
        }
        request.ensure_transition(RedemptionStatus::Canceled)?;
        let requester = request.requester;

        token.transfer(&self.id, &requester, request.amount)?;
        let amount = request.mark_canceled()?;

        tracing::info!(%id, requester = %requester, amount, "Redemption canceled");
        self.audit.emit(
            Component::RedemptionWorkflow,
            AuditEvent::RedeemCanceled {
                id,
                requester,
                amount,
            },
        );
        Ok(())
    }

    /// Ids of every request `user` has opened, oldest first.
    #[must_use]
    pub fn requests_of(&self, user: &AccountId) -> &[RequestId] {
        self.by_requester
            .get(user)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn request(&self, id: RequestId) -> Option<&RedemptionRequest> {
        self.requests.get(&id)
    }

    /// Backed tokens currently held in escrow by pending requests.
    #[must_use]
    pub fn escrowed_total(&self) -> Amount {
        self.requests
            .values()
            .filter(|r| r.status == RedemptionStatus::Pending)
            .map(|r| r.amount)
            .sum()
    }

    /// Stable-asset fee charged for redeeming `amount`.
    pub fn fee_quote(&self, amount: Amount) -> Result<Amount> {
        redemption_fee(amount, self.gold_price, self.price_scale, self.fee_bps)
    }

    pub fn set_min_redeem(&mut self, caller: &AccountId, min_redeem: Amount) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::WorkflowAdmin)?;
        self.min_redeem = min_redeem;
        tracing::info!(min_redeem, "Minimum redemption updated");
        self.audit.emit(
            Component::RedemptionWorkflow,
            AuditEvent::MinRedeemUpdated { min_redeem },
        );
        Ok(())
    }

    /// Set the reference price, scaled by the configured price scale.
    pub fn set_gold_price(&mut self, caller: &AccountId, gold_price: Amount) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::WorkflowAdmin)?;
        if gold_price == 0 {
            return Err(AurumError::invalid_argument("gold price must be positive"));
        }
        self.gold_price = gold_price;
        tracing::info!(gold_price, "Gold price updated");
        self.audit.emit(
            Component::RedemptionWorkflow,
            AuditEvent::GoldPriceUpdated { gold_price },
        );
        Ok(())
    }

    pub fn set_fee_bps(&mut self, caller: &AccountId, fee_bps: u32) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::WorkflowAdmin)?;
        check_fee(fee_bps, self.max_fee_bps)?;
        self.fee_bps = fee_bps;
        tracing::info!(fee_bps, "Redemption fee updated");
        self.audit.emit(
            Component::RedemptionWorkflow,
            AuditEvent::FeeUpdated { fee_bps },
        );
        Ok(())
    }

    pub fn set_fee_collector(&mut self, caller: &AccountId, collector: AccountId) -> Result<()> {
        let _entered = self.guard.enter()?;
        self.roles.require(caller, Role::WorkflowAdmin)?;
        collector.ensure_not_null("redemption fee collector")?;
        self.fee_collector = collector;
        tracing::info!(collector = %collector, "Redemption fee collector updated");
        self.audit.emit(
            Component::RedemptionWorkflow,
            AuditEvent::FeeCollectorUpdated { collector },
        );
        Ok(())
    }

    #[must_use]
    pub fn min_redeem(&self) -> Amount {
        self.min_redeem
    }

    #[must_use]
    pub fn gold_price(&self) -> Amount {
        self.gold_price
    }

    #[must_use]
    pub fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    #[must_use]
    pub fn fee_collector(&self) -> AccountId {
        self.fee_collector
    }

    /// Escrow account on the token; spender of user allowances.
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
                Component::RedemptionWorkflow,
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
                Component::RedemptionWorkflow,
                AuditEvent::RoleRevoked {
                    role,
                    account,
                    by: *caller,
                },
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn guard(&self) -> ReentrancyGuard {
        self.guard.clone()
    }
}

fn lookup(
    requests: &mut BTreeMap<RequestId, RedemptionRequest>,
    id: RequestId,
) -> Result<&mut RedemptionRequest> {
    requests
        .get_mut(&id)
        .ok_or_else(|| AurumError::invalid_argument(format!("unknown request {id}")))
}

fn check_fee(fee_bps: u32, max_fee_bps: u32) -> Result<()> {
    if fee_bps > max_fee_bps {
        return Err(AurumError::invalid_argument(format!(
            "fee {fee_bps} bps exceeds ceiling {max_fee_bps} bps"
        )));
    }
    Ok(())
}
