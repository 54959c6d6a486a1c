//! A fully wired engine: ledger, token, swap engine and redemption workflow
//! sharing one audit trail.
//!
//! Wiring grants the component identities their cross-component roles:
//!
//! ```text
//! token.id      → Issuer on ReserveLedger
//! swap.id       → Issuer on BackedToken
//! redemption.id → Issuer on BackedToken
//! redemption.id → escrow account on BackedToken
//! ```

use aurum_reserve::{BackedToken, ReserveLedger, check_backing};
use aurum_types::{
    AccountId, Amount, AuditLog, AurumConfig, AurumError, RequestId, Result, Role, StableAsset,
};

use crate::redemption::RedemptionWorkflow;
use crate::swap_engine::{SwapEngine, SwapOutcome};

/// All four components plus their shared audit log.
#[derive(Debug)]
pub struct Deployment {
    pub audit: AuditLog,
    pub ledger: ReserveLedger,
    pub token: BackedToken,
    pub swap: SwapEngine,
    pub redemption: RedemptionWorkflow,
}

impl Deployment {
    /// Build every component from `config` with `admin` as the sole
    /// administrator, then grant the cross-component roles.
    ///
    /// # Errors
    /// `Configuration` if `config` does not validate, or any error of the
    /// component constructors.
    pub fn from_config(admin: AccountId, config: &AurumConfig) -> Result<Self> {
        admin.ensure_not_null("deployment admin")?;
        config.validate()?;
        let audit = AuditLog::new(config.units.audit_capacity);

        let mut ledger = ReserveLedger::from_params(admin, &config.reserve_params()?, audit.clone());
        let mut token = BackedToken::new(admin, audit.clone());
        let swap = SwapEngine::new(admin, &config.swap_params(), audit.clone())?;
        let redemption =
            RedemptionWorkflow::new(admin, &config.redemption_params()?, audit.clone())?;

        ledger.grant_role(&admin, Role::Issuer, token.id())?;
        token.grant_role(&admin, Role::Issuer, swap.id())?;
        token.grant_role(&admin, Role::Issuer, redemption.id())?;
        token.register_escrow(&admin, redemption.id())?;

        tracing::info!(
            admin = %admin,
            total_reserve = ledger.total_reserve(),
            token = %token.id(),
            swap = %swap.id(),
            redemption = %redemption.id(),
            "Deployment wired"
        );
        Ok(Self {
            audit,
            ledger,
            token,
            swap,
            redemption,
        })
    }

    pub fn swap_to_backed<S: StableAsset + ?Sized>(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        stable: &mut S,
    ) -> Result<SwapOutcome> {
        self.swap
            .swap_to_backed(caller, amount, &mut self.ledger, &mut self.token, stable)
    }

    pub fn swap_to_stable<S: StableAsset + ?Sized>(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        stable: &mut S,
    ) -> Result<SwapOutcome> {
        self.swap
            .swap_to_stable(caller, amount, &mut self.ledger, &mut self.token, stable)
    }

    pub fn request_redeem<S: StableAsset + ?Sized>(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        stable: &mut S,
    ) -> Result<RequestId> {
        self.redemption
            .request_redeem(caller, amount, &mut self.token, stable)
    }

    pub fn approve_redeem(&mut self, caller: &AccountId, id: RequestId) -> Result<()> {
        self.redemption
            .approve_redeem(caller, id, &mut self.ledger, &mut self.token)
    }

    pub fn cancel_redeem(&mut self, caller: &AccountId, id: RequestId) -> Result<()> {
        self.redemption.cancel_redeem(caller, id, &mut self.token)
    }

    /// Check backing, escrow and the audit hash chain.
    ///
    /// Only the workflow can credit its escrow account, so its balance is
    /// exactly the sum of pending requests.
    ///
    /// # Errors
    /// `InvariantViolation` naming the first broken invariant.
    pub fn check_invariants(&self) -> Result<()> {
        check_backing(&self.ledger, &self.token)?;
        let escrow = self.token.balance_of(&self.redemption.id());
        let pending = self.redemption.escrowed_total();
        if escrow != pending {
            return Err(AurumError::InvariantViolation {
                reason: format!("escrow balance {escrow} != pending requests {pending}"),
            });
        }
        self.audit.verify_chain()
    }
}
