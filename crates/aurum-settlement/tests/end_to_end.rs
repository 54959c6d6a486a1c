//! End-to-end integration tests across the reserve and settlement planes.
//!
//! These tests drive a fully wired [`Deployment`] through the user-facing
//! flows: swapping in and out, requesting, canceling and approving
//! redemptions. After every step they check that the reserve, the token
//! supply, the redemption escrow and the audit trail still agree.

use aurum_reserve::SupplyConservation;
use aurum_settlement::Deployment;
use aurum_types::*;
use rust_decimal::Decimal;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Wired engine plus a funded user and the in-memory stable asset.
struct Harness {
    admin: AccountId,
    user: AccountId,
    swap_collector: AccountId,
    redemption_collector: AccountId,
    engine: Deployment,
    stable: StableLedger,
    supply: SupplyConservation,
}

impl Harness {
    /// Reserve 1000, swap fee 200 bps, redemption price 65.5 at 100 bps.
    fn new() -> Self {
        init_tracing();
        let admin = AccountId::new();
        let swap_collector = AccountId::new();
        let redemption_collector = AccountId::new();
        let mut config = AurumConfig::dummy(swap_collector, redemption_collector);
        config.redemption.gold_price = Decimal::new(655, 1);
        config.units.audit_capacity = 1 << 16;
        let engine = Deployment::from_config(admin, &config).expect("valid config");

        let mut h = Self {
            admin,
            user: AccountId::new(),
            swap_collector,
            redemption_collector,
            engine,
            stable: StableLedger::new(),
            supply: SupplyConservation::new(),
        };
        h.onboard(h.user, 10_000);
        h
    }

    /// Fund `user` with stable and approve both settlement components.
    fn onboard(&mut self, user: AccountId, stable: Amount) {
        self.stable.mint(user, stable);
        self.stable.approve(user, self.engine.swap.id(), Amount::MAX);
        self.stable
            .approve(user, self.engine.redemption.id(), Amount::MAX);
        self.engine
            .token
            .approve(&user, &self.engine.redemption.id(), Amount::MAX)
            .expect("approve");
    }

    fn check(&mut self) {
        self.engine.check_invariants().expect("invariants");
        self.supply.observe(&self.engine.audit).expect("observe");
        self.supply
            .verify(&self.engine.ledger, &self.engine.token)
            .expect("supply");
    }
}

/// Stable asset that refuses any transfer landing on one account.
struct RejectingStable {
    inner: StableLedger,
    reject_to: AccountId,
}

impl StableAsset for RejectingStable {
    fn balance_of(&self, who: &AccountId) -> Amount {
        self.inner.balance_of(who)
    }

    fn transfer(&mut self, sender: &AccountId, to: &AccountId, amount: Amount) -> bool {
        *to != self.reject_to && self.inner.transfer(sender, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> bool {
        *to != self.reject_to && self.inner.transfer_from(spender, from, to, amount)
    }

    fn savepoint(&mut self) -> Savepoint {
        self.inner.savepoint()
    }

    fn release(&mut self, savepoint: Savepoint) {
        self.inner.release(savepoint);
    }

    fn rollback_to(&mut self, savepoint: Savepoint) {
        self.inner.rollback_to(savepoint);
    }
}

/// Stable asset that calls back into components during every transfer.
struct CallbackStable {
    inner: StableLedger,
    targets: Vec<ReentrancyGuard>,
    attempts: Vec<Result<()>>,
}

impl CallbackStable {
    fn call_back(&mut self) {
        for guard in &self.targets {
            self.attempts.push(guard.enter().map(drop));
        }
    }
}

impl StableAsset for CallbackStable {
    fn balance_of(&self, who: &AccountId) -> Amount {
        self.inner.balance_of(who)
    }

    fn transfer(&mut self, sender: &AccountId, to: &AccountId, amount: Amount) -> bool {
        self.call_back();
        self.inner.transfer(sender, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> bool {
        self.call_back();
        self.inner.transfer_from(spender, from, to, amount)
    }

    fn savepoint(&mut self) -> Savepoint {
        self.inner.savepoint()
    }

    fn release(&mut self, savepoint: Savepoint) {
        self.inner.release(savepoint);
    }

    fn rollback_to(&mut self, savepoint: Savepoint) {
        self.inner.rollback_to(savepoint);
    }
}

// =========================================================================
// Test 1: Swap into backed tokens (fee split, reserve claim)
// =========================================================================

#[test]
fn swap_to_backed_splits_fee_and_claims_reserve() {
    let mut h = Harness::new();
    let user = h.user;

    let out = h
        .engine
        .swap_to_backed(&user, 100, &mut h.stable)
        .expect("swap");

    assert_eq!(out.split.fee, 2);
    assert_eq!(out.split.net, 98);
    assert_eq!(h.stable.balance_of(&user), 9_900);
    assert_eq!(h.engine.token.balance_of(&user), 98);
    assert_eq!(h.stable.balance_of(&h.swap_collector), 2);
    assert_eq!(h.engine.ledger.reserve_used(), 98);
    assert_eq!(h.engine.ledger.available(), 902);
    h.check();

    let record = h.engine.audit.last().expect("audit record");
    assert_eq!(record.seq, out.audit_seq);
    assert_eq!(record.component, Component::SwapEngine);
    assert_eq!(
        record.event,
        AuditEvent::SwappedToBacked {
            caller: user,
            amount: 100,
            net: 98,
            fee: 2
        }
    );
}

// =========================================================================
// Test 2: Oversized swap is rejected without side effects
// =========================================================================

#[test]
fn oversized_swap_leaves_state_unchanged() {
    let mut h = Harness::new();
    let user = h.user;
    h.engine
        .swap_to_backed(&user, 100, &mut h.stable)
        .expect("swap");
    let audit_len = h.engine.audit.len();

    let err = h
        .engine
        .swap_to_backed(&user, 2000, &mut h.stable)
        .unwrap_err();

    assert_eq!(
        err,
        AurumError::CapacityExceeded {
            requested: 2000,
            available: 902
        }
    );
    assert_eq!(h.stable.balance_of(&user), 9_900);
    assert_eq!(h.engine.token.balance_of(&user), 98);
    assert_eq!(h.engine.ledger.reserve_used(), 98);
    assert_eq!(h.engine.audit.len(), audit_len);
    h.check();
}

// =========================================================================
// Test 3: Request then cancel (escrow returned, fee kept)
// =========================================================================

#[test]
fn cancel_returns_escrow_and_keeps_fee() {
    let mut h = Harness::new();
    let user = h.user;
    h.engine
        .swap_to_backed(&user, 100, &mut h.stable)
        .expect("swap");
    let stable_before = h.stable.balance_of(&user);

    // fee = floor(10 * 65.5 * 100 / 10_000) = 6
    let id = h
        .engine
        .request_redeem(&user, 10, &mut h.stable)
        .expect("request");
    assert_eq!(h.engine.token.balance_of(&user), 88);
    assert_eq!(h.engine.redemption.escrowed_total(), 10);
    assert_eq!(h.stable.balance_of(&h.redemption_collector), 6);
    assert_eq!(h.stable.balance_of(&user), stable_before - 6);
    h.check();

    h.engine.cancel_redeem(&user, id).expect("cancel");
    assert_eq!(h.engine.token.balance_of(&user), 98);
    assert_eq!(h.stable.balance_of(&h.redemption_collector), 6);
    let request = h.engine.redemption.request(id).expect("stored");
    assert_eq!(request.status, RedemptionStatus::Canceled);
    assert_eq!(request.amount, 0);
    assert_eq!(request.fee, 6);
    h.check();

    let err = h.engine.cancel_redeem(&user, id).unwrap_err();
    assert!(matches!(err, AurumError::InvalidState { .. }));
    let admin = h.admin;
    let err = h.engine.approve_redeem(&admin, id).unwrap_err();
    assert!(matches!(err, AurumError::InvalidState { .. }));
    h.check();
}

// =========================================================================
// Test 4: Request then approve (escrow burned, reserve released)
// =========================================================================

#[test]
fn approve_burns_escrow_and_releases_reserve() {
    let mut h = Harness::new();
    let user = h.user;
    let admin = h.admin;
    h.engine
        .swap_to_backed(&user, 100, &mut h.stable)
        .expect("swap");
    let canceled = h
        .engine
        .request_redeem(&user, 10, &mut h.stable)
        .expect("request");
    h.engine.cancel_redeem(&user, canceled).expect("cancel");

    let id = h
        .engine
        .request_redeem(&user, 10, &mut h.stable)
        .expect("request");
    assert_eq!(id, canceled.next());
    h.engine.approve_redeem(&admin, id).expect("approve");

    assert_eq!(h.engine.ledger.reserve_used(), 88);
    assert_eq!(h.engine.token.total_supply(), 88);
    assert_eq!(h.engine.token.balance_of(&user), 88);
    assert_eq!(h.engine.redemption.escrowed_total(), 0);
    assert_eq!(
        h.engine.redemption.request(id).map(|r| r.status),
        Some(RedemptionStatus::Approved)
    );
    assert_eq!(h.engine.redemption.requests_of(&user), &[canceled, id]);
    h.check();

    let err = h.engine.approve_redeem(&admin, id).unwrap_err();
    assert!(matches!(err, AurumError::InvalidState { .. }));
    let err = h.engine.cancel_redeem(&user, id).unwrap_err();
    assert!(matches!(err, AurumError::InvalidState { .. }));
    assert_eq!(h.engine.ledger.reserve_used(), 88);
}

// =========================================================================
// Test 5: Round trip loses exactly the two floor-rounded fees
// =========================================================================

#[test]
fn round_trip_loses_exactly_both_fees() {
    let mut h = Harness::new();
    let user = h.user;
    let start = h.stable.balance_of(&user);

    let into = h
        .engine
        .swap_to_backed(&user, 333, &mut h.stable)
        .expect("swap in");
    let out = h
        .engine
        .swap_to_stable(&user, into.split.net, &mut h.stable)
        .expect("swap out");

    let end = h.stable.balance_of(&user);
    assert!(end < start);
    assert_eq!(start - end, into.split.fee + out.split.fee);
    assert_eq!(
        h.stable.balance_of(&h.swap_collector),
        into.split.fee + out.split.fee
    );
    assert_eq!(h.engine.token.total_supply(), 0);
    assert_eq!(h.engine.ledger.reserve_used(), 0);
    h.check();
}

// =========================================================================
// Test 6: Non-admin calls always fail and never mutate
// =========================================================================

#[test]
fn unauthorized_admin_calls_never_mutate() {
    let mut h = Harness::new();
    let user = h.user;
    let audit_len = h.engine.audit.len();

    for _ in 0..5 {
        let results = [
            h.engine.ledger.set_total_reserve(&user, 5),
            h.engine.swap.update_fee_percent(&user, 0),
            h.engine.swap.update_fee_collector(&user, user),
            h.engine.redemption.set_gold_price(&user, 1),
            h.engine.redemption.set_min_redeem(&user, 0),
            h.engine.redemption.set_fee_bps(&user, 0),
            h.engine.token.pause(&user),
            h.engine.token.grant_role(&user, Role::Issuer, user),
        ];
        for result in results {
            assert!(
                matches!(result, Err(AurumError::Unauthorized { .. })),
                "Got: {result:?}"
            );
        }
        let id = RequestId(1);
        assert!(h.engine.approve_redeem(&user, id).is_err());
    }

    assert_eq!(h.engine.ledger.total_reserve(), 1000);
    assert_eq!(h.engine.swap.fee_bps(), 200);
    assert_eq!(h.engine.swap.fee_collector(), h.swap_collector);
    assert!(!h.engine.token.is_paused());
    assert!(!h.engine.token.has_role(&user, Role::Issuer));
    assert_eq!(h.engine.audit.len(), audit_len);
}

// =========================================================================
// Test 7: Reserve cannot be attested below usage
// =========================================================================

#[test]
fn reserve_cannot_drop_below_usage() {
    let mut h = Harness::new();
    let user = h.user;
    let admin = h.admin;
    h.engine
        .swap_to_backed(&user, 500, &mut h.stable)
        .expect("swap");

    let err = h.engine.ledger.set_total_reserve(&admin, 489).unwrap_err();
    assert!(matches!(err, AurumError::InvariantViolation { .. }));
    h.engine
        .ledger
        .set_total_reserve(&admin, 490)
        .expect("exactly used");
    assert_eq!(h.engine.ledger.available(), 0);

    let err = h
        .engine
        .swap_to_backed(&user, 1, &mut h.stable)
        .unwrap_err();
    assert!(matches!(err, AurumError::CapacityExceeded { .. }));
    h.check();
}

// =========================================================================
// Test 8: Refused fee leg rolls back every leg
// =========================================================================

#[test]
fn refused_fee_leg_leaves_no_trace() {
    init_tracing();
    let admin = AccountId::new();
    let swap_collector = AccountId::new();
    let redemption_collector = AccountId::new();
    let config = AurumConfig::dummy(swap_collector, redemption_collector);
    let mut engine = Deployment::from_config(admin, &config).expect("config");
    let user = AccountId::new();

    let mut stable = RejectingStable {
        inner: StableLedger::new(),
        reject_to: swap_collector,
    };
    stable.inner.mint(user, 1_000);
    stable.inner.approve(user, engine.swap.id(), Amount::MAX);
    let audit_len = engine.audit.len();

    let err = engine.swap_to_backed(&user, 100, &mut stable).unwrap_err();
    assert!(matches!(err, AurumError::ExternalTransferFailed { .. }));
    assert_eq!(stable.balance_of(&user), 1_000);
    assert_eq!(stable.balance_of(&engine.swap.id()), 0);
    assert_eq!(stable.inner.allowance(&user, &engine.swap.id()), Amount::MAX);
    assert_eq!(engine.token.balance_of(&user), 0);
    assert_eq!(engine.ledger.reserve_used(), 0);
    assert_eq!(engine.audit.len(), audit_len);

    // Same story for the redemption fee leg.
    stable.reject_to = AccountId::new();
    engine.swap_to_backed(&user, 100, &mut stable).expect("swap");
    engine
        .token
        .approve(&user, &engine.redemption.id(), Amount::MAX)
        .expect("approve");
    stable
        .inner
        .approve(user, engine.redemption.id(), Amount::MAX);
    stable.reject_to = redemption_collector;
    engine
        .redemption
        .set_gold_price(&admin, 100 * constants::PRICE_SCALE)
        .expect("price");
    let audit_len = engine.audit.len();

    let err = engine.request_redeem(&user, 10, &mut stable).unwrap_err();
    assert!(matches!(err, AurumError::ExternalTransferFailed { .. }));
    assert_eq!(engine.token.balance_of(&user), 98);
    assert_eq!(engine.redemption.escrowed_total(), 0);
    assert!(engine.redemption.requests_of(&user).is_empty());
    assert_eq!(engine.audit.len(), audit_len);
    engine.check_invariants().expect("invariants");
}

// =========================================================================
// Test 9: Callbacks during stable transfers cannot re-enter
// =========================================================================

#[test]
fn callbacks_cannot_reenter() {
    init_tracing();
    let admin = AccountId::new();
    let config = AurumConfig::dummy(AccountId::new(), AccountId::new());
    let mut engine = Deployment::from_config(admin, &config).expect("config");
    let user = AccountId::new();

    let swap_guard = engine.swap.guard();
    let mut stable = CallbackStable {
        inner: StableLedger::new(),
        targets: vec![swap_guard.clone()],
        attempts: Vec::new(),
    };
    stable.inner.mint(user, 1_000);
    stable.inner.approve(user, engine.swap.id(), Amount::MAX);

    engine.swap_to_backed(&user, 100, &mut stable).expect("swap");
    assert!(!stable.attempts.is_empty());
    for attempt in &stable.attempts {
        assert!(matches!(attempt, Err(AurumError::InvalidState { .. })));
    }
    assert!(!swap_guard.is_entered());

    // A failing operation releases the guard too.
    stable.attempts.clear();
    assert!(engine.swap_to_backed(&user, 5_000, &mut stable).is_err());
    assert!(!swap_guard.is_entered());
    engine.swap_to_backed(&user, 10, &mut stable).expect("swap");

    // Redemption fee leg: the workflow guard is held during the callback.
    let redemption_guard = engine.redemption.guard();
    stable.targets = vec![redemption_guard.clone()];
    stable.attempts.clear();
    engine
        .redemption
        .set_gold_price(&admin, 50 * constants::PRICE_SCALE)
        .expect("price");
    engine
        .token
        .approve(&user, &engine.redemption.id(), Amount::MAX)
        .expect("approve");
    stable
        .inner
        .approve(user, engine.redemption.id(), Amount::MAX);
    engine.request_redeem(&user, 10, &mut stable).expect("request");
    assert_eq!(stable.attempts.len(), 1);
    assert!(matches!(
        stable.attempts[0],
        Err(AurumError::InvalidState { .. })
    ));
    assert!(!redemption_guard.is_entered());
    engine.check_invariants().expect("invariants");
}

// =========================================================================
// Test 10: Paused token blocks swaps and redemptions
// =========================================================================

#[test]
fn pause_blocks_token_paths() {
    let mut h = Harness::new();
    let user = h.user;
    let admin = h.admin;
    h.engine
        .swap_to_backed(&user, 200, &mut h.stable)
        .expect("swap");
    let id = h
        .engine
        .request_redeem(&user, 10, &mut h.stable)
        .expect("request");
    let to_cancel = h
        .engine
        .request_redeem(&user, 15, &mut h.stable)
        .expect("request");
    let stable_before = h.stable.balance_of(&user);
    let tokens_before = h.engine.token.balance_of(&user);

    h.engine.token.pause(&admin).expect("pause");
    let audit_len = h.engine.audit.len();
    assert_eq!(
        h.engine.swap_to_backed(&user, 10, &mut h.stable).unwrap_err(),
        AurumError::Paused
    );
    assert_eq!(
        h.engine.swap_to_stable(&user, 10, &mut h.stable).unwrap_err(),
        AurumError::Paused
    );
    assert_eq!(
        h.engine.request_redeem(&user, 10, &mut h.stable).unwrap_err(),
        AurumError::Paused
    );
    assert_eq!(
        h.engine.approve_redeem(&admin, id).unwrap_err(),
        AurumError::Paused
    );

    // Cancel cannot return the escrow while paused; the request stays open.
    assert_eq!(
        h.engine.cancel_redeem(&user, to_cancel).unwrap_err(),
        AurumError::Paused
    );
    let request = h.engine.redemption.request(to_cancel).expect("request");
    assert_eq!(request.status, RedemptionStatus::Pending);
    assert_eq!(request.amount, 15);
    assert_eq!(h.engine.redemption.escrowed_total(), 25);
    assert_eq!(h.engine.token.balance_of(&h.engine.redemption.id()), 25);
    assert_eq!(h.engine.token.balance_of(&user), tokens_before);
    assert_eq!(h.stable.balance_of(&user), stable_before);
    assert_eq!(h.engine.audit.len(), audit_len);
    h.engine.check_invariants().expect("invariants while paused");

    let err = h.engine.token.pause(&admin).unwrap_err();
    assert!(matches!(err, AurumError::InvalidState { .. }));

    h.engine.token.unpause(&admin).expect("unpause");
    h.engine.approve_redeem(&admin, id).expect("approve");
    h.engine.cancel_redeem(&user, to_cancel).expect("cancel");
    assert_eq!(
        h.engine.redemption.request(to_cancel).map(|r| r.status),
        Some(RedemptionStatus::Canceled)
    );
    assert_eq!(h.engine.token.balance_of(&user), tokens_before + 15);
    assert_eq!(h.engine.redemption.escrowed_total(), 0);
    h.check();
}

// =========================================================================
// Test 11: Configuration from JSON drives the whole deployment
// =========================================================================

#[test]
fn json_config_drives_deployment() {
    init_tracing();
    let admin = AccountId::new();
    let collector = AccountId::new();
    let json = serde_json::json!({
        "units": { "token_decimals": 2 },
        "reserve": { "total_reserve_grams": "50" },
        "swap": { "fee_bps": 100, "fee_collector": collector },
        "redemption": {
            "min_redeem_grams": "0.5",
            "gold_price": "0.8",
            "fee_bps": 250,
            "fee_collector": collector
        }
    })
    .to_string();
    let config = AurumConfig::from_json_str(&json).expect("parse");
    let mut engine = Deployment::from_config(admin, &config).expect("deploy");
    assert_eq!(engine.ledger.total_reserve(), 5_000);
    assert_eq!(engine.redemption.min_redeem(), 50);

    let user = AccountId::new();
    let mut stable = StableLedger::new();
    stable.mint(user, 10_000);
    stable.approve(user, engine.swap.id(), Amount::MAX);
    let err = engine.swap_to_backed(&user, 5_001, &mut stable).unwrap_err();
    assert!(matches!(err, AurumError::CapacityExceeded { .. }));
    engine.swap_to_backed(&user, 5_000, &mut stable).expect("swap");
    assert_eq!(engine.token.balance_of(&user), 4_950);

    // floor(100 * 0.8 * 250 / 10_000) = 2
    assert_eq!(engine.redemption.fee_quote(100).expect("quote"), 2);
}

// =========================================================================
// Test 12: Randomized operation sequence preserves every invariant
// =========================================================================

#[test]
fn randomized_sequence_preserves_invariants() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut h = Harness::new();
    let users: Vec<AccountId> = (0..4).map(|_| AccountId::new()).collect();
    for user in &users {
        h.onboard(*user, 50_000);
    }
    let admin = h.admin;
    let mut rng = StdRng::seed_from_u64(0xA0_2024);
    let mut pending: Vec<(AccountId, RequestId)> = Vec::new();

    for _ in 0..400 {
        let user = users[rng.gen_range(0..users.len())];
        let amount: Amount = rng.gen_range(1..=120);
        // Rejections are expected; only the invariants matter.
        match rng.gen_range(0..6) {
            0 | 1 => {
                let _ = h.engine.swap_to_backed(&user, amount, &mut h.stable);
            }
            2 => {
                let _ = h.engine.swap_to_stable(&user, amount, &mut h.stable);
            }
            3 => {
                if let Ok(id) = h.engine.request_redeem(&user, amount, &mut h.stable) {
                    pending.push((user, id));
                }
            }
            4 if !pending.is_empty() => {
                let (owner, id) = pending.swap_remove(rng.gen_range(0..pending.len()));
                if rng.gen_bool(0.5) {
                    h.engine.approve_redeem(&admin, id).expect("approve pending");
                } else {
                    h.engine.cancel_redeem(&owner, id).expect("cancel pending");
                }
            }
            _ => {
                let used = h.engine.ledger.reserve_used();
                let total = used + rng.gen_range(0..1_500);
                h.engine
                    .ledger
                    .set_total_reserve(&admin, total)
                    .expect("attest above usage");
            }
        }
        h.check();
    }

    let collected =
        h.stable.balance_of(&h.swap_collector) + h.stable.balance_of(&h.redemption_collector);
    let custody = h.stable.balance_of(&h.engine.swap.id());
    let held: Amount = users
        .iter()
        .chain(std::iter::once(&h.user))
        .map(|u| h.stable.balance_of(u))
        .sum();
    assert_eq!(held + collected + custody, h.stable.total_supply());
}

// =========================================================================
// Test 13: Refused payout or fee leg of a swap back to stable rolls back
// =========================================================================

#[test]
fn swap_to_stable_failed_leg_rolls_back() {
    let mut h = Harness::new();
    let user = h.user;
    h.engine
        .swap_to_backed(&user, 100, &mut h.stable)
        .expect("swap");
    assert_eq!(h.engine.token.balance_of(&user), 98);

    let snapshot = |h: &Harness| {
        (
            h.engine.token.balance_of(&user),
            h.engine.token.total_supply(),
            h.engine.ledger.reserve_used(),
            h.stable.balance_of(&h.engine.swap.id()),
            h.stable.balance_of(&user),
            h.stable.balance_of(&h.swap_collector),
            h.engine.audit.len(),
        )
    };
    let before = snapshot(&h);
    assert_eq!(before.2, 98);
    assert_eq!(before.3, 98);

    // Payout leg: the caller cannot receive stable.
    h.stable.freeze_account(user);
    let err = h
        .engine
        .swap_to_stable(&user, 50, &mut h.stable)
        .unwrap_err();
    assert!(matches!(err, AurumError::ExternalTransferFailed { .. }), "Got: {err}");
    assert_eq!(snapshot(&h), before);
    h.stable.unfreeze_account(&user);
    h.check();

    // Fee leg: the payout has already moved when the collector refuses.
    let collector = h.swap_collector;
    h.stable.freeze_account(collector);
    let err = h
        .engine
        .swap_to_stable(&user, 50, &mut h.stable)
        .unwrap_err();
    assert!(matches!(err, AurumError::ExternalTransferFailed { .. }), "Got: {err}");
    assert_eq!(snapshot(&h), before);
    h.stable.unfreeze_account(&collector);
    h.check();

    // Both legs succeed once nothing is frozen.
    let outcome = h
        .engine
        .swap_to_stable(&user, 50, &mut h.stable)
        .expect("swap back");
    assert_eq!(outcome.split.fee, 1);
    assert_eq!(h.engine.token.balance_of(&user), 48);
    assert_eq!(h.engine.ledger.reserve_used(), 48);
    h.check();
}
