//! Supply conservation invariant checker.
//!
//! Mathematical invariants enforced after every operation:
//! ```text
//! reserve_used <= total_reserve
//! Σ(balances) == total_supply == reserve_used == Σ(minted) - Σ(burned)
//! ```
//!
//! The minted/burned totals are replayed independently from the audit
//! trail, so a mismatch means either the token, the ledger, or the trail
//! disagrees with the others. If this ever fails, issuance must halt.

use aurum_types::{Amount, AuditEvent, AuditLog, AurumError, Component, Result};

use crate::{BackedToken, ReserveLedger};

/// Replays mint/burn audit records and cross-checks them against the
/// token and the ledger.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    /// Total minted since genesis, per the audit trail.
    minted: Amount,
    /// Total burned since genesis, per the audit trail.
    burned: Amount,
    /// Next audit sequence number to replay.
    next_seq: u64,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay every audit record not seen yet.
    ///
    /// # Errors
    /// `InvariantViolation` if records were evicted before being replayed.
    pub fn observe(&mut self, log: &AuditLog) -> Result<()> {
        for record in log.records() {
            if record.seq < self.next_seq {
                continue;
            }
            if record.seq != self.next_seq {
                return Err(AurumError::InvariantViolation {
                    reason: format!(
                        "audit gap: expected seq {}, found {}",
                        self.next_seq, record.seq
                    ),
                });
            }
            if record.component == Component::BackedToken {
                match record.event {
                    AuditEvent::Minted { amount, .. } => self.minted += amount,
                    AuditEvent::Burned { amount, .. } => self.burned += amount,
                    _ => {}
                }
            }
            self.next_seq += 1;
        }
        Ok(())
    }

    /// Expected circulating supply: minted - burned.
    #[must_use]
    pub fn expected_supply(&self) -> Amount {
        self.minted - self.burned
    }

    #[must_use]
    pub fn total_minted(&self) -> Amount {
        self.minted
    }

    #[must_use]
    pub fn total_burned(&self) -> Amount {
        self.burned
    }

    /// Verify backing and the replayed supply.
    ///
    /// # Errors
    /// Returns [`AurumError::InvariantViolation`] on any mismatch.
    pub fn verify(&self, ledger: &ReserveLedger, token: &BackedToken) -> Result<()> {
        check_backing(ledger, token)?;
        let expected = self.expected_supply();
        if token.total_supply() != expected {
            return Err(AurumError::InvariantViolation {
                reason: format!(
                    "supply {} != audited {expected} (minted={}, burned={})",
                    token.total_supply(),
                    self.minted,
                    self.burned
                ),
            });
        }
        Ok(())
    }
}

/// Verify `reserve_used <= total_reserve` and
/// `Σ balances == total_supply == reserve_used`.
pub fn check_backing(ledger: &ReserveLedger, token: &BackedToken) -> Result<()> {
    if ledger.reserve_used() > ledger.total_reserve() {
        return Err(AurumError::InvariantViolation {
            reason: format!(
                "reserve used {} exceeds total {}",
                ledger.reserve_used(),
                ledger.total_reserve()
            ),
        });
    }
    let balances = token.sum_of_balances();
    if balances != token.total_supply() || balances != ledger.reserve_used() {
        return Err(AurumError::InvariantViolation {
            reason: format!(
                "balances {balances}, supply {}, reserve used {}",
                token.total_supply(),
                ledger.reserve_used()
            ),
        });
    }
    Ok(())
}
