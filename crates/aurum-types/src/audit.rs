//! Append-only audit trail.
//!
//! Every committed state change emits an [`AuditRecord`]. Records are
//! sequence-numbered, SHA-256 hash-chained, kept in a bounded in-memory ring
//! buffer, and mirrored to `tracing` so a durable subscriber can persist
//! them. The log is write-only from the components' point of view and is
//! never part of the transactional state.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{AUDIT_DIGEST_DOMAIN, AUDIT_TRACING_TARGET, DEFAULT_AUDIT_CAPACITY};
use crate::{AccountId, Amount, AurumError, RequestId, Result, Role};

/// The component that emitted a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    ReserveLedger,
    BackedToken,
    SwapEngine,
    RedemptionWorkflow,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReserveLedger => write!(f, "RESERVE_LEDGER"),
            Self::BackedToken => write!(f, "BACKED_TOKEN"),
            Self::SwapEngine => write!(f, "SWAP_ENGINE"),
            Self::RedemptionWorkflow => write!(f, "REDEMPTION_WORKFLOW"),
        }
    }
}

/// What happened, with the parameters and resulting key fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEvent {
    // --- access control -------------------------------------------------
    RoleGranted {
        role: Role,
        account: AccountId,
        by: AccountId,
    },
    RoleRevoked {
        role: Role,
        account: AccountId,
        by: AccountId,
    },

    // --- reserve ledger -------------------------------------------------
    TotalReserveSet {
        previous: Amount,
        total_reserve: Amount,
    },
    ReserveUsedAdded {
        amount: Amount,
        reserve_used: Amount,
    },
    ReserveUsedReduced {
        amount: Amount,
        reserve_used: Amount,
    },

    // --- backed token ---------------------------------------------------
    Minted {
        to: AccountId,
        amount: Amount,
    },
    Burned {
        holder: AccountId,
        amount: Amount,
    },
    Transferred {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    Approved {
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    },
    Paused {
        by: AccountId,
    },
    Unpaused {
        by: AccountId,
    },
    EscrowRegistered {
        account: AccountId,
        by: AccountId,
    },

    // --- swap engine ----------------------------------------------------
    SwappedToBacked {
        caller: AccountId,
        amount: Amount,
        net: Amount,
        fee: Amount,
    },
    SwappedToStable {
        caller: AccountId,
        amount: Amount,
        net: Amount,
        fee: Amount,
    },
    FeeCollectorUpdated {
        collector: AccountId,
    },
    FeeUpdated {
        fee_bps: u32,
    },

    // --- redemption workflow --------------------------------------------
    RedeemRequested {
        id: RequestId,
        requester: AccountId,
        amount: Amount,
        fee: Amount,
    },
    RedeemApproved {
        id: RequestId,
        amount: Amount,
    },
    RedeemCanceled {
        id: RequestId,
        requester: AccountId,
        amount: Amount,
    },
    MinRedeemUpdated {
        min_redeem: Amount,
    },
    GoldPriceUpdated {
        gold_price: Amount,
    },
}

/// One immutable entry of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Position in the global order, starting at 0.
    pub seq: u64,
    pub component: Component,
    pub event: AuditEvent,
    pub recorded_at: DateTime<Utc>,
    /// Hex digest of the preceding record (all zeros for the first).
    pub prev_digest: String,
    /// Hex SHA-256 over domain, previous digest, sequence, time and payload.
    pub digest: String,
}

impl AuditRecord {
    fn compute_digest(
        prev_digest: &str,
        seq: u64,
        recorded_at: &DateTime<Utc>,
        component: Component,
        event: &AuditEvent,
    ) -> String {
        let payload = serde_json::to_vec(&(component, event))
            .unwrap_or_else(|_| format!("{component}:{event:?}").into_bytes());
        let mut hasher = Sha256::new();
        hasher.update(AUDIT_DIGEST_DOMAIN);
        hasher.update(prev_digest.as_bytes());
        hasher.update(seq.to_le_bytes());
        hasher.update(recorded_at.timestamp_micros().to_le_bytes());
        hasher.update(&payload);
        hex::encode(hasher.finalize())
    }

    /// Recompute this record's digest from its contents.
    #[must_use]
    pub fn expected_digest(&self) -> String {
        Self::compute_digest(
            &self.prev_digest,
            self.seq,
            &self.recorded_at,
            self.component,
            &self.event,
        )
    }
}

struct AuditInner {
    records: VecDeque<AuditRecord>,
    capacity: usize,
    next_seq: u64,
    head_digest: String,
}

/// Shared handle to the audit ring buffer.
///
/// Cloning the handle shares the underlying buffer, so every component of
/// one deployment writes into a single totally-ordered trail.
#[derive(Clone)]
pub struct AuditLog {
    inner: Arc<Mutex<AuditInner>>,
}

impl AuditLog {
    /// Create a log retaining at most `capacity` records.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "AuditLog capacity must be > 0");
        Self {
            inner: Arc::new(Mutex::new(AuditInner {
                records: VecDeque::with_capacity(capacity.min(1024)),
                capacity,
                next_seq: 0,
                head_digest: hex::encode([0u8; 32]),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AuditInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record and mirror it to `tracing`. Returns its sequence number.
    pub fn emit(&self, component: Component, event: AuditEvent) -> u64 {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        let recorded_at = Utc::now();
        let prev_digest = inner.head_digest.clone();
        let digest =
            AuditRecord::compute_digest(&prev_digest, seq, &recorded_at, component, &event);

        tracing::info!(
            target: AUDIT_TRACING_TARGET,
            seq,
            component = %component,
            event = ?event,
            digest = %digest,
            "audit"
        );

        if inner.records.len() >= inner.capacity {
            inner.records.pop_front();
        }
        inner.records.push_back(AuditRecord {
            seq,
            component,
            event,
            recorded_at,
            prev_digest,
            digest: digest.clone(),
        });
        inner.head_digest = digest;
        inner.next_seq += 1;
        seq
    }

    /// Snapshot of all retained records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.lock().records.iter().cloned().collect()
    }

    /// Retained records emitted by `component`.
    #[must_use]
    pub fn records_for(&self, component: Component) -> Vec<AuditRecord> {
        self.lock()
            .records
            .iter()
            .filter(|r| r.component == component)
            .cloned()
            .collect()
    }

    /// The most recent record.
    #[must_use]
    pub fn last(&self) -> Option<AuditRecord> {
        self.lock().records.back().cloned()
    }

    /// Sequence number the next record will receive.
    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.lock().next_seq
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Verify sequence continuity and the hash chain of retained records.
    pub fn verify_chain(&self) -> Result<()> {
        let inner = self.lock();
        let mut previous: Option<&AuditRecord> = None;
        for record in &inner.records {
            if let Some(prev) = previous {
                if record.seq != prev.seq + 1 || record.prev_digest != prev.digest {
                    return Err(AurumError::InvariantViolation {
                        reason: format!("audit chain broken at seq {}", record.seq),
                    });
                }
            }
            if record.digest != record.expected_digest() {
                return Err(AurumError::InvariantViolation {
                    reason: format!("audit digest mismatch at seq {}", record.seq),
                });
            }
            previous = Some(record);
        }
        Ok(())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("AuditLog")
            .field("retained", &inner.records.len())
            .field("capacity", &inner.capacity)
            .field("next_seq", &inner.next_seq)
            .finish()
    }
}
