//! # Redemption requests: the physical-delivery state machine
//!
//! A request escrows backed tokens until an administrator approves physical
//! delivery (tokens burned) or the requester cancels (tokens returned).
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  approve (admin)  ┌──────────┐
//!   │ PENDING ├──────────────────▶│ APPROVED │
//!   └────┬────┘                   └──────────┘
//!        │ cancel (requester)
//!        ▼
//!   ┌──────────┐
//!   │ CANCELED │
//!   └──────────┘
//! ```
//!
//! Both terminal states are final. A canceled request keeps its record but
//! its amount is zeroed so it can never be replayed against the escrow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, AurumError, RequestId, Result};

/// Lifecycle state of a redemption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedemptionStatus {
    /// Tokens are escrowed; awaiting approval or cancellation.
    Pending,
    /// Physical delivery approved; escrowed tokens burned. **Irreversible.**
    Approved,
    /// Requester withdrew the request; escrow returned, fee kept.
    Canceled,
}

impl RedemptionStatus {
    /// Can a request in this state move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Pending, Self::Approved | Self::Canceled))
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Canceled => write!(f, "CANCELED"),
        }
    }
}

/// A single redemption request as stored by the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub id: RequestId,
    pub requester: AccountId,
    /// Escrowed backed-token amount. Zeroed on cancellation.
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
    /// Fee paid in stable units at request time. Never refunded.
    pub fee: Amount,
    pub status: RedemptionStatus,
}

impl RedemptionRequest {
    /// A fresh request in `Pending`.
    #[must_use]
    pub fn pending(id: RequestId, requester: AccountId, amount: Amount, fee: Amount) -> Self {
        Self {
            id,
            requester,
            amount,
            created_at: Utc::now(),
            fee,
            status: RedemptionStatus::Pending,
        }
    }

    /// Fail with `InvalidState` unless the request may move to `target`.
    pub fn ensure_transition(&self, target: RedemptionStatus) -> Result<()> {
        if self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(AurumError::invalid_state(format!(
                "cannot transition {} from {} to {target}",
                self.id, self.status
            )))
        }
    }

    /// Pending → Approved.
    pub fn mark_approved(&mut self) -> Result<()> {
        self.ensure_transition(RedemptionStatus::Approved)?;
        self.status = RedemptionStatus::Approved;
        Ok(())
    }

    /// Pending → Canceled. Returns the amount that was escrowed and zeroes it.
    pub fn mark_canceled(&mut self) -> Result<Amount> {
        self.ensure_transition(RedemptionStatus::Canceled)?;
        self.status = RedemptionStatus::Canceled;
        Ok(std::mem::take(&mut self.amount))
    }
}
