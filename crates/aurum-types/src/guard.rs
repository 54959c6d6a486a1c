//! Per-component reentrancy guard.
//!
//! A component acquires its guard at the top of every mutating operation
//! and holds the returned [`Entered`] token until the operation returns.
//! Dropping the token releases the guard on every exit path, including `?`
//! early returns. A nested acquisition while the flag is held fails with
//! `InvalidState`.
//!
//! Cloning the guard shares the flag. Counterparties that may call back into
//! a component (e.g. a callback-capable asset) are handed a clone.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{AurumError, Result};

/// In-progress flag scoped to one component instance.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    entered: Arc<AtomicBool>,
}

impl ReentrancyGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the guard for the duration of an operation.
    pub fn enter(&self) -> Result<Entered> {
        if self
            .entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Reentrant call rejected");
            return Err(AurumError::invalid_state("reentrant call"));
        }
        Ok(Entered {
            entered: Arc::clone(&self.entered),
        })
    }

    /// Whether an operation currently holds the guard.
    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Proof of guard ownership; releases the guard on drop.
#[derive(Debug)]
#[must_use = "the guard is released as soon as this token is dropped"]
pub struct Entered {
    entered: Arc<AtomicBool>,
}

impl Drop for Entered {
    fn drop(&mut self) {
        self.entered.store(false, Ordering::Release);
    }
}
