//! Identifiers used throughout Aurum.
//!
//! Accounts (users, collectors, and the components themselves) use UUIDv7.
//! The nil UUID is the null identity and is rejected as an argument.
//! Redemption requests use a per-workflow monotonically increasing counter.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AurumError, Result};

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Identity of a user, a fee collector, or a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// The null identity.
    pub const NULL: Self = Self(Uuid::nil());

    #[allow(clippy::new_without_default)]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }

    /// Reject the null identity for the named argument.
    pub fn ensure_not_null(&self, what: &str) -> Result<()> {
        if self.is_null() {
            return Err(AurumError::invalid_argument(format!(
                "{what} must not be the null identity"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RequestId
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier of a redemption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "redeem:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
