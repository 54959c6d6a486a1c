//! # aurum-reserve
//!
//! **Reserve Plane**: attested reserve accounting and the reserve-gated
//! backed token.
//!
//! ## Architecture
//!
//! 1. **ReserveLedger**: total attested reserve and the share backing tokens
//! 2. **BackedToken**: balances; mint/burn atomically adjust the ledger
//! 3. **SupplyConservation**: replays the audit trail and cross-checks both
//!
//! ## Issuance Flow
//!
//! ```text
//! Issuer → BackedToken.mint() → ReserveLedger.add_reserve_used() → credit
//! Issuer → BackedToken.burn_from_escrow() → ReserveLedger.reduce_reserve_used() → debit
//! ```
//!
//! The token's component identity must hold `Issuer` on the ledger; callers
//! of the token must hold `Issuer` on the token.

pub mod backed_token;
pub mod reserve_ledger;
pub mod supply_conservation;

pub use backed_token::BackedToken;
pub use reserve_ledger::ReserveLedger;
pub use supply_conservation::{SupplyConservation, check_backing};
