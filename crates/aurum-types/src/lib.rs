//! # aurum-types
//!
//! Shared types, errors, and configuration for the **Aurum** gold-backed
//! settlement engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`RequestId`]
//! - **Amounts & fees**: [`Amount`], [`bps_fee`], [`redemption_fee`]
//! - **Roles**: [`Role`], [`RoleStore`]
//! - **Audit trail**: [`AuditLog`], [`AuditRecord`], [`AuditEvent`], [`Component`]
//! - **Reentrancy**: [`ReentrancyGuard`]
//! - **Redemption model**: [`RedemptionRequest`], [`RedemptionStatus`]
//! - **Stable asset**: [`StableAsset`], [`StableLedger`], [`Savepoint`]
//! - **Configuration**: [`AurumConfig`] and its sections
//! - **Errors**: [`AurumError`] with `AU_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod amount;
pub mod audit;
pub mod config;
pub mod constants;
pub mod error;
pub mod guard;
pub mod ids;
pub mod redemption;
pub mod roles;
pub mod stable;

// Re-export all primary types at crate root for ergonomic imports:
//   use aurum_types::{AccountId, Amount, AurumError, Role, ...};

pub use amount::*;
pub use audit::*;
pub use config::*;
pub use error::*;
pub use guard::*;
pub use ids::*;
pub use redemption::*;
pub use roles::*;
pub use stable::*;

// Constants are accessed via `aurum_types::constants::FOO`
// (not re-exported to avoid name collisions).
