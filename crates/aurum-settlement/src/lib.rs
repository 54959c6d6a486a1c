//! # aurum-settlement
//!
//! **Settlement Plane**: conversion between the stable settlement asset and
//! the backed token, and the physical redemption workflow.
//!
//! ## Architecture
//!
//! 1. **SwapEngine**: stable → backed (pull, fee, mint) and back (pay, fee, burn)
//! 2. **RedemptionWorkflow**: escrow tokens, operator approval burns them,
//!    requester cancellation returns them
//! 3. **Deployment**: wires all components onto one audit trail
//!
//! Every operation that touches the stable asset runs inside a savepoint;
//! the token mutation runs last and a failure rolls the stable legs back.

pub mod deployment;
pub mod redemption;
pub mod swap_engine;
mod unit_of_work;

pub use deployment::Deployment;
pub use redemption::RedemptionWorkflow;
pub use swap_engine::{SwapEngine, SwapOutcome};
