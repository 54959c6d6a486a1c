//! All-or-nothing execution across the stable asset and the core.
//!
//! ```text
//! savepoint → external transfers → internal mutation → release
//!                      └──────── any error ──────────→ rollback_to
//! ```
//!
//! The internal mutation must be the last fallible step so that a failure
//! only ever has stable-asset transfers to undo.

use aurum_types::{AccountId, Amount, AurumError, Result, StableAsset};

/// Run `body` inside a stable-asset savepoint.
pub(crate) fn atomically<S, T, F>(stable: &mut S, op: &'static str, body: F) -> Result<T>
where
    S: StableAsset + ?Sized,
    F: FnOnce(&mut S) -> Result<T>,
{
    let savepoint = stable.savepoint();
    match body(stable) {
        Ok(value) => {
            stable.release(savepoint);
            Ok(value)
        }
        Err(err) => {
            stable.rollback_to(savepoint);
            tracing::warn!(op, error = %err, "Rolled back");
            Err(err)
        }
    }
}

/// `transfer` that maps a `false` return to `ExternalTransferFailed`.
pub(crate) fn push<S: StableAsset + ?Sized>(
    stable: &mut S,
    sender: &AccountId,
    to: &AccountId,
    amount: Amount,
    leg: &str,
) -> Result<()> {
    if stable.transfer(sender, to, amount) {
        tracing::debug!(leg, from = %sender, to = %to, amount, "Stable transfer");
        Ok(())
    } else {
        Err(AurumError::transfer_failed(format!(
            "{leg}: transfer of {amount} from {sender} to {to} refused"
        )))
    }
}

/// `transfer_from` that maps a `false` return to `ExternalTransferFailed`.
pub(crate) fn pull<S: StableAsset + ?Sized>(
    stable: &mut S,
    spender: &AccountId,
    from: &AccountId,
    to: &AccountId,
    amount: Amount,
    leg: &str,
) -> Result<()> {
    if stable.transfer_from(spender, from, to, amount) {
        tracing::debug!(leg, from = %from, to = %to, amount, "Stable transfer_from");
        Ok(())
    } else {
        Err(AurumError::transfer_failed(format!(
            "{leg}: transfer_from of {amount} from {from} to {to} refused"
        )))
    }
}
