//! The stable settlement asset, as seen by the core.
//!
//! The stable asset is an external fungible token. The core only needs
//! balances and the two transfer calls; a `false` return is a hard failure
//! of the enclosing operation. Because the core's operations must be
//! all-or-nothing across both ledgers, the asset also takes part in the
//! caller's unit of work through savepoints: transfers made after
//! [`StableAsset::savepoint`] are undone by [`StableAsset::rollback_to`]
//! and made permanent by [`StableAsset::release`].
//!
//! [`StableLedger`] is the in-memory reference implementation, with the
//! freeze/pause/no-self-transfer rules of the compliance token.

use std::collections::{HashMap, HashSet};

use crate::{AccountId, Amount};

/// Marker returned by [`StableAsset::savepoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Savepoint {
    depth: usize,
    mark: usize,
}

/// Interface of the stable settlement asset consumed by the core.
pub trait StableAsset {
    /// Balance held by `who`.
    fn balance_of(&self, who: &AccountId) -> Amount;

    /// Move `amount` from `sender` to `to`.
    fn transfer(&mut self, sender: &AccountId, to: &AccountId, amount: Amount) -> bool;

    /// Move `amount` from `from` to `to` against `spender`'s allowance.
    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> bool;

    /// Open a savepoint covering every following transfer.
    fn savepoint(&mut self) -> Savepoint;

    /// Commit everything since `savepoint`.
    fn release(&mut self, savepoint: Savepoint);

    /// Undo everything since `savepoint`.
    fn rollback_to(&mut self, savepoint: Savepoint);
}

#[derive(Debug, Clone)]
enum JournalEntry {
    Balance {
        account: AccountId,
        previous: Amount,
    },
    Allowance {
        owner: AccountId,
        spender: AccountId,
        previous: Amount,
    },
}

/// In-memory stable-asset ledger.
#[derive(Debug, Default)]
pub struct StableLedger {
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<(AccountId, AccountId), Amount>,
    frozen: HashSet<AccountId>,
    paused: bool,
    journal: Vec<JournalEntry>,
    /// Journal marks of open savepoints, innermost last.
    open: Vec<usize>,
}

impl StableLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` out of thin air (issuance of the external asset).
    pub fn mint(&mut self, to: AccountId, amount: Amount) {
        let current = self.balance_of(&to);
        self.set_balance(to, current.saturating_add(amount));
    }

    /// Set the allowance `spender` may pull from `owner`.
    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: Amount) {
        let previous = self.allowance(&owner, &spender);
        if !self.open.is_empty() {
            self.journal.push(JournalEntry::Allowance {
                owner,
                spender,
                previous,
            });
        }
        self.allowances.insert((owner, spender), amount);
    }

    #[must_use]
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Block all transfers to and from `account`.
    pub fn freeze_account(&mut self, account: AccountId) {
        self.frozen.insert(account);
    }

    pub fn unfreeze_account(&mut self, account: &AccountId) {
        self.frozen.remove(account);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Sum of all balances.
    #[must_use]
    pub fn total_supply(&self) -> Amount {
        self.balances.values().sum()
    }

    fn set_balance(&mut self, account: AccountId, amount: Amount) {
        let previous = self.balance_of(&account);
        if !self.open.is_empty() {
            self.journal.push(JournalEntry::Balance { account, previous });
        }
        self.balances.insert(account, amount);
    }

    fn move_funds(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> bool {
        if self.paused
            || from == to
            || to.is_null()
            || self.frozen.contains(from)
            || self.frozen.contains(to)
        {
            return false;
        }
        let from_balance = self.balance_of(from);
        let Some(to_balance) = self.balance_of(to).checked_add(amount) else {
            return false;
        };
        if from_balance < amount {
            return false;
        }
        self.set_balance(*from, from_balance - amount);
        self.set_balance(*to, to_balance);
        true
    }
}

impl StableAsset for StableLedger {
    fn balance_of(&self, who: &AccountId) -> Amount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    fn transfer(&mut self, sender: &AccountId, to: &AccountId, amount: Amount) -> bool {
        self.move_funds(sender, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> bool {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return false;
        }
        if !self.move_funds(from, to, amount) {
            return false;
        }
        self.approve(*from, *spender, allowed - amount);
        true
    }

    fn savepoint(&mut self) -> Savepoint {
        let savepoint = Savepoint {
            depth: self.open.len(),
            mark: self.journal.len(),
        };
        self.open.push(savepoint.mark);
        savepoint
    }

    fn release(&mut self, savepoint: Savepoint) {
        self.open.truncate(savepoint.depth);
        if self.open.is_empty() {
            self.journal.clear();
        }
    }

    fn rollback_to(&mut self, savepoint: Savepoint) {
        while self.journal.len() > savepoint.mark {
            match self.journal.pop() {
                Some(JournalEntry::Balance { account, previous }) => {
                    self.balances.insert(account, previous);
                }
                Some(JournalEntry::Allowance {
                    owner,
                    spender,
                    previous,
                }) => {
                    self.allowances.insert((owner, spender), previous);
                }
                None => break,
            }
        }
        self.release(savepoint);
    }
}
