//! Account model

use crate::{Coins, PubKey, TxResult};

/// A ledger account.
///
/// The public key stays unset until the first signed transaction (or a
/// genesis bootstrap) supplies it. An account with no key, sequence 0,
/// and an empty balance is a valid placeholder for a not-yet-seen
/// recipient. Accounts are never deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Account {
    pub pub_key: Option<PubKey>,
    /// Strictly increasing anti-replay counter.
    pub sequence: u64,
    pub balance: Coins,
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(balance: Coins) -> Self {
        Self {
            pub_key: None,
            sequence: 0,
            balance,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pub_key.is_none() && self.sequence == 0 && self.balance.is_zero()
    }

    pub fn credit(&mut self, coins: &Coins) -> TxResult<()> {
        self.balance = self.balance.plus(coins)?;
        Ok(())
    }

    pub fn debit(&mut self, coins: &Coins) -> TxResult<()> {
        self.balance = self.balance.minus(coins)?;
        Ok(())
    }
}
