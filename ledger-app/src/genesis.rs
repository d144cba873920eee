//! Genesis account injection

use ledger_core::{Account, Address, Coins, PubKey, TxError, TxResult};
use serde::Deserialize;

/// JSON account descriptor accepted through `set_option("base/account", ..)`
/// before the first block.
///
/// The address is derived from the embedded public key and the balance
/// is normalized into canonical denomination order.
#[derive(Debug, Clone, Deserialize)]
pub struct GenesisAccount {
    /// Hex-encoded ed25519 public key.
    pub pub_key: String,
    pub balance: Coins,
}

impl GenesisAccount {
    pub fn from_json(value: &str) -> TxResult<Self> {
        serde_json::from_str(value)
            .map_err(|e| TxError::Encoding(format!("invalid genesis account: {e}")))
    }

    /// Derive the address and build the bootstrap account.
    pub fn into_account(self) -> TxResult<(Address, Account)> {
        let key_bytes = hex::decode(&self.pub_key)
            .map_err(|e| TxError::Encoding(format!("invalid public key hex: {e}")))?;
        let pub_key = PubKey::from_slice(&key_bytes)?;

        let mut balance = self.balance;
        balance.sort();
        if !balance.is_valid() {
            return Err(TxError::InvalidInput(format!(
                "invalid genesis balance {balance}"
            )));
        }

        let address = pub_key.address();
        let account = Account {
            pub_key: Some(pub_key),
            sequence: 0,
            balance,
        };
        Ok((address, account))
    }
}
