//! Light-client query routing

use ledger_core::{Address, TxError, TxResult};
use ledger_engine::account_key;
use ledger_store::CommitKVStore;

/// Raw query response: the stored value plus the backing engine's
/// proof when it produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub key: Vec<u8>,
    pub value: Option<Vec<u8>>,
    pub proof: Option<Vec<u8>>,
}

/// Resolve a query path against the backing store.
///
/// `"/key"` reads a raw key; `"/account"` is sugar that rewrites to
/// `"/key"` with the account record key for the given address.
pub(crate) fn run_query<S: CommitKVStore>(
    store: &S,
    path: &str,
    data: &[u8],
) -> TxResult<QueryResult> {
    if data.is_empty() {
        return Err(TxError::Encoding("query data cannot be empty".to_string()));
    }
    let key = match path {
        "/key" => data.to_vec(),
        "/account" => {
            if data.len() != 20 {
                return Err(TxError::Encoding(format!(
                    "account query expects a 20-byte address, got {} bytes",
                    data.len()
                )));
            }
            account_key(&Address::from_slice(data))
        }
        _ => {
            return Err(TxError::Encoding(format!("unsupported query path {path}")));
        }
    };
    let (value, proof) = store.get_with_proof(&key);
    Ok(QueryResult { key, value, proof })
}
