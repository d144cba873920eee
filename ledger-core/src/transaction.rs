//! Transaction kinds, structural validation, sign-bytes, and wire codec

use crate::{Address, Coin, Coins, Hash, PubKey, Signature, TxError, TxResult};

/// Maximum accepted encoded transaction size in bytes.
pub const MAX_TX_SIZE: usize = 10_240;

/// Where a transfer output lands.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub enum Dest {
    /// An account on this chain.
    Local(Address),
    /// An account on another chain, delivered as an outbound packet.
    Chain { chain_id: String, address: Address },
}

/// One spend authorization inside a transaction.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct TxInput {
    pub address: Address,
    pub coins: Coins,
    /// Must equal the account sequence + 1.
    pub sequence: u64,
    pub signature: Option<Signature>,
    /// Required the first time an address is used.
    pub pub_key: Option<PubKey>,
}

impl TxInput {
    pub fn new(address: Address, coins: Coins, sequence: u64) -> Self {
        Self {
            address,
            coins,
            sequence,
            signature: None,
            pub_key: None,
        }
    }

    /// Structural checks; these run before any store access.
    pub fn validate_basic(&self) -> TxResult<()> {
        if !self.coins.is_valid() {
            return Err(TxError::InvalidInput(format!(
                "invalid input coins {}",
                self.coins
            )));
        }
        if self.coins.is_zero() {
            return Err(TxError::InvalidInput("empty input coins".to_string()));
        }
        if self.sequence == 0 {
            return Err(TxError::InvalidInput(
                "sequence must be greater than 0".to_string(),
            ));
        }
        if self.signature.is_none() {
            return Err(TxError::InvalidInput("missing signature".to_string()));
        }
        if self.sequence == 1 && self.pub_key.is_none() {
            return Err(TxError::InvalidInput(
                "public key required on first use".to_string(),
            ));
        }
        if let Some(pub_key) = &self.pub_key {
            if pub_key.address() != self.address {
                return Err(TxError::InvalidInput(format!(
                    "public key does not match address {}",
                    self.address
                )));
            }
        }
        Ok(())
    }
}

/// One credit side of a transfer.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct TxOutput {
    pub dest: Dest,
    pub coins: Coins,
}

impl TxOutput {
    pub fn local(address: Address, coins: Coins) -> Self {
        Self {
            dest: Dest::Local(address),
            coins,
        }
    }

    pub fn chain(chain_id: &str, address: Address, coins: Coins) -> Self {
        Self {
            dest: Dest::Chain {
                chain_id: chain_id.to_string(),
                address,
            },
            coins,
        }
    }

    pub fn validate_basic(&self) -> TxResult<()> {
        if let Dest::Chain { chain_id, .. } = &self.dest {
            if chain_id.is_empty() {
                return Err(TxError::InvalidOutput(
                    "destination chain id is empty".to_string(),
                ));
            }
        }
        if !self.coins.is_valid() {
            return Err(TxError::InvalidOutput(format!(
                "invalid output coins {}",
                self.coins
            )));
        }
        if self.coins.is_zero() {
            return Err(TxError::InvalidOutput("empty output coins".to_string()));
        }
        Ok(())
    }
}

/// A multi-input, multi-output value transfer with an optional flat fee.
///
/// Invariant: sum(inputs) == sum(outputs) + fee.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct SendTx {
    pub fee: Coin,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

/// A single-input call into a named plugin.
///
/// Invariant: input coins >= fee. The remainder is forwarded to the
/// plugin; the fee is consumed whether or not the call succeeds.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct AppTx {
    pub fee: Coin,
    pub name: String,
    pub input: TxInput,
    pub data: Vec<u8>,
}

/// The closed set of transaction kinds; decoding yields a variant or an
/// encoding error, never a partially-populated value.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub enum Tx {
    Send(SendTx),
    App(AppTx),
}

/// The fee as a coin set: the zero coin is no fee, anything malformed
/// is rejected rather than silently treated as zero.
pub fn fee_coins(fee: &Coin) -> TxResult<Coins> {
    if fee.amount < 0 {
        return Err(TxError::InvalidInput(format!("negative fee {fee}")));
    }
    if fee.amount > 0 && fee.denom.is_empty() {
        return Err(TxError::InvalidInput(
            "fee denomination is empty".to_string(),
        ));
    }
    Ok(Coins::from(fee.clone()))
}

// Sign-bytes mirrors: the economically-relevant fields with signatures
// stripped. Kept in lockstep with the public structs.

#[derive(bincode::Encode)]
struct InputForSigning {
    address: Address,
    coins: Coins,
    sequence: u64,
}

impl From<&TxInput> for InputForSigning {
    fn from(input: &TxInput) -> Self {
        Self {
            address: input.address,
            coins: input.coins.clone(),
            sequence: input.sequence,
        }
    }
}

#[derive(bincode::Encode)]
struct SendTxForSigning {
    fee: Coin,
    inputs: Vec<InputForSigning>,
    outputs: Vec<TxOutput>,
}

#[derive(bincode::Encode)]
struct AppTxForSigning {
    fee: Coin,
    name: String,
    input: InputForSigning,
    data: Vec<u8>,
}

fn sign_payload<E: bincode::Encode>(unsigned: &E, chain_id: &str) -> TxResult<Vec<u8>> {
    let mut bytes = bincode::encode_to_vec(unsigned, bincode::config::standard())
        .map_err(|e| TxError::Encoding(format!("sign-bytes encoding failed: {e}")))?;
    bytes.extend_from_slice(chain_id.as_bytes());
    Ok(bytes)
}

impl SendTx {
    /// Canonical signed payload, embedding the chain id.
    pub fn sign_bytes(&self, chain_id: &str) -> TxResult<Vec<u8>> {
        let unsigned = SendTxForSigning {
            fee: self.fee.clone(),
            inputs: self.inputs.iter().map(InputForSigning::from).collect(),
            outputs: self.outputs.clone(),
        };
        sign_payload(&unsigned, chain_id)
    }
}

impl AppTx {
    pub fn sign_bytes(&self, chain_id: &str) -> TxResult<Vec<u8>> {
        let unsigned = AppTxForSigning {
            fee: self.fee.clone(),
            name: self.name.clone(),
            input: InputForSigning::from(&self.input),
            data: self.data.clone(),
        };
        sign_payload(&unsigned, chain_id)
    }
}

impl Tx {
    pub fn encode(&self) -> TxResult<Vec<u8>> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| TxError::Encoding(format!("tx encoding failed: {e}")))
    }

    pub fn decode(bytes: &[u8]) -> TxResult<Tx> {
        let (tx, read) = bincode::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| TxError::Encoding(format!("malformed transaction: {e}")))?;
        if read != bytes.len() {
            return Err(TxError::Encoding(
                "trailing bytes after transaction".to_string(),
            ));
        }
        Ok(tx)
    }

    pub fn sign_bytes(&self, chain_id: &str) -> TxResult<Vec<u8>> {
        match self {
            Tx::Send(send) => send.sign_bytes(chain_id),
            Tx::App(app) => app.sign_bytes(chain_id),
        }
    }

    /// Transaction id: Keccak-256 over the chain id and the encoded tx.
    pub fn id(&self, chain_id: &str) -> TxResult<Hash> {
        let mut bytes = chain_id.as_bytes().to_vec();
        bytes.extend_from_slice(&self.encode()?);
        Ok(Hash::digest(&bytes))
    }
}
