//! Outbound inter-chain packet queue
//!
//! The inter-chain plugin owns packet bookkeeping end to end; the
//! engine only appends egress records through this contract when a
//! transfer output names another chain.

use ledger_core::{Address, Coins, TxError, TxResult};
use ledger_store::KVStore;
use tracing::debug;

/// A queued coin transfer to an account on another chain.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct OutgoingPacket {
    pub src_chain: String,
    pub dst_chain: String,
    pub address: Address,
    pub coins: Coins,
    pub sequence: u64,
}

fn egress_seq_key(dst_chain: &str) -> Vec<u8> {
    format!("ibc/egress/{dst_chain}/seq").into_bytes()
}

fn egress_key(dst_chain: &str, sequence: u64) -> Vec<u8> {
    format!("ibc/egress/{dst_chain}/{sequence}").into_bytes()
}

/// Append a packet to the egress queue for `dst_chain`.
pub fn push_outgoing_packet(
    store: &mut dyn KVStore,
    src_chain: &str,
    dst_chain: &str,
    address: Address,
    coins: &Coins,
) -> TxResult<()> {
    let sequence = next_egress_sequence(store, dst_chain)?;
    let packet = OutgoingPacket {
        src_chain: src_chain.to_string(),
        dst_chain: dst_chain.to_string(),
        address,
        coins: coins.clone(),
        sequence,
    };
    let bytes = bincode::encode_to_vec(&packet, bincode::config::standard())
        .map_err(|e| TxError::Internal(format!("packet encoding failed: {e}")))?;
    store.set(&egress_key(dst_chain, sequence), bytes);
    store.set(
        &egress_seq_key(dst_chain),
        (sequence + 1).to_le_bytes().to_vec(),
    );
    debug!(dst_chain, sequence, "queued outgoing packet");
    Ok(())
}

/// Read a queued packet, primarily for relayers and tests.
pub fn get_outgoing_packet(
    store: &dyn KVStore,
    dst_chain: &str,
    sequence: u64,
) -> Option<OutgoingPacket> {
    let bytes = store.get(&egress_key(dst_chain, sequence))?;
    let (packet, _) = bincode::decode_from_slice(&bytes, bincode::config::standard())
        .unwrap_or_else(|e| panic!("corrupt egress packet {dst_chain}/{sequence}: {e}"));
    Some(packet)
}

fn next_egress_sequence(store: &dyn KVStore, dst_chain: &str) -> TxResult<u64> {
    match store.get(&egress_seq_key(dst_chain)) {
        None => Ok(0),
        Some(bytes) => {
            let bytes: [u8; 8] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| TxError::Internal("corrupt egress sequence counter".to_string()))?;
            Ok(u64::from_le_bytes(bytes))
        }
    }
}
