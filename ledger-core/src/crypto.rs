//! Signing keys, public keys, and signature verification

use crate::{Address, TxError, TxResult};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Ed25519 public key bytes.
///
/// The account address is derived from the key, so a key can stand in
/// for an identity before the account has ever been seen on chain.
#[derive(Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct PubKey([u8; 32]);

impl PubKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> TxResult<Self> {
        let bytes: [u8; 32] = slice
            .try_into()
            .map_err(|_| TxError::Encoding(format!("public key must be 32 bytes, got {}", slice.len())))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The account address: last 20 bytes of Keccak-256 over the key.
    pub fn address(&self) -> Address {
        let digest = Keccak256::digest(self.0);
        Address::from_slice(&digest[12..32])
    }

    /// Verify `signature` over `msg`. An undecodable key verifies nothing.
    pub fn verify(&self, msg: &[u8], signature: &Signature) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(&signature.0);
        key.verify(msg, &signature).is_ok()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PubKey(0x{})", self.to_hex())
    }
}

/// Detached Ed25519 signature bytes
#[derive(Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Signature([u8; 64]);

impl Signature {
    pub fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(0x{}..)", hex::encode(&self.0[..8]))
    }
}

/// A signing keypair, derived from a 32-byte seed.
///
/// Key generation and custody belong to the external key-management
/// subsystem; this wrapper exists for signing and for deterministic
/// keys in tests.
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(&seed),
        }
    }

    pub fn pub_key(&self) -> PubKey {
        PubKey(self.signing.verifying_key().to_bytes())
    }

    pub fn address(&self) -> Address {
        self.pub_key().address()
    }

    pub fn sign(&self, msg: &[u8]) -> Signature {
        Signature(self.signing.sign(msg).to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_derivation_is_deterministic() {
        let a = Keypair::from_seed([7u8; 32]);
        let b = Keypair::from_seed([7u8; 32]);
        assert_eq!(a.pub_key(), b.pub_key());
        assert_eq!(a.address(), b.address());
        assert_ne!(a.pub_key(), Keypair::from_seed([8u8; 32]).pub_key());
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = Keypair::from_seed([1u8; 32]);
        let signature = keypair.sign(b"payload");
        assert!(keypair.pub_key().verify(b"payload", &signature));
        assert!(!keypair.pub_key().verify(b"tampered", &signature));

        let other = Keypair::from_seed([2u8; 32]);
        assert!(!other.pub_key().verify(b"payload", &signature));
    }

    #[test]
    fn test_pub_key_from_slice() {
        let keypair = Keypair::from_seed([3u8; 32]);
        let restored = PubKey::from_slice(keypair.pub_key().as_bytes()).unwrap();
        assert_eq!(restored.address(), keypair.address());
        assert!(PubKey::from_slice(&[0u8; 5]).is_err());
    }
}
