use crate::types::Identity;
use sha2::{Digest, Sha256};

/// Derive a wallet-style identity from an Ed25519 public key.
///
/// Formula: "0x" || hex(SHA-256(Ed25519_pubkey)[0:20])
pub fn identity_from_pubkey(pubkey: &[u8; 32]) -> Identity {
    let hash = Sha256::digest(pubkey);
    Identity(format!("0x{}", hex::encode(&hash[..20])))
}

/// Verify that an identity matches a given Ed25519 public key.
pub fn verify_identity(id: &Identity, pubkey: &[u8; 32]) -> bool {
    identity_from_pubkey(pubkey).matches(id)
}

/// Hex SHA-256 digest of a challenge message, recorded on proofs.
pub fn message_digest(message: &str) -> String {
    hex::encode(Sha256::digest(message.as_bytes()))
}
