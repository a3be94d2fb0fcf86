use async_trait::async_trait;
use ed25519_dalek::{Signer as DalekSigner, SigningKey, VerifyingKey};
use mayor_core::{Identity, IdentityProvider, SignatureAuthority, SignatureError};
use zeroize::Zeroizing;

use crate::error::{CipherError, CipherResult};

/// Local Ed25519 wallet.
///
/// Acts as both the `SignatureAuthority` answering reveal challenges and
/// the `IdentityProvider` naming the current caller.
pub struct LocalWallet {
    signing_key: Zeroizing<[u8; 32]>,
    verifying_key: [u8; 32],
}

impl LocalWallet {
    /// Create a wallet from raw key bytes.
    pub fn from_bytes(key_bytes: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&key_bytes);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key: Zeroizing::new(key_bytes),
            verifying_key: verifying_key.to_bytes(),
        }
    }

    /// Create a wallet with a fresh random key.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut key = Zeroizing::new([0u8; 32]);
        rand::rngs::OsRng.fill_bytes(&mut *key);
        Self::from_bytes(*key)
    }

    /// Load a wallet from a hex-encoded 32-byte secret.
    pub fn from_hex(encoded: &str) -> CipherResult<Self> {
        let bytes = Zeroizing::new(
            hex::decode(encoded.trim())
                .map_err(|_| CipherError::KeyMaterial("wallet key is not hex".into()))?,
        );
        let key: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CipherError::KeyMaterial("wallet key must be 32 bytes".into()))?;
        Ok(Self::from_bytes(key))
    }

    /// Hex-encoded secret, for writing the key file.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(*self.signing_key))
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.verifying_key
    }

    pub fn identity(&self) -> Identity {
        mayor_core::identity_from_pubkey(&self.verifying_key)
    }

    /// Verify a signature against this wallet's public key.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> bool {
        let vk = VerifyingKey::from_bytes(&self.verifying_key);
        match vk {
            Ok(vk) => {
                let sig = ed25519_dalek::Signature::from_bytes(signature);
                vk.verify_strict(message, &sig).is_ok()
            }
            Err(_) => false,
        }
    }
}

#[async_trait]
impl SignatureAuthority for LocalWallet {
    async fn sign(&self, message: &str) -> Result<Vec<u8>, SignatureError> {
        let signing_key = SigningKey::from_bytes(&self.signing_key);
        let signature = signing_key.sign(message.as_bytes());
        Ok(signature.to_bytes().to_vec())
    }

    fn verifying_key(&self) -> Option<[u8; 32]> {
        Some(self.verifying_key)
    }
}

impl IdentityProvider for LocalWallet {
    fn current_identity(&self) -> Option<Identity> {
        Some(self.identity())
    }
}
