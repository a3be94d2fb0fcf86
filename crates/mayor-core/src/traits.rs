use async_trait::async_trait;

use crate::error::{MayorResult, SignatureError};
use crate::types::Identity;

// ---------------------------------------------------------------------------
// KeyValueStore — the shared, eventually-consistent backing store
//
// The store offers plain get/set on string keys. There is no
// compare-and-swap and no transaction across keys; callers that need
// multi-key updates must tolerate partial writes.
// ---------------------------------------------------------------------------

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> MayorResult<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8]) -> MayorResult<()>;
    async fn is_available(&self) -> bool;
}

// ---------------------------------------------------------------------------
// SignatureAuthority — the wallet that answers reveal challenges
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SignatureAuthority: Send + Sync {
    /// Sign a UTF-8 challenge message.
    ///
    /// `SignatureError::Rejected` means the holder declined; any other
    /// failure is reported as `SignatureError::Fault`.
    async fn sign(&self, message: &str) -> Result<Vec<u8>, SignatureError>;

    /// Ed25519 verifying key, when the authority can expose one.
    fn verifying_key(&self) -> Option<[u8; 32]> {
        None
    }
}

// ---------------------------------------------------------------------------
// IdentityProvider — who is calling, and are they connected
// ---------------------------------------------------------------------------

pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;

    fn is_connected(&self) -> bool {
        self.current_identity().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify the trait objects are object-safe
    fn _assert_store_object_safe(_: &dyn KeyValueStore) {}
    fn _assert_authority_object_safe(_: &dyn SignatureAuthority) {}
    fn _assert_identity_object_safe(_: &dyn IdentityProvider) {}

    struct Nobody;

    impl IdentityProvider for Nobody {
        fn current_identity(&self) -> Option<Identity> {
            None
        }
    }

    struct Refuser;

    #[async_trait]
    impl SignatureAuthority for Refuser {
        async fn sign(&self, _message: &str) -> Result<Vec<u8>, SignatureError> {
            Err(SignatureError::Rejected)
        }
    }

    #[test]
    fn test_identity_provider_default_connectivity() {
        assert!(!Nobody.is_connected());
    }

    #[tokio::test]
    async fn test_authority_defaults() {
        let refuser = Refuser;
        assert!(refuser.verifying_key().is_none());
        assert_eq!(refuser.sign("hi").await, Err(SignatureError::Rejected));
    }
}
