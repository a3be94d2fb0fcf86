//! Reveal sessions: signature-gated authorization to decrypt.
//!
//! A session walks `Unauthenticated -> Challenged -> Authorized -> Expired`.
//! The challenge is a canonical text built from the reveal context; the
//! caller's wallet signs it and the session turns the signature into an
//! `AuthorizationProof` valid until `valid_from + valid_duration_seconds`.
//!
//! One proof unlocks every ciphertext for the rest of the session. It is
//! not bound to a record or a field.

use ed25519_dalek::{Signature, VerifyingKey};
use mayor_core::{
    message_digest, verify_identity, Identity, SessionId, SignatureAuthority,
    SignatureError, Timestamp,
};
use std::fmt;

use crate::error::{CipherError, CipherResult};

const SIGNATURE_LEN: usize = 64;

// ---------------------------------------------------------------------------
// RevealContext — what the wallet is asked to sign over
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealContext {
    pub public_key_material: String,
    pub store_address: String,
    pub network_id: u64,
    pub valid_from: Timestamp,
    pub valid_duration_seconds: u64,
}

impl RevealContext {
    /// Canonical challenge text. Field order and labels are fixed.
    pub fn canonical_message(&self) -> String {
        format!(
            "publickey:{}\ncontractAddresses:{}\ncontractsChainId:{}\nstartTimestamp:{}\ndurationSeconds:{}",
            self.public_key_material,
            self.store_address,
            self.network_id,
            self.valid_from.seconds_since_epoch,
            self.valid_duration_seconds
        )
    }

    pub fn expires_at(&self) -> Timestamp {
        self.valid_from.plus_seconds(self.valid_duration_seconds)
    }

    /// Fresh per-session public key material (`0x` + 64 hex chars).
    pub fn generate_key_material() -> String {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        format!("0x{}", hex::encode(bytes))
    }
}

// ---------------------------------------------------------------------------
// Challenge / AuthorizationProof
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Challenge {
    pub session_id: SessionId,
    pub identity: Identity,
    pub message: String,
    pub context: RevealContext,
    pub issued_at: Timestamp,
}

/// Evidence that the session holder signed the reveal challenge.
///
/// Only a `RevealSession` issues these.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationProof {
    session_id: SessionId,
    identity: Identity,
    challenge_digest: String,
    signature: Vec<u8>,
    valid_from: Timestamp,
    expires_at: Timestamp,
}

impl AuthorizationProof {
    pub(crate) fn issue(
        session_id: SessionId,
        identity: Identity,
        challenge_digest: String,
        signature: Vec<u8>,
        valid_from: Timestamp,
        valid_duration_seconds: u64,
    ) -> Self {
        Self {
            session_id,
            identity,
            challenge_digest,
            signature,
            valid_from,
            expires_at: valid_from.plus_seconds(valid_duration_seconds),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn challenge_digest(&self) -> &str {
        &self.challenge_digest
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn valid_from(&self) -> Timestamp {
        self.valid_from
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        now >= self.valid_from && now < self.expires_at
    }
}

impl fmt::Debug for AuthorizationProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationProof")
            .field("session_id", &self.session_id)
            .field("identity", &self.identity)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// RevealSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Unauthenticated,
    Challenged,
    Authorized,
    Expired,
}

impl fmt::Display for RevealState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevealState::Unauthenticated => write!(f, "unauthenticated"),
            RevealState::Challenged => write!(f, "challenged"),
            RevealState::Authorized => write!(f, "authorized"),
            RevealState::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug)]
enum Phase {
    Unauthenticated,
    Challenged(Challenge),
    Authorized(AuthorizationProof),
}

#[derive(Debug)]
pub struct RevealSession {
    id: SessionId,
    identity: Identity,
    phase: Phase,
}

impl RevealSession {
    pub fn new(identity: Identity) -> Self {
        Self {
            id: SessionId::generate(),
            identity,
            phase: Phase::Unauthenticated,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn state(&self) -> RevealState {
        self.state_at(Timestamp::now())
    }

    pub fn state_at(&self, now: Timestamp) -> RevealState {
        match &self.phase {
            Phase::Unauthenticated => RevealState::Unauthenticated,
            Phase::Challenged(_) => RevealState::Challenged,
            Phase::Authorized(p) if now >= p.expires_at() => RevealState::Expired,
            Phase::Authorized(_) => RevealState::Authorized,
        }
    }

    /// The pending challenge, if any.
    pub fn challenge(&self) -> Option<&Challenge> {
        match &self.phase {
            Phase::Challenged(c) => Some(c),
            _ => None,
        }
    }

    /// The issued proof, even once expired; decrypt rejects stale proofs.
    pub fn proof(&self) -> Option<&AuthorizationProof> {
        match &self.phase {
            Phase::Authorized(p) => Some(p),
            _ => None,
        }
    }

    /// Issue a challenge over `context`.
    ///
    /// Replaces any pending challenge. Refused while a live proof exists.
    pub fn request_challenge(&mut self, context: RevealContext) -> CipherResult<&Challenge> {
        if self.state() == RevealState::Authorized {
            return Err(CipherError::InvalidState(
                "session already authorized".into(),
            ));
        }

        let challenge = Challenge {
            session_id: self.id.clone(),
            identity: self.identity.clone(),
            message: context.canonical_message(),
            context,
            issued_at: Timestamp::now(),
        };
        tracing::debug!(session_id = %self.id, identity = %self.identity, "reveal challenge issued");
        self.phase = Phase::Challenged(challenge);

        match &self.phase {
            Phase::Challenged(c) => Ok(c),
            _ => Err(CipherError::InvalidState("challenge not recorded".into())),
        }
    }

    /// Turn the signer's answer into a proof.
    ///
    /// - `Rejected` → `DecryptionDenied`, session drops back to unauthenticated.
    /// - Any fault, malformed or unverifiable signature → `DecryptionFailed`,
    ///   the challenge stays pending so the caller may retry.
    pub fn submit(
        &mut self,
        outcome: Result<Vec<u8>, SignatureError>,
        verifying_key: Option<[u8; 32]>,
    ) -> CipherResult<AuthorizationProof> {
        let challenge = match &self.phase {
            Phase::Challenged(c) => c,
            _ => {
                return Err(CipherError::InvalidState(format!(
                    "no pending challenge (state: {})",
                    self.state()
                )))
            }
        };

        let signature = match outcome {
            Ok(sig) => sig,
            Err(SignatureError::Rejected) => {
                tracing::info!(session_id = %self.id, "reveal challenge rejected by signer");
                self.phase = Phase::Unauthenticated;
                return Err(CipherError::DecryptionDenied);
            }
            Err(SignatureError::Fault(reason)) => {
                tracing::warn!(session_id = %self.id, %reason, "signer fault during reveal");
                return Err(CipherError::DecryptionFailed(reason));
            }
        };

        if signature.len() != SIGNATURE_LEN {
            return Err(CipherError::DecryptionFailed(format!(
                "malformed signature: {} bytes",
                signature.len()
            )));
        }

        if let Some(key) = verifying_key {
            verify_signature(&key, &challenge.message, &signature, &self.identity)?;
        }

        let proof = AuthorizationProof::issue(
            self.id.clone(),
            self.identity.clone(),
            message_digest(&challenge.message),
            signature,
            challenge.context.valid_from,
            challenge.context.valid_duration_seconds,
        );
        tracing::debug!(
            session_id = %self.id,
            expires_at = %proof.expires_at().to_rfc3339(),
            "reveal session authorized"
        );
        self.phase = Phase::Authorized(proof.clone());
        Ok(proof)
    }

    /// Sign the pending challenge with `authority` and submit the result.
    pub async fn authorize(
        &mut self,
        authority: &dyn SignatureAuthority,
    ) -> CipherResult<AuthorizationProof> {
        let message = self
            .challenge()
            .map(|c| c.message.clone())
            .ok_or_else(|| CipherError::InvalidState("no pending challenge".into()))?;
        let outcome = authority.sign(&message).await;
        self.submit(outcome, authority.verifying_key())
    }
}

fn verify_signature(
    key: &[u8; 32],
    message: &str,
    signature: &[u8],
    identity: &Identity,
) -> CipherResult<()> {
    if !verify_identity(identity, key) {
        return Err(CipherError::DecryptionFailed(
            "signer key does not belong to session identity".into(),
        ));
    }
    let vk = VerifyingKey::from_bytes(key)
        .map_err(|_| CipherError::DecryptionFailed("invalid verifying key".into()))?;
    let bytes: [u8; SIGNATURE_LEN] = signature
        .try_into()
        .map_err(|_| CipherError::DecryptionFailed("malformed signature".into()))?;
    vk.verify_strict(message.as_bytes(), &Signature::from_bytes(&bytes))
        .map_err(|_| CipherError::DecryptionFailed("signature does not verify".into()))
}
