use mayor_core::Timestamp;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::ciphertext::Ciphertext;
use crate::error::{CipherError, CipherResult};
use crate::operation::Operation;
use crate::reveal::AuthorizationProof;

// Encrypted-value codec.
//
// Every component that touches policy values goes through `ValueCodec`.
// Lifecycle and repository code hold a `dyn ValueCodec` and never look
// inside a payload, so a genuine homomorphic scheme can be dropped in
// without touching them.

pub trait ValueCodec: Send + Sync {
    /// Tag written in front of every ciphertext this scheme produces.
    fn scheme_tag(&self) -> &str;

    /// Decimal digits guaranteed to survive `decrypt(encrypt(v))`.
    fn precision_digits(&self) -> u32;

    fn encrypt(&self, value: Decimal) -> Ciphertext;

    /// Reveal a value. Requires a live proof from a reveal session.
    fn decrypt(
        &self,
        ciphertext: &Ciphertext,
        proof: Option<&AuthorizationProof>,
    ) -> CipherResult<Decimal>;

    /// Apply `op` under encryption.
    fn compute(&self, ciphertext: &Ciphertext, op: Operation) -> CipherResult<Ciphertext>;
}

/// Check a proof is present and unexpired at `now`.
pub fn check_proof(proof: Option<&AuthorizationProof>, now: Timestamp) -> CipherResult<()> {
    match proof {
        Some(p) if p.is_valid_at(now) => Ok(()),
        Some(p) => {
            tracing::debug!(session_id = %p.session_id(), "decrypt refused: proof expired");
            Err(CipherError::Unauthorized)
        }
        None => Err(CipherError::Unauthorized),
    }
}

/// True when `a` and `b` agree to `digits` decimal places.
pub fn within_precision(a: Decimal, b: Decimal, digits: u32) -> bool {
    let tolerance = Decimal::new(1, digits);
    (a - b).abs() < tolerance
}

// ---------------------------------------------------------------------------
// ReferenceCodec — reversible stand-in scheme
// ---------------------------------------------------------------------------

pub const REFERENCE_SCHEME_TAG: &str = "FHE";

/// Reference scheme: the payload is the decimal's canonical text.
///
/// Not secure. It exists so the rest of the system can be exercised
/// against the `ValueCodec` contract; its wire form matches the strings
/// already present in deployed stores (`FHE-<base64>`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceCodec;

impl ReferenceCodec {
    pub fn new() -> Self {
        Self
    }

    fn open(&self, ciphertext: &Ciphertext) -> CipherResult<Decimal> {
        if ciphertext.scheme_tag() != REFERENCE_SCHEME_TAG {
            return Err(CipherError::SchemeMismatch {
                expected: REFERENCE_SCHEME_TAG.to_string(),
                found: ciphertext.scheme_tag().to_string(),
            });
        }
        let text = std::str::from_utf8(ciphertext.payload())
            .map_err(|_| CipherError::MalformedCiphertext("payload is not utf-8".into()))?;
        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|_| CipherError::MalformedCiphertext("payload is not a decimal".into()))
    }

    fn seal(&self, value: Decimal) -> Ciphertext {
        Ciphertext::seal(
            REFERENCE_SCHEME_TAG,
            value.normalize().to_string().into_bytes(),
        )
    }
}

impl ValueCodec for ReferenceCodec {
    fn scheme_tag(&self) -> &str {
        REFERENCE_SCHEME_TAG
    }

    fn precision_digits(&self) -> u32 {
        1
    }

    fn encrypt(&self, value: Decimal) -> Ciphertext {
        self.seal(value)
    }

    fn decrypt(
        &self,
        ciphertext: &Ciphertext,
        proof: Option<&AuthorizationProof>,
    ) -> CipherResult<Decimal> {
        check_proof(proof, Timestamp::now())?;
        self.open(ciphertext)
    }

    fn compute(&self, ciphertext: &Ciphertext, op: Operation) -> CipherResult<Ciphertext> {
        let value = self.open(ciphertext)?;
        Ok(self.seal(op.apply(value)?))
    }
}
