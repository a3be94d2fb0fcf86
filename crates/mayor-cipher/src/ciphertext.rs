use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{CipherError, CipherResult};

const PREVIEW_LEN: usize = 20;

/// Opaque encrypted decimal.
///
/// Only a `ValueCodec` can mint one (`encrypt` / `compute`). The wire form
/// `<TAG>-<base64 payload>` can be parsed back, but parsing validates the
/// shape and never accepts bare plaintext.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ciphertext {
    scheme_tag: String,
    payload: Vec<u8>,
}

impl Ciphertext {
    pub(crate) fn seal(scheme_tag: &str, payload: Vec<u8>) -> Self {
        Self {
            scheme_tag: scheme_tag.to_string(),
            payload,
        }
    }

    pub fn scheme_tag(&self) -> &str {
        &self.scheme_tag
    }

    pub(crate) fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Encode as the string stored in policy records.
    pub fn to_wire(&self) -> String {
        format!("{}-{}", self.scheme_tag, STANDARD.encode(&self.payload))
    }

    /// Parse the stored string form.
    pub fn from_wire(wire: &str) -> CipherResult<Self> {
        let (tag, body) = wire
            .split_once('-')
            .ok_or_else(|| CipherError::MalformedCiphertext("missing scheme tag".into()))?;

        if tag.is_empty()
            || !tag
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(CipherError::MalformedCiphertext(format!(
                "invalid scheme tag '{}'",
                tag
            )));
        }

        let payload = STANDARD
            .decode(body)
            .map_err(|e| CipherError::MalformedCiphertext(format!("payload: {}", e)))?;
        if payload.is_empty() {
            return Err(CipherError::MalformedCiphertext("empty payload".into()));
        }

        Ok(Self::seal(tag, payload))
    }

    /// Shortened wire form for listings.
    pub fn preview(&self) -> String {
        let wire = self.to_wire();
        if wire.len() <= PREVIEW_LEN {
            wire
        } else {
            format!("{}...", &wire[..PREVIEW_LEN])
        }
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ciphertext({}, {} bytes)",
            self.scheme_tag,
            self.payload.len()
        )
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}

impl Serialize for Ciphertext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Ciphertext {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = String::deserialize(deserializer)?;
        Ciphertext::from_wire(&wire).map_err(serde::de::Error::custom)
    }
}
