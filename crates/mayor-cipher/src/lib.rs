//! Encrypted policy values.
//!
//! - [`ciphertext`]: the opaque `Ciphertext` wrapper and its wire form
//! - [`operation`]: the closed set of adjustments computable over ciphertext
//! - [`codec`]: the pluggable `ValueCodec` trait and the reference scheme
//! - [`reveal`]: signature-gated reveal sessions issuing `AuthorizationProof`s
//! - [`signer`]: a local Ed25519 wallet usable as signer and identity source

pub mod ciphertext;
pub mod codec;
pub mod error;
pub mod operation;
pub mod reveal;
pub mod signer;

#[cfg(test)]
mod proptest_codec;

pub use ciphertext::Ciphertext;
pub use codec::{within_precision, ReferenceCodec, ValueCodec};
pub use error::{CipherError, CipherResult};
pub use operation::Operation;
pub use reveal::{AuthorizationProof, Challenge, RevealContext, RevealSession, RevealState};
pub use signer::LocalWallet;

pub use rust_decimal::Decimal;
