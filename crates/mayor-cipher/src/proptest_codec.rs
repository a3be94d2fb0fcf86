//! Property-based tests for the `ValueCodec` contract.
//!
//! Checked against `ReferenceCodec` over arbitrary decimals and operands.
//! `Overflow` is the only failure an operation may report, and only when
//! the plaintext arithmetic overflows too.

use proptest::prelude::*;
use rust_decimal::Decimal;

use mayor_core::{Identity, SessionId, Timestamp};

use crate::codec::{ReferenceCodec, ValueCodec};
use crate::error::CipherError;
use crate::operation::Operation;
use crate::reveal::AuthorizationProof;

fn live_proof() -> AuthorizationProof {
    let now = Timestamp::now();
    AuthorizationProof::issue(
        SessionId::generate(),
        Identity::new("0xA"),
        "digest".into(),
        vec![0u8; 64],
        Timestamp::from_seconds(now.seconds_since_epoch - 5),
        3600,
    )
}

/// Any representable decimal: full 96-bit mantissa, any sign and scale.
fn any_decimal() -> impl Strategy<Value = Decimal> {
    (any::<u32>(), any::<u32>(), any::<u32>(), any::<bool>(), 0u32..=28)
        .prop_map(|(lo, mid, hi, negative, scale)| {
            Decimal::from_parts(lo, mid, hi, negative, scale)
        })
}

/// Policy-sized values, so most generated cases stay clear of overflow.
fn policy_value() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000, 0u32..=8).prop_map(|(m, s)| Decimal::new(m, s))
}

fn value() -> impl Strategy<Value = Decimal> {
    prop_oneof![3 => policy_value(), 1 => any_decimal()]
}

fn percent() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        3 => (-10_000i64..10_000, 0u32..=4).prop_map(|(m, s)| Decimal::new(m, s)),
        1 => any_decimal(),
    ]
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        percent().prop_map(Operation::IncreaseByPercent),
        percent().prop_map(Operation::DecreaseByPercent),
        value().prop_map(Operation::Scale),
    ]
}

/// `v * (1 + p / 100)` written out independently of `Operation`.
fn increased(v: Decimal, p: Decimal) -> Option<Decimal> {
    p.checked_div(Decimal::from(100))
        .and_then(|f| Decimal::ONE.checked_add(f))
        .and_then(|factor| v.checked_mul(factor))
}

proptest! {
    /// Property: decrypt(encrypt(v)) == v.
    #[test]
    fn prop_encrypt_decrypt_roundtrip(v in any_decimal()) {
        let codec = ReferenceCodec::new();
        let ct = codec.encrypt(v);
        prop_assert_eq!(codec.decrypt(&ct, Some(&live_proof())).unwrap(), v);
    }

    /// Property: the round trip also survives the wire form.
    #[test]
    fn prop_roundtrip_through_wire(v in value()) {
        let codec = ReferenceCodec::new();
        let wire = codec.encrypt(v).to_wire();
        let parsed = crate::Ciphertext::from_wire(&wire).unwrap();
        prop_assert_eq!(codec.decrypt(&parsed, Some(&live_proof())).unwrap(), v);
    }

    /// Property: decrypt(compute(c, IncreaseByPercent(p))) == v * (1 + p/100).
    #[test]
    fn prop_increase_matches_plaintext(v in value(), p in percent()) {
        let codec = ReferenceCodec::new();
        let ct = codec.encrypt(v);
        let plain = codec.decrypt(&ct, Some(&live_proof())).unwrap();

        match (codec.compute(&ct, Operation::IncreaseByPercent(p)), increased(plain, p)) {
            (Ok(out), Some(expected)) => {
                prop_assert_eq!(codec.decrypt(&out, Some(&live_proof())).unwrap(), expected);
            }
            (Err(CipherError::Overflow), None) => {}
            (result, expected) => {
                prop_assert!(false, "compute gave {:?}, plaintext gave {:?}", result, expected);
            }
        }
    }

    /// Property: decrypt(compute(c, op)) == op(decrypt(c)) for every operation.
    #[test]
    fn prop_compute_matches_apply(v in value(), op in operation()) {
        let codec = ReferenceCodec::new();
        let ct = codec.encrypt(v);
        let plain = codec.decrypt(&ct, Some(&live_proof())).unwrap();

        match (codec.compute(&ct, op), op.apply(plain)) {
            (Ok(out), Ok(expected)) => {
                prop_assert_eq!(codec.decrypt(&out, Some(&live_proof())).unwrap(), expected);
            }
            (Err(CipherError::Overflow), Err(CipherError::Overflow)) => {}
            (result, expected) => {
                prop_assert!(false, "compute gave {:?}, apply gave {:?}", result, expected);
            }
        }
    }

    /// Property: decrypt(compute(compute(c, op1), op2)) == op2(op1(v)).
    #[test]
    fn prop_compute_composes(v in value(), op1 in operation(), op2 in operation()) {
        let codec = ReferenceCodec::new();
        let ct = codec.encrypt(v);
        let start = codec.decrypt(&ct, Some(&live_proof())).unwrap();

        let encrypted = codec.compute(&ct, op1).and_then(|c| codec.compute(&c, op2));
        let plain = op1.apply(start).and_then(|x| op2.apply(x.normalize()));

        match (encrypted, plain) {
            (Ok(out), Ok(expected)) => {
                prop_assert_eq!(codec.decrypt(&out, Some(&live_proof())).unwrap(), expected);
            }
            (Err(CipherError::Overflow), Err(CipherError::Overflow)) => {}
            (result, expected) => {
                prop_assert!(false, "compute gave {:?}, apply gave {:?}", result, expected);
            }
        }
    }
}
