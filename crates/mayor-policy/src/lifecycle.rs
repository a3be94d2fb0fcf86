//! Three-state policy status machine.
//!
//! States: Draft, Active, Archived
//! Terminal states: Archived (no outbound transitions)
//!
//! Valid transitions:
//!   Draft -> Active    (owner only; raises both encrypted values by 10%)
//!   Draft -> Archived  (owner only)
//!   Active -> Archived (owner only)
//!
//! Ownership is checked before the state graph, so a non-owner always sees
//! `Unauthorized` regardless of status. Every transition returns a new
//! record; the input is never modified.

use mayor_cipher::{Decimal, Operation, ValueCodec};
use mayor_core::{Identity, PolicyId};
use std::fmt;

use crate::error::{LifecycleError, LifecycleResult};
use crate::record::{Impact, PolicyRecord, PolicyStatus};

/// Percentage applied to both values on activation.
pub const ACTIVATION_INCREASE_PERCENT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Activate,
    Archive,
}

impl Transition {
    pub fn target(&self) -> PolicyStatus {
        match self {
            Transition::Activate => PolicyStatus::Active,
            Transition::Archive => PolicyStatus::Archived,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Activate => write!(f, "activate"),
            Transition::Archive => write!(f, "archive"),
        }
    }
}

/// Check whether a status transition is valid.
pub fn is_valid_transition(from: PolicyStatus, to: PolicyStatus) -> bool {
    matches!(
        (from, to),
        (PolicyStatus::Draft, PolicyStatus::Active)
            | (PolicyStatus::Draft, PolicyStatus::Archived)
            | (PolicyStatus::Active, PolicyStatus::Archived)
    )
}

/// Build a new Draft record, encrypting both values.
pub fn create(
    codec: &dyn ValueCodec,
    id: PolicyId,
    owner: Identity,
    tax_rate: Decimal,
    tariff: Decimal,
    impact: Impact,
    created_at: u64,
) -> PolicyRecord {
    PolicyRecord {
        id,
        encrypted_tax_rate: codec.encrypt(tax_rate),
        encrypted_tariff: codec.encrypt(tariff),
        created_at,
        owner,
        status: PolicyStatus::Draft,
        impact,
    }
}

fn authorize(record: &PolicyRecord, actor: &Identity) -> LifecycleResult<()> {
    if record.is_owned_by(actor) {
        Ok(())
    } else {
        Err(LifecycleError::Unauthorized {
            actor: actor.to_string(),
        })
    }
}

fn check_graph(record: &PolicyRecord, transition: Transition) -> LifecycleResult<()> {
    if is_valid_transition(record.status, transition.target()) {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition {
            from: record.status,
            transition,
        })
    }
}

/// Draft -> Active, raising both encrypted values by 10% under encryption.
pub fn activate(
    record: &PolicyRecord,
    actor: &Identity,
    codec: &dyn ValueCodec,
) -> LifecycleResult<PolicyRecord> {
    authorize(record, actor)?;
    check_graph(record, Transition::Activate)?;

    let raise = Operation::IncreaseByPercent(Decimal::from(ACTIVATION_INCREASE_PERCENT));
    let encrypted_tax_rate = codec.compute(&record.encrypted_tax_rate, raise)?;
    let encrypted_tariff = codec.compute(&record.encrypted_tariff, raise)?;

    Ok(PolicyRecord {
        encrypted_tax_rate,
        encrypted_tariff,
        status: PolicyStatus::Active,
        ..record.clone()
    })
}

/// Draft/Active -> Archived. Ciphertexts are carried over untouched.
pub fn archive(record: &PolicyRecord, actor: &Identity) -> LifecycleResult<PolicyRecord> {
    authorize(record, actor)?;
    check_graph(record, Transition::Archive)?;

    Ok(PolicyRecord {
        status: PolicyStatus::Archived,
        ..record.clone()
    })
}

/// Dispatch a transition by value.
pub fn apply(
    record: &PolicyRecord,
    transition: Transition,
    actor: &Identity,
    codec: &dyn ValueCodec,
) -> LifecycleResult<PolicyRecord> {
    match transition {
        Transition::Activate => activate(record, actor, codec),
        Transition::Archive => archive(record, actor),
    }
}
