//! Stored JSON form of a policy record.
//!
//! The id is not part of the document; it is the suffix of the store key
//! the document lives under.

use mayor_cipher::Ciphertext;
use mayor_core::{Identity, PolicyId};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::record::{Impact, PolicyRecord, PolicyStatus};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPolicy {
    tax_rate: Ciphertext,
    trade_tariff: Ciphertext,
    timestamp: u64,
    mayor: Identity,
    status: PolicyStatus,
    happiness_impact: i64,
    revenue_impact: i64,
}

/// Serialize a record to the bytes written under `policy_<id>`.
pub fn encode_record(record: &PolicyRecord) -> Result<Vec<u8>, ParseError> {
    let stored = StoredPolicy {
        tax_rate: record.encrypted_tax_rate.clone(),
        trade_tariff: record.encrypted_tariff.clone(),
        timestamp: record.created_at,
        mayor: record.owner.clone(),
        status: record.status,
        happiness_impact: record.impact.happiness,
        revenue_impact: record.impact.revenue,
    };
    serde_json::to_vec(&stored)
        .map_err(|e| ParseError::new(e.to_string()).with_key(record.id.storage_key()))
}

/// Strictly parse stored bytes into a record. Every field is required.
pub fn parse_record(id: &PolicyId, bytes: &[u8]) -> Result<PolicyRecord, ParseError> {
    let stored: StoredPolicy = serde_json::from_slice(bytes)
        .map_err(|e| ParseError::new(e.to_string()).with_key(id.storage_key()))?;

    Ok(PolicyRecord {
        id: id.clone(),
        encrypted_tax_rate: stored.tax_rate,
        encrypted_tariff: stored.trade_tariff,
        created_at: stored.timestamp,
        owner: stored.mayor,
        status: stored.status,
        impact: Impact {
            happiness: stored.happiness_impact,
            revenue: stored.revenue_impact,
        },
    })
}
