//! Policy records and their lifecycle.
//!
//! A record holds two encrypted values, an owner and a status. Status moves
//! Draft -> Active -> Archived through [`lifecycle`], which only ever sees
//! ciphertexts through a `ValueCodec`.

pub mod error;
pub mod impact;
pub mod lifecycle;
pub mod record;
pub mod schema;

pub use error::{LifecycleError, LifecycleResult, ParseError};
pub use impact::{FixedImpactScorer, ImpactScorer, RandomImpactScorer};
pub use lifecycle::{is_valid_transition, Transition};
pub use record::{Impact, PolicyField, PolicyRecord, PolicyStatus};
pub use schema::{encode_record, parse_record};
