//! Candidate proposers: the opaque source of untrusted actions for each attempt.

mod bounded;
mod catalog;
mod response;
mod scripted;
mod text;

pub use bounded::BoundedProposer;
pub use catalog::{ApplianceArea, CatalogEntry, CatalogError, CatalogProposer};
pub use response::parse_response;
pub use scripted::ScriptedProposer;
pub use text::{build_prompt, TextProposer, TextSource};

use std::time::Duration;

use super::domain::RawCandidate;
use crate::workflows::intake::NormalizedInput;

/// Produces candidate actions for a normalized household.
///
/// Failures and empty lists are both treated by the loop as "no candidates this
/// attempt"; neither aborts a run.
pub trait Proposer: Send + Sync {
    fn propose(&self, input: &NormalizedInput) -> Result<Vec<RawCandidate>, ProposerError>;

    fn name(&self) -> &str {
        "proposer"
    }
}

impl<P: Proposer + ?Sized> Proposer for std::sync::Arc<P> {
    fn propose(&self, input: &NormalizedInput) -> Result<Vec<RawCandidate>, ProposerError> {
        (**self).propose(input)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Error enumeration for proposer failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProposerError {
    #[error("proposer unavailable: {0}")]
    Unavailable(String),
    #[error("proposer timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed proposer response: {0}")]
    Malformed(String),
}
