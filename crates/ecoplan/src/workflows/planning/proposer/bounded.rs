use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use super::{Proposer, ProposerError};
use crate::workflows::intake::NormalizedInput;
use crate::workflows::planning::domain::RawCandidate;

/// Runs an inner proposer on a worker thread and waits at most `timeout`.
///
/// A call that overruns is not interrupted: its thread is left to finish and
/// its late answer is discarded.
pub struct BoundedProposer {
    inner: Arc<dyn Proposer>,
    timeout: Duration,
}

impl BoundedProposer {
    pub fn new(inner: Arc<dyn Proposer>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Proposer for BoundedProposer {
    fn propose(&self, input: &NormalizedInput) -> Result<Vec<RawCandidate>, ProposerError> {
        let (sender, receiver) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let input = input.clone();

        thread::Builder::new()
            .name("ecoplan-proposer".to_string())
            .spawn(move || {
                // the receiver is gone when the caller already timed out
                let _ = sender.send(inner.propose(&input));
            })
            .map_err(|err| ProposerError::Unavailable(err.to_string()))?;

        match receiver.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(
                    proposer = self.inner.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "proposer call timed out"
                );
                Err(ProposerError::Timeout(self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ProposerError::Unavailable(
                "proposer worker stopped without answering".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
