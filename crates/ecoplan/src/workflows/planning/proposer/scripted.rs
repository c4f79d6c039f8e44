use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{Proposer, ProposerError};
use crate::workflows::intake::NormalizedInput;
use crate::workflows::planning::domain::RawCandidate;

type Reply = Result<Vec<RawCandidate>, ProposerError>;

/// Replays a fixed sequence of replies, one per call.
///
/// Once the queue is down to its final reply that reply is repeated. Used by
/// the demo command and by tests that need a predictable proposer.
#[derive(Debug)]
pub struct ScriptedProposer {
    replies: Mutex<VecDeque<Reply>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedProposer {
    pub fn sequence<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Reply>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with the same candidates.
    pub fn repeating(candidates: Vec<RawCandidate>) -> Self {
        Self::sequence([Ok(candidates)])
    }

    /// Always fails with `error`.
    pub fn failing(error: ProposerError) -> Self {
        Self::sequence([Err(error)])
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Proposer for ScriptedProposer {
    fn propose(&self, _input: &NormalizedInput) -> Result<Vec<RawCandidate>, ProposerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let mut replies = self
            .replies
            .lock()
            .map_err(|_| ProposerError::Unavailable("script lock poisoned".to_string()))?;
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        reply.unwrap_or_else(|| Ok(Vec::new()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
