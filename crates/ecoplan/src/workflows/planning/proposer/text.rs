use serde_json::json;

use super::{parse_response, Proposer, ProposerError};
use crate::workflows::intake::NormalizedInput;
use crate::workflows::planning::domain::RawCandidate;

const INSTRUCTIONS: &str = "Return exactly one JSON object of the form \
{\"recommendations\":[{\"action\":\"\",\"steps\":[],\"pct_kwh_reduction_min\":0,\
\"pct_kwh_reduction_max\":0,\"kwh_saved_per_month\":null,\"est_cost\":0,\
\"disruption\":\"none|low|medium|high\",\"notes\":\"\"}]}. \
Respect the policy: stay within target_budget, payback_ceiling_months and max_disruption. \
No prose, no markdown.";

/// Anything that answers a prompt with free text.
pub trait TextSource: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, ProposerError>;
}

impl<F> TextSource for F
where
    F: Fn(&str) -> Result<String, ProposerError> + Send + Sync,
{
    fn complete(&self, prompt: &str) -> Result<String, ProposerError> {
        self(prompt)
    }
}

/// Proposer backed by a text generator: prompt out, recommendations parsed back in.
pub struct TextProposer<S> {
    source: S,
}

impl<S: TextSource> TextProposer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

/// Instructions followed by the normalized household as JSON.
pub fn build_prompt(input: &NormalizedInput) -> Result<String, ProposerError> {
    let payload = json!({
        "instructions": INSTRUCTIONS,
        "household": input,
    });
    serde_json::to_string(&payload).map_err(|err| ProposerError::Malformed(err.to_string()))
}

impl<S: TextSource> Proposer for TextProposer<S> {
    fn propose(&self, input: &NormalizedInput) -> Result<Vec<RawCandidate>, ProposerError> {
        let prompt = build_prompt(input)?;
        let text = self.source.complete(&prompt)?;
        parse_response(&text)
    }

    fn name(&self) -> &str {
        "text"
    }
}
