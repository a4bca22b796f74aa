use equity_core::game::request::EquityResult;
use serde::{Deserialize, Serialize};

/// Published estimate, probabilities as percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbabilityResult {
    pub win_probability: f64,
    pub lose_probability: f64,
    pub tie_probability: f64,
    pub iterations: u64,
}

impl ProbabilityResult {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&EquityResult> for ProbabilityResult {
    fn from(result: &EquityResult) -> Self {
        Self {
            win_probability: result.win_probability * 100.0,
            lose_probability: result.lose_probability * 100.0,
            tie_probability: result.tie_probability * 100.0,
            iterations: result.iterations,
        }
    }
}
