//! Boundary types exchanged with the equity simulation service.

use crate::game::query::QueryKey;
use crate::model::encoding::{self, EncodingError, WireCard};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub const DEFAULT_ITERATIONS: u32 = 100_000;
pub const MAX_ITERATIONS: u32 = 500_000;
pub const DEFAULT_CONCURRENCY: u32 = 8;
pub const MAX_CONCURRENCY: u32 = 16;

pub const PLAYER_CARDS: usize = 2;
pub const MAX_OPPONENT_CARDS: usize = 2;
pub const MAX_COMMUNITY_CARDS: usize = 5;

/// Fixed simulation parameters attached to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub iterations: u32,
    pub concurrency: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl SimulationParams {
    /// Applies the service's bounds: zero means default, large values are capped.
    pub fn normalized(self) -> Self {
        let iterations = match self.iterations {
            0 => DEFAULT_ITERATIONS,
            n => n.min(MAX_ITERATIONS),
        };
        let concurrency = match self.concurrency {
            0 => DEFAULT_CONCURRENCY,
            n => n.min(MAX_CONCURRENCY),
        };
        Self {
            iterations,
            concurrency,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityRequest {
    pub player_cards: Vec<WireCard>,
    pub opponent_cards: Vec<WireCard>,
    pub community_cards: Vec<WireCard>,
    pub num_iterations: u32,
    pub num_concurrent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("expected exactly {} player cards, got {}", PLAYER_CARDS, .0)]
    PlayerCards(usize),
    #[error("at most {} opponent cards allowed, got {}", MAX_OPPONENT_CARDS, .0)]
    OpponentCards(usize),
    #[error("at most {} community cards allowed, got {}", MAX_COMMUNITY_CARDS, .0)]
    CommunityCards(usize),
    #[error("card {{Rank: {}, Suit: {}}} appears more than once", .0.rank, .0.suit)]
    DuplicateCard(WireCard),
}

impl EquityRequest {
    /// Encodes the cards of an eligible key. Fails on the first card whose id
    /// does not map to a rank or suit.
    pub fn from_key(key: &QueryKey, params: SimulationParams) -> Result<Self, EncodingError> {
        let params = params.normalized();
        Ok(Self {
            player_cards: encoding::encode_all(key.player())?,
            opponent_cards: encoding::encode_all(key.opponent())?,
            community_cards: encoding::encode_all(key.board())?,
            num_iterations: params.iterations,
            num_concurrent: params.concurrency,
        })
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.player_cards.len() != PLAYER_CARDS {
            return Err(RequestError::PlayerCards(self.player_cards.len()));
        }
        if self.opponent_cards.len() > MAX_OPPONENT_CARDS {
            return Err(RequestError::OpponentCards(self.opponent_cards.len()));
        }
        if self.community_cards.len() > MAX_COMMUNITY_CARDS {
            return Err(RequestError::CommunityCards(self.community_cards.len()));
        }
        let mut seen = HashSet::new();
        for card in self.cards() {
            if !seen.insert(*card) {
                return Err(RequestError::DuplicateCard(*card));
            }
        }
        Ok(())
    }

    pub fn cards(&self) -> impl Iterator<Item = &WireCard> {
        self.player_cards
            .iter()
            .chain(&self.opponent_cards)
            .chain(&self.community_cards)
    }

    /// Card ids of the request in wire order, for logging.
    pub fn describe(&self) -> String {
        let render = |cards: &[WireCard]| {
            cards
                .iter()
                .map(|wire| match encoding::decode(*wire) {
                    Ok(card) => card.id().to_string(),
                    Err(_) => "??".to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        };
        format!(
            "[{}] vs [{}] board [{}]",
            render(&self.player_cards),
            render(&self.opponent_cards),
            render(&self.community_cards)
        )
    }
}

/// Raw engine output: probabilities are unit fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityResult {
    pub win_probability: f64,
    pub lose_probability: f64,
    pub tie_probability: f64,
    pub iterations: u64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResultError {
    #[error("{field} = {value} is not a probability in [0, 1]")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },
}

impl EquityResult {
    pub fn validate(&self) -> Result<(), ResultError> {
        for (field, value) in [
            ("winProbability", self.win_probability),
            ("loseProbability", self.lose_probability),
            ("tieProbability", self.tie_probability),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ResultError::ProbabilityOutOfRange { field, value });
            }
        }
        Ok(())
    }
}
