//! Derivation of the equity query key from the current state.

use crate::game::state::GameState;
use crate::model::card::Card;
use crate::model::slots::PositionGroup;

/// Cards that identify one eligible equity query.
///
/// Only occupied slots are kept, in slot order. Two states with the same cards
/// in the same order produce equal keys regardless of the selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    player: [Card; 2],
    opponent: Vec<Card>,
    board: Vec<Card>,
}

impl QueryKey {
    /// `None` unless both player slots are occupied.
    pub fn derive(state: &GameState) -> Option<Self> {
        let positions = state.positions();
        let player = positions.slots(PositionGroup::PlayerCards);
        let (Some(first), Some(second)) = (player[0].clone(), player[1].clone()) else {
            return None;
        };
        Some(Self {
            player: [first, second],
            opponent: positions
                .occupied(PositionGroup::OpponentCards)
                .cloned()
                .collect(),
            board: positions.occupied(PositionGroup::BoardCards).cloned().collect(),
        })
    }

    pub fn player(&self) -> &[Card; 2] {
        &self.player
    }

    pub fn opponent(&self) -> &[Card] {
        &self.opponent
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }
}

/// Change of the derived key after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryUpdate {
    Eligible(QueryKey),
    Ineligible,
}

impl QueryUpdate {
    pub fn from_key(key: Option<QueryKey>) -> Self {
        match key {
            Some(key) => QueryUpdate::Eligible(key),
            None => QueryUpdate::Ineligible,
        }
    }
}
