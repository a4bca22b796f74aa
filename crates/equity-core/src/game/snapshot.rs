use super::state::GameState;
use crate::model::card::Card;
use crate::model::slots::PositionGroup;
use serde::{Deserialize, Serialize};

/// Display snapshot of a [`GameState`] in the client's JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub selected_card: Option<Card>,
    pub positions: PositionsSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionsSnapshot {
    pub player_cards: Vec<Option<Card>>,
    pub opponent_cards: Vec<Option<Card>>,
    pub board_cards: Vec<Option<Card>>,
}

impl GameSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let group = |group: PositionGroup| state.positions().slots(group).to_vec();
        GameSnapshot {
            selected_card: state.selected_card().cloned(),
            positions: PositionsSnapshot {
                player_cards: group(PositionGroup::PlayerCards),
                opponent_cards: group(PositionGroup::OpponentCards),
                board_cards: group(PositionGroup::BoardCards),
            },
        }
    }

    pub fn to_json(state: &GameState) -> serde_json::Result<String> {
        let snapshot = Self::capture(state);
        serde_json::to_string_pretty(&snapshot)
    }

    /// Compact single-line rendering, `--` for empty slots.
    pub fn render(&self) -> String {
        let row = |slots: &[Option<Card>]| {
            slots
                .iter()
                .map(|slot| slot.as_ref().map_or("--", Card::id))
                .collect::<Vec<_>>()
                .join(" ")
        };
        format!(
            "player [{}] opponent [{}] board [{}] selected {}",
            row(&self.positions.player_cards),
            row(&self.positions.opponent_cards),
            row(&self.positions.board_cards),
            self.selected_card.as_ref().map_or("-", Card::id)
        )
    }
}
