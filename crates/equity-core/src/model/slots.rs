use crate::model::card::Card;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PositionGroup {
    PlayerCards,
    OpponentCards,
    BoardCards,
}

impl PositionGroup {
    pub const ALL: [PositionGroup; 3] = [
        PositionGroup::PlayerCards,
        PositionGroup::OpponentCards,
        PositionGroup::BoardCards,
    ];

    pub const fn len(self) -> usize {
        match self {
            PositionGroup::PlayerCards => 2,
            PositionGroup::OpponentCards => 2,
            PositionGroup::BoardCards => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PositionGroup::PlayerCards => "playerCards",
            PositionGroup::OpponentCards => "opponentCards",
            PositionGroup::BoardCards => "boardCards",
        }
    }
}

impl fmt::Display for PositionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionGroup {
    type Err = PlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "playerCards" | "player" => Ok(PositionGroup::PlayerCards),
            "opponentCards" | "opponent" => Ok(PositionGroup::OpponentCards),
            "boardCards" | "board" | "communityCards" => Ok(PositionGroup::BoardCards),
            other => Err(PlacementError::UnknownGroup(other.to_string())),
        }
    }
}

/// Structurally invalid placement calls. Normal misuse (occupied slot, card
/// already on the table) is never an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("unknown position group {0:?}")]
    UnknownGroup(String),
    #[error("slot index {index} is out of range for {group} (length {len})")]
    IndexOutOfRange {
        group: PositionGroup,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Positions {
    player_cards: [Option<Card>; 2],
    opponent_cards: [Option<Card>; 2],
    board_cards: [Option<Card>; 5],
}

impl Positions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self, group: PositionGroup) -> &[Option<Card>] {
        match group {
            PositionGroup::PlayerCards => &self.player_cards,
            PositionGroup::OpponentCards => &self.opponent_cards,
            PositionGroup::BoardCards => &self.board_cards,
        }
    }

    fn slots_mut(&mut self, group: PositionGroup) -> &mut [Option<Card>] {
        match group {
            PositionGroup::PlayerCards => &mut self.player_cards,
            PositionGroup::OpponentCards => &mut self.opponent_cards,
            PositionGroup::BoardCards => &mut self.board_cards,
        }
    }

    pub fn get(&self, group: PositionGroup, index: usize) -> Result<Option<&Card>, PlacementError> {
        check_index(group, index)?;
        Ok(self.slots(group)[index].as_ref())
    }

    /// Mutable access to one slot after bounds checking.
    pub fn slot_mut(
        &mut self,
        group: PositionGroup,
        index: usize,
    ) -> Result<&mut Option<Card>, PlacementError> {
        check_index(group, index)?;
        Ok(&mut self.slots_mut(group)[index])
    }

    /// Occupied cards of a group in slot order, empty slots skipped.
    pub fn occupied(&self, group: PositionGroup) -> impl Iterator<Item = &Card> {
        self.slots(group).iter().flatten()
    }

    pub fn contains(&self, id: &str) -> bool {
        PositionGroup::ALL
            .iter()
            .any(|group| self.occupied(*group).any(|card| card.id() == id))
    }

    pub fn occupied_count(&self) -> usize {
        PositionGroup::ALL
            .iter()
            .map(|group| self.occupied(*group).count())
            .sum()
    }
}

fn check_index(group: PositionGroup, index: usize) -> Result<(), PlacementError> {
    if index >= group.len() {
        return Err(PlacementError::IndexOutOfRange {
            group,
            index,
            len: group.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_have_fixed_lengths() {
        let positions = Positions::new();
        for group in PositionGroup::ALL {
            assert_eq!(positions.slots(group).len(), group.len());
        }
    }

    #[test]
    fn group_names_parse() {
        assert_eq!("playerCards".parse::<PositionGroup>(), Ok(PositionGroup::PlayerCards));
        assert_eq!("board".parse::<PositionGroup>(), Ok(PositionGroup::BoardCards));
        assert_eq!(
            "muck".parse::<PositionGroup>(),
            Err(PlacementError::UnknownGroup("muck".to_string()))
        );
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut positions = Positions::new();
        let err = positions.slot_mut(PositionGroup::OpponentCards, 2).unwrap_err();
        assert_eq!(
            err,
            PlacementError::IndexOutOfRange {
                group: PositionGroup::OpponentCards,
                index: 2,
                len: 2
            }
        );
        assert!(positions.get(PositionGroup::BoardCards, 4).is_ok());
    }

    #[test]
    fn occupied_preserves_slot_order_and_skips_gaps() {
        let mut positions = Positions::new();
        *positions.slot_mut(PositionGroup::BoardCards, 3).unwrap() = Some(Card::new("7H"));
        *positions.slot_mut(PositionGroup::BoardCards, 1).unwrap() = Some(Card::new("2C"));
        let ids: Vec<&str> = positions
            .occupied(PositionGroup::BoardCards)
            .map(Card::id)
            .collect();
        assert_eq!(ids, vec!["2C", "7H"]);
        assert!(positions.contains("7H"));
        assert!(!positions.contains("7D"));
        assert_eq!(positions.occupied_count(), 2);
    }
}
