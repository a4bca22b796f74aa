use crate::model::card::Card;
use crate::model::slots::{PlacementError, PositionGroup, Positions};

/// Card selection and slot assignment.
///
/// Two invariants hold after every operation: a card id occupies at most one
/// slot across all groups, and the selected card is never also on the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    selected_card: Option<Card>,
    positions: Positions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected,
    Deselected,
    /// The card already sits in a slot and cannot be selected.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOutcome {
    /// The slot was occupied; its card went back to the pool and any selection was dropped.
    PickedUp(Card),
    Placed(Card),
    /// Empty slot and nothing selected.
    Ignored,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_card(&self) -> Option<&Card> {
        self.selected_card.as_ref()
    }

    pub fn positions(&self) -> &Positions {
        &self.positions
    }

    pub fn is_card_used(&self, id: &str) -> bool {
        self.positions.contains(id)
    }

    pub fn is_initial(&self) -> bool {
        self.selected_card.is_none() && self.positions.occupied_count() == 0
    }

    pub fn select_card(&mut self, card: Card) -> SelectOutcome {
        if self.is_card_used(card.id()) {
            return SelectOutcome::Ignored;
        }
        if self.selected_card.as_ref() == Some(&card) {
            self.selected_card = None;
            SelectOutcome::Deselected
        } else {
            self.selected_card = Some(card);
            SelectOutcome::Selected
        }
    }

    pub fn place_card(
        &mut self,
        group: PositionGroup,
        index: usize,
    ) -> Result<PlaceOutcome, PlacementError> {
        let slot = self.positions.slot_mut(group, index)?;
        if let Some(current) = slot.take() {
            self.selected_card = None;
            return Ok(PlaceOutcome::PickedUp(current));
        }
        match self.selected_card.take() {
            Some(card) => {
                *slot = Some(card.clone());
                Ok(PlaceOutcome::Placed(card))
            }
            None => Ok(PlaceOutcome::Ignored),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn count_of(state: &GameState, id: &str) -> usize {
        PositionGroup::ALL
            .iter()
            .map(|group| {
                state
                    .positions()
                    .occupied(*group)
                    .filter(|card| card.id() == id)
                    .count()
            })
            .sum()
    }

    fn assert_invariants(state: &GameState) {
        for group in PositionGroup::ALL {
            for card in state.positions().occupied(group) {
                assert_eq!(count_of(state, card.id()), 1, "{} placed twice", card);
            }
        }
        if let Some(selected) = state.selected_card() {
            assert!(!state.is_card_used(selected.id()));
        }
    }

    #[test]
    fn selecting_a_new_card_replaces_the_old_one() {
        let mut state = GameState::new();
        state.select_card(Card::new("AS"));
        state.select_card(Card::new("KD"));
        assert_eq!(state.selected_card(), Some(&Card::new("KD")));
    }

    #[test]
    fn selecting_twice_deselects() {
        let mut state = GameState::new();
        assert_eq!(state.select_card(Card::new("AS")), SelectOutcome::Selected);
        assert_eq!(state.select_card(Card::new("AS")), SelectOutcome::Deselected);
        assert!(state.selected_card().is_none());
    }

    #[test]
    fn placed_card_cannot_be_selected() {
        let mut state = GameState::new();
        state.select_card(Card::new("AS"));
        state.place_card(PositionGroup::PlayerCards, 0).unwrap();
        assert_eq!(state.select_card(Card::new("AS")), SelectOutcome::Ignored);
        assert!(state.selected_card().is_none());
        assert_invariants(&state);
    }

    #[test]
    fn placing_moves_selection_into_slot() {
        let mut state = GameState::new();
        state.select_card(Card::new("9C"));
        let outcome = state.place_card(PositionGroup::BoardCards, 4).unwrap();
        assert_eq!(outcome, PlaceOutcome::Placed(Card::new("9C")));
        assert!(state.selected_card().is_none());
        assert_eq!(
            state.positions().get(PositionGroup::BoardCards, 4).unwrap(),
            Some(&Card::new("9C"))
        );
    }

    #[test]
    fn pickup_clears_unrelated_selection() {
        let mut state = GameState::new();
        state.select_card(Card::new("QH"));
        state.place_card(PositionGroup::BoardCards, 0).unwrap();
        state.select_card(Card::new("2D"));

        let outcome = state.place_card(PositionGroup::BoardCards, 0).unwrap();

        assert_eq!(outcome, PlaceOutcome::PickedUp(Card::new("QH")));
        assert!(state.selected_card().is_none());
        assert_eq!(state.positions().get(PositionGroup::BoardCards, 0).unwrap(), None);
        assert!(!state.is_card_used("2D"));
    }

    #[test]
    fn empty_slot_without_selection_is_ignored() {
        let mut state = GameState::new();
        let before = state.clone();
        assert_eq!(
            state.place_card(PositionGroup::OpponentCards, 1).unwrap(),
            PlaceOutcome::Ignored
        );
        assert_eq!(state, before);
    }

    #[test]
    fn invalid_index_leaves_state_untouched() {
        let mut state = GameState::new();
        state.select_card(Card::new("JC"));
        let before = state.clone();
        assert!(state.place_card(PositionGroup::PlayerCards, 2).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn no_other_slot_is_altered() {
        let mut state = GameState::new();
        state.select_card(Card::new("AS"));
        state.place_card(PositionGroup::PlayerCards, 0).unwrap();
        state.select_card(Card::new("KS"));
        state.place_card(PositionGroup::OpponentCards, 0).unwrap();
        state.select_card(Card::new("QS"));
        state.place_card(PositionGroup::BoardCards, 2).unwrap();

        state.place_card(PositionGroup::OpponentCards, 0).unwrap();

        assert!(state.is_card_used("AS"));
        assert!(state.is_card_used("QS"));
        assert!(!state.is_card_used("KS"));
    }

    #[test]
    fn random_walk_keeps_cards_unique() {
        let ids = ["AS", "KD", "7H", "2C", "TD"];
        let mut state = GameState::new();
        let mut rng = SmallRng::seed_from_u64(17);
        for _ in 0..500 {
            if rng.gen_bool(0.5) {
                state.select_card(Card::new(ids[rng.gen_range(0..ids.len())]));
            } else {
                let group = PositionGroup::ALL[rng.gen_range(0..PositionGroup::ALL.len())];
                let _ = state.place_card(group, rng.gen_range(0..group.len()));
            }
            assert_invariants(&state);
        }
    }

    #[test]
    fn reset_returns_to_initial_value() {
        let mut state = GameState::new();
        state.select_card(Card::new("AS"));
        state.place_card(PositionGroup::PlayerCards, 1).unwrap();
        state.select_card(Card::new("3D"));
        state.reset();
        assert!(state.is_initial());
        assert_eq!(state, GameState::new());
    }
}
