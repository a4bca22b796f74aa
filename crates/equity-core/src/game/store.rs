//! Owned game state with change notification.

use crate::game::query::{QueryKey, QueryUpdate};
use crate::game::state::{GameState, PlaceOutcome, SelectOutcome};
use crate::model::card::Card;
use crate::model::slots::{PlacementError, PositionGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&GameState) + Send>;

/// Result of a store mutation. `query` is set only when the derived query key
/// differs from the one before the mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation<T> {
    pub outcome: T,
    pub query: Option<QueryUpdate>,
}

/// Single owner of the [`GameState`].
///
/// Every mutation recomputes the query key; listeners see the new state after
/// the whole operation has been applied.
pub struct GameStore {
    state: GameState,
    query: Option<QueryKey>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStore {
    pub fn new() -> Self {
        Self {
            state: GameState::new(),
            query: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn query_key(&self) -> Option<&QueryKey> {
        self.query.as_ref()
    }

    /// Registers a listener and immediately calls it with the current state.
    pub fn subscribe(
        &mut self,
        mut listener: impl FnMut(&GameState) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        listener(&self.state);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn select_card(&mut self, card: Card) -> SelectOutcome {
        let outcome = self.state.select_card(card);
        if outcome != SelectOutcome::Ignored {
            self.notify();
        }
        outcome
    }

    pub fn place_card(
        &mut self,
        group: PositionGroup,
        index: usize,
    ) -> Result<Mutation<PlaceOutcome>, PlacementError> {
        let outcome = self.state.place_card(group, index)?;
        if outcome == PlaceOutcome::Ignored {
            return Ok(Mutation {
                outcome,
                query: None,
            });
        }
        let query = self.recompute();
        self.notify();
        Ok(Mutation { outcome, query })
    }

    /// Always reports [`QueryUpdate::Ineligible`] so published results get cleared.
    pub fn reset(&mut self) -> Mutation<()> {
        let changed = !self.state.is_initial();
        self.state.reset();
        self.query = None;
        if changed {
            self.notify();
        }
        Mutation {
            outcome: (),
            query: Some(QueryUpdate::Ineligible),
        }
    }

    fn recompute(&mut self) -> Option<QueryUpdate> {
        let next = QueryKey::derive(&self.state);
        if next == self.query {
            return None;
        }
        self.query = next.clone();
        Some(QueryUpdate::from_key(next))
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }
}
