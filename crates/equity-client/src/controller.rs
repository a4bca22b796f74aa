//! Reacts to query-key changes and owns the published probability result.

use crate::estimator::RemoteError;
use crate::probability::ProbabilityResult;
use equity_core::game::query::{QueryKey, QueryUpdate};
use equity_core::game::request::{EquityRequest, EquityResult, RequestError, SimulationParams};
use equity_core::model::encoding::EncodingError;
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultSubscription(u64);

type ResultListener = Box<dyn FnMut(&ProbabilityResult) + Send>;

/// A request the caller must dispatch to the estimator and report back through
/// [`EquityQueryController::complete`] with the same sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedQuery {
    pub sequence: u64,
    pub request: EquityRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Issue(IssuedQuery),
    Cleared,
    /// Same eligible key as the last one seen.
    Unchanged,
    /// The key could not be turned into a request; nothing was sent.
    Rejected(QueryFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Published(ProbabilityResult),
    /// Superseded by a newer request or by a clear; dropped silently.
    Stale,
    Failed(RemoteError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryFailure {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub struct EquityQueryController {
    params: SimulationParams,
    next_sequence: u64,
    latest: Option<u64>,
    last_key: Option<QueryKey>,
    published: ProbabilityResult,
    last_failure: Option<QueryFailure>,
    listeners: Vec<(ResultSubscription, ResultListener)>,
    next_subscription: u64,
}

impl Default for EquityQueryController {
    fn default() -> Self {
        Self::new(SimulationParams::default())
    }
}

impl EquityQueryController {
    pub fn new(params: SimulationParams) -> Self {
        Self {
            params: params.normalized(),
            next_sequence: 1,
            latest: None,
            last_key: None,
            published: ProbabilityResult::default(),
            last_failure: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn params(&self) -> SimulationParams {
        self.params
    }

    pub fn published(&self) -> &ProbabilityResult {
        &self.published
    }

    /// Last encoding or remote failure, cleared by the next published result.
    pub fn last_failure(&self) -> Option<&QueryFailure> {
        self.last_failure.as_ref()
    }

    /// Sequence number of the request whose completion may still publish.
    pub fn in_flight(&self) -> Option<u64> {
        self.latest
    }

    pub fn subscribe(
        &mut self,
        mut listener: impl FnMut(&ProbabilityResult) + Send + 'static,
    ) -> ResultSubscription {
        let id = ResultSubscription(self.next_subscription);
        self.next_subscription += 1;
        listener(&self.published);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ResultSubscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn on_query_update(&mut self, update: &QueryUpdate) -> Trigger {
        match update {
            QueryUpdate::Eligible(key) => self.issue(key),
            QueryUpdate::Ineligible => {
                self.clear();
                Trigger::Cleared
            }
        }
    }

    /// Drops any in-flight request and publishes the zero result.
    pub fn clear(&mut self) {
        self.last_key = None;
        self.latest = None;
        self.last_failure = None;
        if !self.published.is_zero() {
            self.published = ProbabilityResult::default();
            event!(
                target: "equity_client::controller",
                Level::DEBUG,
                "published result cleared"
            );
            self.notify();
        }
    }

    fn issue(&mut self, key: &QueryKey) -> Trigger {
        if self.last_key.as_ref() == Some(key) {
            return Trigger::Unchanged;
        }
        self.last_key = Some(key.clone());

        let request = match build_request(key, self.params) {
            Ok(request) => request,
            Err(failure) => {
                // Older requests belong to a superseded key.
                self.latest = None;
                event!(
                    target: "equity_client::controller",
                    Level::WARN,
                    error = %failure,
                    "equity query not sent"
                );
                self.last_failure = Some(failure.clone());
                return Trigger::Rejected(failure);
            }
        };

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.latest = Some(sequence);
        event!(
            target: "equity_client::controller",
            Level::INFO,
            sequence,
            player = request.player_cards.len(),
            opponent = request.opponent_cards.len(),
            community = request.community_cards.len(),
            cards = %request.describe(),
            "equity query issued"
        );
        Trigger::Issue(IssuedQuery { sequence, request })
    }

    pub fn complete(
        &mut self,
        sequence: u64,
        outcome: Result<EquityResult, RemoteError>,
    ) -> Completion {
        if self.latest != Some(sequence) {
            event!(
                target: "equity_client::controller",
                Level::DEBUG,
                sequence,
                latest = ?self.latest,
                "stale equity response discarded"
            );
            return Completion::Stale;
        }
        self.latest = None;

        let result = match outcome.and_then(|result| {
            result
                .validate()
                .map(|_| result)
                .map_err(|err| RemoteError::Malformed(err.to_string()))
        }) {
            Ok(result) => result,
            Err(err) => {
                event!(
                    target: "equity_client::controller",
                    Level::WARN,
                    sequence,
                    error = %err,
                    "equity query failed; keeping previous result"
                );
                self.last_failure = Some(QueryFailure::Remote(err.clone()));
                return Completion::Failed(err);
            }
        };

        self.published = ProbabilityResult::from(&result);
        self.last_failure = None;
        event!(
            target: "equity_client::controller",
            Level::INFO,
            sequence,
            win = self.published.win_probability,
            lose = self.published.lose_probability,
            tie = self.published.tie_probability,
            iterations = self.published.iterations,
            "equity result published"
        );
        self.notify();
        Completion::Published(self.published)
    }

    fn notify(&mut self) {
        let published = self.published;
        for (_, listener) in self.listeners.iter_mut() {
            listener(&published);
        }
    }
}

fn build_request(key: &QueryKey, params: SimulationParams) -> Result<EquityRequest, QueryFailure> {
    let request = EquityRequest::from_key(key, params)?;
    request.validate()?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use equity_core::game::store::GameStore;
    use equity_core::model::card::Card;
    use equity_core::model::slots::PositionGroup;
    use std::sync::{Arc, Mutex};

    fn place(store: &mut GameStore, id: &str, group: PositionGroup, index: usize) -> Option<QueryUpdate> {
        store.select_card(Card::new(id));
        store.place_card(group, index).unwrap().query
    }

    fn issued(trigger: Trigger) -> IssuedQuery {
        match trigger {
            Trigger::Issue(query) => query,
            other => panic!("expected an issued query, got {other:?}"),
        }
    }

    fn result(win: f64, iterations: u64) -> EquityResult {
        EquityResult {
            win_probability: win,
            lose_probability: 1.0 - win,
            tie_probability: 0.0,
            iterations,
        }
    }

    fn heads_up(store: &mut GameStore, controller: &mut EquityQueryController) -> IssuedQuery {
        place(store, "AS", PositionGroup::PlayerCards, 0);
        let update = place(store, "KD", PositionGroup::PlayerCards, 1).expect("eligible");
        issued(controller.on_query_update(&update))
    }

    #[test]
    fn eligible_key_issues_request_and_publishes_percentages() {
        let mut store = GameStore::new();
        let mut controller = EquityQueryController::default();
        let query = heads_up(&mut store, &mut controller);

        assert_eq!(query.request.player_cards.len(), 2);
        assert_eq!(query.request.player_cards[0].rank, 14);
        assert_eq!(query.request.player_cards[1].suit, 1);

        let completion = controller.complete(query.sequence, Ok(result(0.65, 100_000)));
        assert!(matches!(completion, Completion::Published(_)));
        assert!((controller.published().win_probability - 65.0).abs() < 1e-9);
        assert_eq!(controller.published().iterations, 100_000);
        assert_eq!(controller.in_flight(), None);
    }

    #[test]
    fn newer_request_wins_over_late_older_response() {
        let mut store = GameStore::new();
        let mut controller = EquityQueryController::default();
        let first = heads_up(&mut store, &mut controller);
        let update = place(&mut store, "7C", PositionGroup::BoardCards, 0).unwrap();
        let second = issued(controller.on_query_update(&update));
        assert!(second.sequence > first.sequence);

        controller.complete(second.sequence, Ok(result(0.4, 200)));
        let late = controller.complete(first.sequence, Ok(result(0.9, 100)));

        assert_eq!(late, Completion::Stale);
        assert!((controller.published().win_probability - 40.0).abs() < 1e-9);
        assert_eq!(controller.published().iterations, 200);
    }

    #[test]
    fn older_response_arriving_first_is_also_dropped() {
        let mut store = GameStore::new();
        let mut controller = EquityQueryController::default();
        let first = heads_up(&mut store, &mut controller);
        let update = place(&mut store, "7C", PositionGroup::OpponentCards, 0).unwrap();
        let second = issued(controller.on_query_update(&update));

        assert_eq!(
            controller.complete(first.sequence, Ok(result(0.9, 100))),
            Completion::Stale
        );
        assert!(controller.published().is_zero());
        assert!(matches!(
            controller.complete(second.sequence, Ok(result(0.3, 100))),
            Completion::Published(_)
        ));
    }

    #[test]
    fn losing_eligibility_clears_and_discards_in_flight() {
        let mut store = GameStore::new();
        let mut controller = EquityQueryController::default();
        let first = heads_up(&mut store, &mut controller);
        controller.complete(first.sequence, Ok(result(0.5, 10)));
        assert!(!controller.published().is_zero());

        let update = place(&mut store, "8D", PositionGroup::BoardCards, 0).unwrap();
        let pending = issued(controller.on_query_update(&update)).sequence;
        assert_eq!(controller.in_flight(), Some(pending));

        let update = store.place_card(PositionGroup::PlayerCards, 1).unwrap().query.unwrap();
        assert_eq!(controller.on_query_update(&update), Trigger::Cleared);
        assert!(controller.published().is_zero());
        assert_eq!(controller.complete(pending, Ok(result(0.7, 10))), Completion::Stale);
        assert!(controller.published().is_zero());
    }

    #[test]
    fn remote_failure_keeps_previous_result() {
        let mut store = GameStore::new();
        let mut controller = EquityQueryController::default();
        let first = heads_up(&mut store, &mut controller);
        controller.complete(first.sequence, Ok(result(0.5, 10)));
        let before = *controller.published();

        let update = place(&mut store, "8D", PositionGroup::BoardCards, 0).unwrap();
        let second = issued(controller.on_query_update(&update));
        let completion = controller.complete(second.sequence, Err(RemoteError::Timeout));

        assert_eq!(completion, Completion::Failed(RemoteError::Timeout));
        assert_eq!(*controller.published(), before);
        assert_eq!(
            controller.last_failure(),
            Some(&QueryFailure::Remote(RemoteError::Timeout))
        );
    }

    #[test]
    fn malformed_response_is_a_failure() {
        let mut store = GameStore::new();
        let mut controller = EquityQueryController::default();
        let query = heads_up(&mut store, &mut controller);
        let completion = controller.complete(query.sequence, Ok(result(1.5, 10)));
        assert!(matches!(completion, Completion::Failed(RemoteError::Malformed(_))));
        assert!(controller.published().is_zero());
    }

    #[test]
    fn unknown_rank_fails_closed() {
        let mut store = GameStore::new();
        let mut controller = EquityQueryController::default();
        let first = heads_up(&mut store, &mut controller);
        controller.complete(first.sequence, Ok(result(0.5, 10)));

        let update = place(&mut store, "XH", PositionGroup::BoardCards, 0).unwrap();
        let trigger = controller.on_query_update(&update);

        assert!(matches!(trigger, Trigger::Rejected(QueryFailure::Encoding(_))));
        assert_eq!(controller.in_flight(), None);
        assert!((controller.published().win_probability - 50.0).abs() < 1e-9);
    }

    #[test]
    fn same_key_is_not_reissued() {
        let mut store = GameStore::new();
        let mut controller = EquityQueryController::default();
        place(&mut store, "AS", PositionGroup::PlayerCards, 0);
        let update = place(&mut store, "KD", PositionGroup::PlayerCards, 1).unwrap();
        issued(controller.on_query_update(&update));
        assert_eq!(controller.on_query_update(&update), Trigger::Unchanged);
    }

    #[test]
    fn listeners_receive_published_and_cleared_values() {
        let mut store = GameStore::new();
        let mut controller = EquityQueryController::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.subscribe(move |published| sink.lock().unwrap().push(published.iterations));

        let query = heads_up(&mut store, &mut controller);
        controller.complete(query.sequence, Ok(result(0.5, 42)));
        controller.clear();

        assert_eq!(*seen.lock().unwrap(), vec![0, 42, 0]);
    }
}
