//! Wires the game store, the query controller and a remote estimator.

use crate::controller::{Completion, EquityQueryController, IssuedQuery, ResultSubscription, Trigger};
use crate::estimator::{EquityEstimator, RemoteError};
use crate::probability::ProbabilityResult;
use equity_core::game::query::QueryUpdate;
use equity_core::game::request::{EquityResult, SimulationParams};
use equity_core::game::state::{GameState, PlaceOutcome, SelectOutcome};
use equity_core::game::store::{GameStore, SubscriptionId};
use equity_core::model::card::Card;
use equity_core::model::slots::{PlacementError, PositionGroup};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

struct Finished {
    sequence: u64,
    outcome: Result<EquityResult, RemoteError>,
}

/// Reports a call exactly once, even when its task panics or is dropped
/// before the estimator answers.
struct Reporter {
    sequence: u64,
    finished_tx: Option<mpsc::UnboundedSender<Finished>>,
}

impl Reporter {
    fn new(sequence: u64, finished_tx: mpsc::UnboundedSender<Finished>) -> Self {
        Self {
            sequence,
            finished_tx: Some(finished_tx),
        }
    }

    fn send(mut self, outcome: Result<EquityResult, RemoteError>) {
        self.deliver(outcome);
    }

    fn deliver(&mut self, outcome: Result<EquityResult, RemoteError>) {
        if let Some(finished_tx) = self.finished_tx.take() {
            // The receiver lives as long as the session.
            let _ = finished_tx.send(Finished {
                sequence: self.sequence,
                outcome,
            });
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        let reason = if std::thread::panicking() {
            "estimator task panicked"
        } else {
            "estimator task cancelled"
        };
        self.deliver(Err(RemoteError::Transport(reason.to_string())));
    }
}

/// UI-facing entry point.
///
/// Mutations are synchronous. Remote calls run as Tokio tasks and their
/// results are applied, in arrival order, only when the owner drains them with
/// [`pump`](Self::pump), [`next_completion`](Self::next_completion) or
/// [`settle`](Self::settle). Calls run on the runtime captured at
/// construction, or on the caller's runtime; without either they fail as
/// transport errors.
pub struct EquitySession {
    store: GameStore,
    controller: EquityQueryController,
    estimator: Arc<dyn EquityEstimator>,
    runtime: Option<Handle>,
    finished_tx: mpsc::UnboundedSender<Finished>,
    finished_rx: mpsc::UnboundedReceiver<Finished>,
    outstanding: usize,
    dispatched: u64,
    last_trigger: Option<Trigger>,
}

impl EquitySession {
    pub fn new(estimator: Arc<dyn EquityEstimator>, params: SimulationParams) -> Self {
        Self::build(estimator, params, Handle::try_current().ok())
    }

    /// Runs remote calls on `runtime` regardless of the calling context.
    pub fn with_runtime(
        estimator: Arc<dyn EquityEstimator>,
        params: SimulationParams,
        runtime: Handle,
    ) -> Self {
        Self::build(estimator, params, Some(runtime))
    }

    fn build(
        estimator: Arc<dyn EquityEstimator>,
        params: SimulationParams,
        runtime: Option<Handle>,
    ) -> Self {
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();
        Self {
            store: GameStore::new(),
            controller: EquityQueryController::new(params),
            estimator,
            runtime,
            finished_tx,
            finished_rx,
            outstanding: 0,
            dispatched: 0,
            last_trigger: None,
        }
    }

    pub fn state(&self) -> &GameState {
        self.store.state()
    }

    pub fn published(&self) -> &ProbabilityResult {
        self.controller.published()
    }

    pub fn controller(&self) -> &EquityQueryController {
        &self.controller
    }

    /// Reaction of the controller to the most recent query-key change.
    pub fn last_trigger(&self) -> Option<&Trigger> {
        self.last_trigger.as_ref()
    }

    /// Like [`last_trigger`](Self::last_trigger), but each reaction is handed out once.
    pub fn take_last_trigger(&mut self) -> Option<Trigger> {
        self.last_trigger.take()
    }

    /// Remote calls started so far, including superseded ones.
    pub fn requests_dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Remote calls whose completion has not been drained yet.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn subscribe_state(
        &mut self,
        listener: impl FnMut(&GameState) + Send + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe_state(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn subscribe_results(
        &mut self,
        listener: impl FnMut(&ProbabilityResult) + Send + 'static,
    ) -> ResultSubscription {
        self.controller.subscribe(listener)
    }

    pub fn unsubscribe_results(&mut self, id: ResultSubscription) -> bool {
        self.controller.unsubscribe(id)
    }

    pub fn select_card(&mut self, card: Card) -> SelectOutcome {
        self.store.select_card(card)
    }

    pub fn place_card(
        &mut self,
        group: PositionGroup,
        index: usize,
    ) -> Result<PlaceOutcome, PlacementError> {
        let mutation = self.store.place_card(group, index)?;
        if let Some(update) = mutation.query {
            self.react(&update);
        }
        Ok(mutation.outcome)
    }

    pub fn reset_game(&mut self) {
        self.store.reset();
        self.react(&QueryUpdate::Ineligible);
    }

    /// Applies every completion that has already arrived, without waiting.
    pub fn pump(&mut self) -> Vec<Completion> {
        let mut applied = Vec::new();
        while let Ok(finished) = self.finished_rx.try_recv() {
            applied.push(self.apply(finished));
        }
        applied
    }

    /// Waits for the next completion. `None` when nothing is outstanding.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.outstanding == 0 {
            return None;
        }
        let finished = self.finished_rx.recv().await?;
        Some(self.apply(finished))
    }

    /// Waits until every dispatched call has completed.
    pub async fn settle(&mut self) -> Vec<Completion> {
        let mut applied = Vec::new();
        while let Some(completion) = self.next_completion().await {
            applied.push(completion);
        }
        applied
    }

    fn react(&mut self, update: &QueryUpdate) {
        let trigger = self.controller.on_query_update(update);
        if let Trigger::Issue(query) = &trigger {
            self.dispatch(query.clone());
        }
        self.last_trigger = Some(trigger);
    }

    fn dispatch(&mut self, query: IssuedQuery) {
        let IssuedQuery { sequence, request } = query;
        let reporter = Reporter::new(sequence, self.finished_tx.clone());
        self.outstanding += 1;
        self.dispatched += 1;
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            reporter.send(Err(RemoteError::Transport(
                "no Tokio runtime to run the estimator on".to_string(),
            )));
            return;
        };
        let estimator = Arc::clone(&self.estimator);
        runtime.spawn(async move {
            let outcome = estimator.estimate_equity(request).await;
            reporter.send(outcome);
        });
    }

    fn apply(&mut self, finished: Finished) -> Completion {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.controller.complete(finished.sequence, finished.outcome)
    }
}
