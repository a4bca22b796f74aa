pub mod controller;
pub mod estimator;
pub mod http;
pub mod probability;
pub mod session;

pub use controller::{
    Completion, EquityQueryController, IssuedQuery, QueryFailure, ResultSubscription, Trigger,
};
pub use estimator::{EquityEstimator, RemoteError};
pub use http::{EndpointConfig, HttpEstimator};
pub use probability::ProbabilityResult;
pub use session::EquitySession;
