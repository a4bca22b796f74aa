pub mod query;
pub mod request;
pub mod snapshot;
pub mod state;
pub mod store;
