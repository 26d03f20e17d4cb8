//! Report freshness: snapshot polling, time-filter selection and the
//! background poll loop.

pub mod engine;
pub mod poller;

pub use engine::{FilterTag, PollOutcome, SyncEngine};
pub use poller::Poller;
