//! Scheduling and dispatch
//!
//! # Architecture
//!
//! - [`window`]: the inclusive daily posting window
//! - [`backdate`]: slot planner for historical bulk scheduling
//! - [`dispatcher`]: drains due jobs through the generation pipeline
//!
//! The dispatcher never decides *when* it runs; callers (the run loop or an
//! operator-forced run) invoke it and it applies window, quota, and lease
//! checks itself.

pub mod backdate;
pub mod dispatcher;
pub mod error;
pub mod window;

pub use dispatcher::{Dispatcher, RunOutcome};
pub use error::SchedulerError;
pub use window::PostingWindow;
