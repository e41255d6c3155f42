//! Bulk e-mail dispatch: a fixed pool of workers renders, sends and records
//! one message per recipient.

pub mod cli;
pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod renderer;
pub mod sink;
pub mod source;
pub mod store;
pub mod transport;

pub use dispatcher::{DispatchConfig, DispatchSummary, Dispatcher};
