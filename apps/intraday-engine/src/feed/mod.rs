//! Tick sources.
//!
//! Live market data arrives through the (external) transport layer; this
//! module provides the deterministic random-walk feed the binary uses to
//! run the whole pipeline without a broker.

mod sim;

pub use sim::{SimFeed, SimFeedConfig};
