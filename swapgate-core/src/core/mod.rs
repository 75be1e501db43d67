//! Core swap functionality
//!
//! Leaves first: amount conversion, slippage codec and token directory are
//! pure; the aggregator client and transaction collaborators talk to the
//! network; the orchestrator ties them together.

pub mod amount;
pub mod slippage;
pub mod tokens;
pub mod aggregator;
pub mod transactions;
pub mod orchestrator;
