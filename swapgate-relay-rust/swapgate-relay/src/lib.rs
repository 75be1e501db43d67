//! SwapGate relay
//!
//! HTTP boundary in front of the swap core: validates price and quote
//! requests, forwards them to the aggregator, and maps failures to stable
//! status codes without leaking upstream bodies.

pub mod api;
pub mod domain;
pub mod infrastructure;
pub mod middleware;
