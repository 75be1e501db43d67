//! Domain layer - entities
//!
//! Tokens, networks and the user's swap intent.

pub mod entities;

// Re-export domain components
pub use entities::*;
