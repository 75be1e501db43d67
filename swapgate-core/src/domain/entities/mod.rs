//! Domain entities and value objects

pub mod token;
pub mod network;
pub mod intent;

// Re-export entities
pub use token::*;
pub use network::*;
pub use intent::*;
