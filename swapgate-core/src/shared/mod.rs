//! Shared types, utilities, and constants
//!
//! This module contains common types, utilities, and constants used throughout
//! the swap core: the wire shapes exchanged with the aggregator, the error
//! taxonomy, and the fixed chain allow-list.

pub mod types;
pub mod utils;
pub mod constants;
pub mod error;

// Re-export shared components
pub use types::*;
pub use utils::*;
pub use constants::*;
pub use error::*;
