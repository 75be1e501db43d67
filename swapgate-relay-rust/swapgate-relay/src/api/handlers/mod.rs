pub mod swap;

pub use swap::{configure, AppState, SwapRequest};
