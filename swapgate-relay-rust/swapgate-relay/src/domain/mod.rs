pub mod error;

pub use error::{ConfigError, RelayError, SwapContext, ValidationError};
