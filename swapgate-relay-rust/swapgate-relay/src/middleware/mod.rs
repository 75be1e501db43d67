pub mod rate_limiting;

pub use rate_limiting::{
    InMemoryRateLimitStore, RateLimitDecision, RateLimitPolicy, RateLimitStore, RateLimitingMiddleware,
};
