//! Retry and circuit breaking around meter calls

pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerRegistry, CircuitState};
pub use retry::RetryPolicy;
