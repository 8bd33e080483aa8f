//! Per-meter circuit breaker
//!
//! ```text
//!          threshold consecutive failures
//! Closed ---------------------------------> Open
//!   ^                                        | cool-down elapsed
//!   |  trial succeeds                        v
//!   +-------------------------------- HalfOpen (one trial call)
//!                      trial fails: back to Open
//! ```

use dlms_core::{DlmsError, DlmsResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => f.write_str("closed"),
            CircuitState::Open => f.write_str("open"),
            CircuitState::HalfOpen => f.write_str("half-open"),
        }
    }
}

#[derive(Debug)]
enum Inner {
    Closed { consecutive_failures: u32 },
    Open { until: Instant },
    HalfOpen,
}

/// Breaker guarding one target
#[derive(Debug)]
pub struct CircuitBreaker {
    target: String,
    threshold: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(target: impl Into<String>, threshold: u32, cooldown: Duration) -> Self {
        Self {
            target: target.into(),
            threshold: threshold.max(1),
            cooldown,
            inner: Mutex::new(Inner::Closed {
                consecutive_failures: 0,
            }),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn state(&self) -> CircuitState {
        match *self.inner.lock() {
            Inner::Closed { .. } => CircuitState::Closed,
            Inner::Open { .. } => CircuitState::Open,
            Inner::HalfOpen => CircuitState::HalfOpen,
        }
    }

    /// Permission to make a call
    ///
    /// Fails with [`DlmsError::Unavailable`] while open, and while the single
    /// half-open trial is in flight.
    pub fn try_acquire(&self) -> DlmsResult<()> {
        let mut inner = self.inner.lock();
        match *inner {
            Inner::Closed { .. } => Ok(()),
            Inner::Open { until } if Instant::now() >= until => {
                log::info!("Circuit for {} half-open, allowing a trial call", self.target);
                *inner = Inner::HalfOpen;
                Ok(())
            }
            Inner::Open { .. } | Inner::HalfOpen => Err(DlmsError::Unavailable(format!(
                "circuit open for {}",
                self.target
            ))),
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if !matches!(*inner, Inner::Closed { .. }) {
            log::info!("Circuit for {} closed", self.target);
        }
        *inner = Inner::Closed {
            consecutive_failures: 0,
        };
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        let failures = match *inner {
            Inner::Closed {
                consecutive_failures,
            } => consecutive_failures + 1,
            Inner::HalfOpen => self.threshold,
            // a call admitted before the breaker opened
            Inner::Open { .. } => return,
        };

        if failures >= self.threshold {
            log::warn!(
                "Circuit for {} opened after {} consecutive failures",
                self.target,
                failures
            );
            *inner = Inner::Open {
                until: Instant::now() + self.cooldown,
            };
        } else {
            *inner = Inner::Closed {
                consecutive_failures: failures,
            };
        }
    }
}

/// Lazily created breakers keyed by `address:port`
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    threshold: u32,
    cooldown: Duration,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    pub fn for_target(&self, target: &str) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.breakers.read().get(target) {
            return Arc::clone(breaker);
        }
        let mut breakers = self.breakers.write();
        Arc::clone(
            breakers
                .entry(target.to_string())
                .or_insert_with(|| Arc::new(CircuitBreaker::new(target, self.threshold, self.cooldown))),
        )
    }

    /// State of a target's breaker; targets never seen are closed
    pub fn state(&self, target: &str) -> CircuitState {
        self.breakers
            .read()
            .get(target)
            .map(|b| b.state())
            .unwrap_or(CircuitState::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(30);

    fn tripped() -> CircuitBreaker {
        let breaker = CircuitBreaker::new("10.0.0.1:4059", 5, COOLDOWN);
        for _ in 0..5 {
            breaker.try_acquire().unwrap();
            breaker.record_failure();
        }
        breaker
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_after_threshold() {
        let breaker = CircuitBreaker::new("10.0.0.1:4059", 5, COOLDOWN);
        for _ in 0..4 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        let err = breaker.try_acquire().unwrap_err();
        assert!(matches!(err, DlmsError::Unavailable(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failure_count() {
        let breaker = CircuitBreaker::new("10.0.0.1:4059", 3, COOLDOWN);
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_trial_success_closes() {
        let breaker = tripped();
        tokio::time::advance(COOLDOWN - Duration::from_millis(1)).await;
        assert!(breaker.try_acquire().is_err());

        tokio::time::advance(Duration::from_millis(1)).await;
        breaker.try_acquire().unwrap();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        // only one trial at a time
        assert!(breaker.try_acquire().is_err());

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_trial_failure_reopens() {
        let breaker = tripped();
        tokio::time::advance(COOLDOWN).await;
        breaker.try_acquire().unwrap();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.try_acquire().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_is_per_target() {
        let registry = CircuitBreakerRegistry::new(1, COOLDOWN);
        registry.for_target("10.0.0.1:4059").record_failure();

        assert_eq!(registry.state("10.0.0.1:4059"), CircuitState::Open);
        assert_eq!(registry.state("10.0.0.2:4059"), CircuitState::Closed);
        assert!(registry.for_target("10.0.0.2:4059").try_acquire().is_ok());
        assert!(Arc::ptr_eq(
            &registry.for_target("10.0.0.1:4059"),
            &registry.for_target("10.0.0.1:4059")
        ));
    }
}
