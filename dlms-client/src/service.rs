//! Meter communication service
//!
//! Entry point for callers: one [`communicate`](MeterCommunicationService::communicate)
//! call is one Get or Set against one meter, run as its own tokio task over a
//! fresh [`DlmsProtocol`] session.
//!
//! Opening the session is retried under the [`RetryPolicy`] and guarded by a
//! per-target circuit breaker. Once associated, the meter's answer is final:
//! a data-access error or an exception response is a result, not a reason to
//! dial again.

use crate::config::DlmsConfig;
use crate::connection::{Connector, DlmsProtocol, TcpConnector, CONNECT_FAILED};
use crate::metrics::{CommunicationMetrics, MetricsSnapshot};
use crate::resilience::{CircuitBreakerRegistry, CircuitState, RetryPolicy};
use dlms_application::OperationResult;
use dlms_core::{CosemObject, DataObject, DlmsError, DlmsResult};
use dlms_security::SecuritySuite;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

struct ServiceInner {
    config: Arc<DlmsConfig>,
    security: Arc<SecuritySuite>,
    connector: Arc<dyn Connector>,
    retry: RetryPolicy,
    breakers: CircuitBreakerRegistry,
    metrics: CommunicationMetrics,
}

/// Cheap to clone; clones share the suite, breakers and metrics
#[derive(Clone)]
pub struct MeterCommunicationService {
    inner: Arc<ServiceInner>,
}

impl MeterCommunicationService {
    /// Service over plain TCP
    ///
    /// # Errors
    /// [`DlmsError::Config`] for an invalid configuration or malformed key
    /// material. These are never retried.
    pub fn new(config: DlmsConfig) -> DlmsResult<Self> {
        Self::with_connector(config, Arc::new(TcpConnector))
    }

    pub fn with_connector(config: DlmsConfig, connector: Arc<dyn Connector>) -> DlmsResult<Self> {
        config.validate()?;
        let security = Arc::new(config.security_suite()?);
        let retry = RetryPolicy::default().with_max_retries(config.max_retries);
        let breakers = CircuitBreakerRegistry::new(
            config.circuit_breaker_threshold,
            config.circuit_breaker_cooldown(),
        );
        log::info!(
            "Meter communication service ready (security {:?}, {})",
            security.policy(),
            if config.use_hdlc { "HDLC" } else { "TCP wrapper" }
        );

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config: Arc::new(config),
                security,
                connector,
                retry,
                breakers,
                metrics: CommunicationMetrics::new(),
            }),
        })
    }

    pub fn config(&self) -> &DlmsConfig {
        &self.inner.config
    }

    pub fn security(&self) -> &Arc<SecuritySuite> {
        &self.inner.security
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub fn circuit_state(&self, address: &str, port: u16) -> CircuitState {
        self.inner.breakers.state(&target(address, port))
    }

    /// Read (`is_write == false`) or write `object` on the meter at `address:port`
    ///
    /// Runs on the tokio runtime; dropping the handle does not cancel the
    /// task. The task never fails: every outcome is an [`OperationResult`].
    pub fn communicate(
        &self,
        address: &str,
        port: u16,
        object: CosemObject,
        value: Option<DataObject>,
        is_write: bool,
    ) -> JoinHandle<OperationResult> {
        let inner = Arc::clone(&self.inner);
        let address = address.to_string();
        tokio::spawn(async move { inner.execute(&address, port, object, value, is_write).await })
    }

    pub fn read(&self, address: &str, port: u16, object: CosemObject) -> JoinHandle<OperationResult> {
        self.communicate(address, port, object, None, false)
    }

    pub fn write(
        &self,
        address: &str,
        port: u16,
        object: CosemObject,
        value: DataObject,
    ) -> JoinHandle<OperationResult> {
        self.communicate(address, port, object, Some(value), true)
    }
}

impl ServiceInner {
    async fn execute(
        &self,
        address: &str,
        port: u16,
        object: CosemObject,
        value: Option<DataObject>,
        is_write: bool,
    ) -> OperationResult {
        let start = Instant::now();
        let target = target(address, port);

        let outcome = match (is_write, value.as_ref()) {
            (true, None) => Ok(OperationResult::failure("No value to write")),
            (true, value) => self.with_resilience(&target, address, port, &object, value).await,
            (false, _) => self.with_resilience(&target, address, port, &object, None).await,
        };

        let result = match outcome {
            Ok(result) => result,
            Err(DlmsError::Unavailable(reason)) => {
                self.metrics.record_rejected();
                log::warn!("Rejected call to {}: {}", target, reason);
                OperationResult::from(DlmsError::Unavailable(reason))
            }
            Err(e) => {
                log::error!("Error during meter communication with {}: {}", target, e);
                OperationResult::failure(CONNECT_FAILED)
            }
        };

        let elapsed = start.elapsed();
        if result.success {
            self.metrics.record_success(elapsed);
        } else {
            self.metrics.record_failure(elapsed);
        }
        log::debug!(
            "{} {} on {} in {:?}: {}",
            if is_write { "Set" } else { "Get" },
            object,
            target,
            elapsed,
            result
        );
        result
    }

    async fn with_resilience(
        &self,
        target: &str,
        address: &str,
        port: u16,
        object: &CosemObject,
        value: Option<&DataObject>,
    ) -> DlmsResult<OperationResult> {
        let breaker = self.breakers.for_target(target);
        let breaker = &breaker;
        self.retry
            .run(move |_| async move {
                breaker.try_acquire()?;
                let outcome = self.attempt(address, port, object, value).await;
                match &outcome {
                    Ok(_) => breaker.record_success(),
                    Err(_) => breaker.record_failure(),
                }
                outcome
            })
            .await
    }

    /// One session: open, one operation, close
    ///
    /// `Err` only when the session could not be opened.
    async fn attempt(
        &self,
        address: &str,
        port: u16,
        object: &CosemObject,
        value: Option<&DataObject>,
    ) -> DlmsResult<OperationResult> {
        let mut protocol = DlmsProtocol::new(
            address,
            port,
            Arc::clone(&self.config),
            Arc::clone(&self.security),
            Arc::clone(&self.connector),
        );

        let outcome = match protocol.open().await {
            Ok(()) => Ok(match value {
                Some(value) => protocol.set(object, value).await,
                None => protocol.get(object).await,
            }),
            Err(e) => Err(e),
        };
        protocol.close().await;
        outcome
    }
}

fn target(address: &str, port: u16) -> String {
    format!("{}:{}", address, port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeConnector, MeterBehaviour};
    use std::time::Duration;

    fn config() -> DlmsConfig {
        DlmsConfig::default()
            .with_hdlc(false)
            .with_read_timeout(Duration::from_millis(500))
    }

    fn service(connector: &FakeConnector, config: DlmsConfig) -> MeterCommunicationService {
        MeterCommunicationService::with_connector(config, Arc::new(connector.clone())).unwrap()
    }

    #[test]
    fn test_misconfiguration_is_fatal() {
        let result = MeterCommunicationService::new(DlmsConfig::default().with_authentication_key("xyz"));
        assert!(matches!(result, Err(DlmsError::Config(_))));
    }

    #[tokio::test]
    async fn test_read_success_records_metrics() {
        let connector = FakeConnector::new(MeterBehaviour::Accept);
        let service = service(&connector, config());

        let result = service
            .read("10.0.0.1", 4059, CosemObject::ACTIVE_POWER_IMPORT)
            .await
            .unwrap();
        assert!(result.success, "{:?}", result);
        assert_eq!(result.value, Some(DataObject::Integer(4500)));

        let metrics = service.metrics();
        assert_eq!(metrics.success, 1);
        assert_eq!(metrics.failure, 0);
        assert_eq!(connector.request_tags(), vec![0x60, 0xC0, 0x62]);
    }

    #[tokio::test]
    async fn test_write_success() {
        let connector = FakeConnector::new(MeterBehaviour::Accept);
        let service = service(&connector, config());

        let result = service
            .write("10.0.0.1", 4059, CosemObject::RELAY_CONTROL, DataObject::Boolean(true))
            .await
            .unwrap();
        assert!(result.success, "{:?}", result);
        assert!(result.value.is_none());
    }

    #[tokio::test]
    async fn test_write_without_value() {
        let connector = FakeConnector::new(MeterBehaviour::Accept);
        let service = service(&connector, config());

        let result = service
            .communicate("10.0.0.1", 4059, CosemObject::RELAY_CONTROL, None, true)
            .await
            .unwrap();
        assert_eq!(result.error(), Some("No value to write"));
        assert_eq!(connector.connections(), 0);
        assert_eq!(service.metrics().failure, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_association_is_retried() {
        let connector = FakeConnector::new(MeterBehaviour::RejectAssociation);
        let service = service(&connector, config().with_max_retries(2));

        let result = service.read("10.0.0.1", 4059, CosemObject::CLOCK).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error(), Some(CONNECT_FAILED));
        assert_eq!(connector.connections(), 3);
        assert_eq!(service.metrics().failure, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_on_retry() {
        let connector = FakeConnector::new(MeterBehaviour::RefuseConnection);
        let service = service(&connector, config().with_max_retries(3));

        let handle = service.read("10.0.0.1", 4059, CosemObject::VOLTAGE_L1);
        // let the first attempt fail, then bring the meter back
        tokio::time::sleep(Duration::from_millis(50)).await;
        connector.set_behaviour(MeterBehaviour::Accept);

        let result = handle.await.unwrap();
        assert!(result.success, "{:?}", result);
        assert_eq!(service.circuit_state("10.0.0.1", 4059), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_circuit_opens_and_rejects() {
        let connector = FakeConnector::new(MeterBehaviour::RefuseConnection);
        let service = service(&connector, config().with_max_retries(0));

        for _ in 0..5 {
            let result = service.read("10.0.0.9", 4059, CosemObject::CLOCK).await.unwrap();
            assert_eq!(result.error(), Some(CONNECT_FAILED));
        }
        assert_eq!(service.circuit_state("10.0.0.9", 4059), CircuitState::Open);

        connector.set_behaviour(MeterBehaviour::Accept);
        let result = service.read("10.0.0.9", 4059, CosemObject::CLOCK).await.unwrap();
        assert!(!result.success);
        assert!(result.error().unwrap().contains("circuit open"));
        assert_eq!(connector.connections(), 0);

        // other meters are unaffected
        let result = service.read("10.0.0.10", 4059, CosemObject::CLOCK).await.unwrap();
        assert!(result.success);

        let metrics = service.metrics();
        assert_eq!(metrics.rejected, 1);
        assert_eq!(metrics.failure, 6);
        assert_eq!(metrics.success, 1);

        // after the cool-down one trial call closes the circuit again
        tokio::time::advance(Duration::from_secs(30)).await;
        let result = service.read("10.0.0.9", 4059, CosemObject::CLOCK).await.unwrap();
        assert!(result.success, "{:?}", result);
        assert_eq!(service.circuit_state("10.0.0.9", 4059), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_concurrent_requests() {
        let connector = FakeConnector::new(MeterBehaviour::Accept);
        let service = service(&connector, config());

        let handles: Vec<_> = (0..5)
            .map(|i| service.read(&format!("10.0.0.{}", i), 4059, CosemObject::CURRENT_L1))
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().success);
        }
        assert_eq!(connector.connections(), 5);
        assert_eq!(service.metrics().success, 5);
    }
}
