//! DLMS/COSEM client implementation
//!
//! Head-end side of the protocol: configuration, one-shot sessions with a
//! meter, transaction tracking and the resilient communication service.
//!
//! - [`DlmsConfig`]: every tunable, serde-friendly
//! - [`DlmsProtocol`]: connect, Get/Set, close against one meter
//! - [`MeterTransactionManager`]: registry of in-flight transactions with a
//!   timeout sweeper
//! - [`MeterCommunicationService`]: spawns one task per call, with retry,
//!   per-meter circuit breaking and metrics
//! - [`MeterCommandService`]: ping and relay commands recorded as
//!   transactions, dialled again while the retry budget allows

pub mod commands;
pub mod config;
pub mod connection;
pub mod metrics;
pub mod resilience;
pub mod service;
pub mod transaction;

#[cfg(test)]
mod testing;

pub use commands::MeterCommandService;
pub use config::DlmsConfig;
pub use connection::{ConnectionBuilder, Connector, DlmsProtocol, TcpConnector};
pub use metrics::{CommunicationMetrics, MetricsSnapshot};
pub use resilience::{CircuitBreaker, CircuitState, RetryPolicy};
pub use service::MeterCommunicationService;
pub use transaction::{MeterTransaction, MeterTransactionManager, TransactionStatus, TransactionType};
