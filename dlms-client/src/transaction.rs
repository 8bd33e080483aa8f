//! Meter transaction tracking
//!
//! A transaction is the caller-visible unit of work against one meter. It may
//! span several [`DlmsProtocol`](crate::connection::DlmsProtocol) sessions
//! when retried. The registry only holds live transactions: reaching a
//! terminal status stamps the completion time and removes the entry.
//!
//! ```text
//! Initiated -> InProgress -> Completed
//!                  |  ^
//!                  v  |
//!                  Retry
//!              InProgress -> Failed | Timeout
//! ```

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dlms_application::OperationResult;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Attempts allowed after the first one
pub const MAX_TRANSACTION_RETRIES: u32 = 3;

/// Age after which a live transaction is forced into `Timeout`
pub const TRANSACTION_TIMEOUT: Duration = Duration::from_secs(120);

/// Period of the timeout sweeper
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

pub const TIMEOUT_MESSAGE: &str = "Transaction timed out after 120 seconds";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Ping,
    Read,
    Write,
    Connect,
    Disconnect,
    InstantaneousReading,
    EnhancedPing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Initiated,
    InProgress,
    Retry,
    Completed,
    Failed,
    Timeout,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Failed | TransactionStatus::Timeout
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionStatus::Initiated => "INITIATED",
            TransactionStatus::InProgress => "IN_PROGRESS",
            TransactionStatus::Retry => "RETRY",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Timeout => "TIMEOUT",
        };
        f.write_str(name)
    }
}

/// Snapshot of one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterTransaction {
    pub transaction_id: Uuid,
    pub meter_id: String,
    pub ip_address: Option<String>,
    pub port: Option<u16>,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub retry_count: u32,
    pub start_time: DateTime<Utc>,
    pub last_attempt_time: DateTime<Utc>,
    pub completion_time: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub result: Option<OperationResult>,
}

impl MeterTransaction {
    fn new(meter_id: &str, transaction_type: TransactionType, now: DateTime<Utc>) -> Self {
        Self {
            transaction_id: Uuid::new_v4(),
            meter_id: meter_id.to_string(),
            ip_address: None,
            port: None,
            transaction_type,
            status: TransactionStatus::Initiated,
            retry_count: 0,
            start_time: now,
            last_attempt_time: now,
            completion_time: None,
            error_message: None,
            result: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    /// Retry budget left, failed or timed out, and still inside the window
    pub fn can_retry_at(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.status,
            TransactionStatus::Failed | TransactionStatus::Timeout
        ) && self.has_retry_budget_at(now)
    }

    fn has_retry_budget_at(&self, now: DateTime<Utc>) -> bool {
        self.retry_count < MAX_TRANSACTION_RETRIES && now < self.start_time + timeout_window()
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_complete() && now > self.start_time + timeout_window()
    }
}

fn timeout_window() -> ChronoDuration {
    ChronoDuration::seconds(TRANSACTION_TIMEOUT.as_secs() as i64)
}

type Registry = Arc<RwLock<HashMap<Uuid, MeterTransaction>>>;

/// Registry of live transactions plus the timeout sweeper
#[derive(Default)]
pub struct MeterTransactionManager {
    transactions: Registry,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl MeterTransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the sweeper on the current tokio runtime; no-op if running
    pub fn start(&self) {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            return;
        }
        let transactions = Arc::clone(&self.transactions);
        *sweeper = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                sweep(&transactions, Utc::now());
            }
        }));
        log::debug!("Transaction sweeper started");
    }

    /// Stop the sweeper; live transactions stay registered
    pub fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
            log::debug!("Transaction sweeper stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    pub fn create_transaction(&self, meter_id: &str, transaction_type: TransactionType) -> MeterTransaction {
        self.register(MeterTransaction::new(meter_id, transaction_type, Utc::now()))
    }

    /// Same as [`create_transaction`](Self::create_transaction), recording the meter's endpoint
    pub fn create_target_transaction(
        &self,
        meter_id: &str,
        ip_address: &str,
        port: u16,
        transaction_type: TransactionType,
    ) -> MeterTransaction {
        let mut transaction = MeterTransaction::new(meter_id, transaction_type, Utc::now());
        transaction.ip_address = Some(ip_address.to_string());
        transaction.port = Some(port);
        self.register(transaction)
    }

    fn register(&self, transaction: MeterTransaction) -> MeterTransaction {
        self.transactions
            .write()
            .insert(transaction.transaction_id, transaction.clone());
        log::info!(
            "Created new transaction: {} for meter: {}",
            transaction.transaction_id,
            transaction.meter_id
        );
        transaction
    }

    /// Move a transaction to `status`
    ///
    /// Returns the updated snapshot, or `None` for an unknown id. A terminal
    /// status removes the transaction from the registry.
    pub fn update_transaction_status(
        &self,
        transaction_id: Uuid,
        status: TransactionStatus,
        error_message: Option<&str>,
    ) -> Option<MeterTransaction> {
        update(&self.transactions, transaction_id, status, error_message, Utc::now())
    }

    /// Store the result and complete the transaction
    pub fn set_transaction_result(
        &self,
        transaction_id: Uuid,
        result: OperationResult,
    ) -> Option<MeterTransaction> {
        {
            let mut transactions = self.transactions.write();
            let transaction = transactions.get_mut(&transaction_id)?;
            transaction.result = Some(result);
        }
        self.update_transaction_status(transaction_id, TransactionStatus::Completed, None)
    }

    pub fn can_retry(&self, transaction_id: Uuid) -> bool {
        self.can_retry_at(transaction_id, Utc::now())
    }

    pub fn can_retry_at(&self, transaction_id: Uuid, now: DateTime<Utc>) -> bool {
        self.transactions
            .read()
            .get(&transaction_id)
            .map(|t| t.can_retry_at(now))
            .unwrap_or(false)
    }

    /// Count one more attempt and enter `Retry`; `false` when not retryable
    pub fn retry_transaction(&self, transaction_id: Uuid) -> bool {
        let now = Utc::now();
        let mut transactions = self.transactions.write();
        match transactions.get_mut(&transaction_id) {
            Some(transaction) if transaction.can_retry_at(now) => {
                transaction.retry_count += 1;
                transaction.status = TransactionStatus::Retry;
                transaction.last_attempt_time = now;
                log::info!(
                    "Retrying transaction: {} attempt: {}",
                    transaction_id,
                    transaction.retry_count
                );
                true
            }
            _ => false,
        }
    }

    /// Record a failed attempt
    ///
    /// Enters `Retry` while the retry budget and window allow another
    /// attempt, otherwise fails the transaction for good. Returns the
    /// resulting snapshot, or `None` for an unknown id.
    pub fn handle_failed_transaction(
        &self,
        transaction_id: Uuid,
        error_message: &str,
    ) -> Option<MeterTransaction> {
        let now = Utc::now();
        {
            let mut transactions = self.transactions.write();
            let transaction = transactions.get_mut(&transaction_id)?;
            if transaction.has_retry_budget_at(now) {
                transaction.retry_count += 1;
                transaction.status = TransactionStatus::Retry;
                transaction.last_attempt_time = now;
                transaction.error_message = Some(error_message.to_string());
                log::info!(
                    "Retrying transaction: {} attempt: {} after: {}",
                    transaction_id,
                    transaction.retry_count,
                    error_message
                );
                return Some(transaction.clone());
            }
        }
        update(
            &self.transactions,
            transaction_id,
            TransactionStatus::Failed,
            Some(error_message),
            now,
        )
    }

    pub fn get_transaction(&self, transaction_id: Uuid) -> Option<MeterTransaction> {
        self.transactions.read().get(&transaction_id).cloned()
    }

    pub fn active_transactions(&self) -> Vec<MeterTransaction> {
        self.transactions.read().values().cloned().collect()
    }

    /// Time out every live transaction older than the limit at `now`
    ///
    /// Returns how many were timed out.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        sweep(&self.transactions, now)
    }
}

impl Drop for MeterTransactionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for MeterTransactionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeterTransactionManager")
            .field("active", &self.transactions.read().len())
            .field("running", &self.is_running())
            .finish()
    }
}

fn update(
    transactions: &Registry,
    transaction_id: Uuid,
    status: TransactionStatus,
    error_message: Option<&str>,
    now: DateTime<Utc>,
) -> Option<MeterTransaction> {
    let mut transactions = transactions.write();
    let transaction = transactions.get_mut(&transaction_id)?;
    transaction.status = status;
    transaction.last_attempt_time = now;
    if let Some(message) = error_message {
        transaction.error_message = Some(message.to_string());
    }

    if transaction.is_complete() {
        transaction.completion_time = Some(now);
        let finished = transactions.remove(&transaction_id);
        log::info!("Transaction completed: {} with status: {}", transaction_id, status);
        finished
    } else {
        log::info!("Updated transaction: {} status to: {}", transaction_id, status);
        Some(transaction.clone())
    }
}

fn sweep(transactions: &Registry, now: DateTime<Utc>) -> usize {
    let expired: Vec<Uuid> = transactions
        .read()
        .values()
        .filter(|t| t.is_expired_at(now))
        .map(|t| t.transaction_id)
        .collect();

    for id in &expired {
        log::warn!("Transaction {} timed out", id);
        update(transactions, *id, TransactionStatus::Timeout, Some(TIMEOUT_MESSAGE), now);
    }
    expired.len()
}
