//! Meter commands tracked as transactions
//!
//! [`MeterCommandService`] runs ping and relay commands through a
//! [`MeterCommunicationService`] and records each one in a
//! [`MeterTransactionManager`]. A failed attempt dials again while the
//! transaction has retry budget left inside its window; the last failure
//! fails the transaction.

use crate::service::MeterCommunicationService;
use crate::transaction::{MeterTransaction, MeterTransactionManager, TransactionStatus, TransactionType};
use dlms_application::OperationResult;
use dlms_core::{CosemObject, DataObject};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What one command sends and how its failure reads when the meter gives no reason
struct Command {
    transaction_type: TransactionType,
    object: CosemObject,
    value: Option<DataObject>,
    failure: &'static str,
}

#[derive(Clone)]
pub struct MeterCommandService {
    service: MeterCommunicationService,
    transactions: Arc<MeterTransactionManager>,
}

impl MeterCommandService {
    pub fn new(service: MeterCommunicationService, transactions: Arc<MeterTransactionManager>) -> Self {
        Self { service, transactions }
    }

    pub fn service(&self) -> &MeterCommunicationService {
        &self.service
    }

    pub fn transactions(&self) -> &Arc<MeterTransactionManager> {
        &self.transactions
    }

    /// Read the meter clock to prove it answers
    pub fn ping_meter(&self, meter_id: &str, address: &str, port: u16) -> JoinHandle<Option<MeterTransaction>> {
        self.run(
            meter_id,
            address,
            port,
            Command {
                transaction_type: TransactionType::Ping,
                object: CosemObject::CLOCK,
                value: None,
                failure: "Ping failed",
            },
        )
    }

    pub fn get_relay_status(
        &self,
        meter_id: &str,
        address: &str,
        port: u16,
    ) -> JoinHandle<Option<MeterTransaction>> {
        self.run(
            meter_id,
            address,
            port,
            Command {
                transaction_type: TransactionType::Read,
                object: CosemObject::RELAY_CONTROL,
                value: None,
                failure: "Failed to get relay status",
            },
        )
    }

    /// Close the supply relay
    pub fn connect_meter(&self, meter_id: &str, address: &str, port: u16) -> JoinHandle<Option<MeterTransaction>> {
        self.relay(meter_id, address, port, true)
    }

    /// Open the supply relay
    pub fn disconnect_meter(
        &self,
        meter_id: &str,
        address: &str,
        port: u16,
    ) -> JoinHandle<Option<MeterTransaction>> {
        self.relay(meter_id, address, port, false)
    }

    fn relay(&self, meter_id: &str, address: &str, port: u16, connect: bool) -> JoinHandle<Option<MeterTransaction>> {
        let (transaction_type, failure) = if connect {
            (TransactionType::Connect, "Failed to connect meter")
        } else {
            (TransactionType::Disconnect, "Failed to disconnect meter")
        };
        self.run(
            meter_id,
            address,
            port,
            Command {
                transaction_type,
                object: CosemObject::RELAY_CONTROL,
                value: Some(DataObject::Boolean(connect)),
                failure,
            },
        )
    }

    /// Register the transaction now and drive it on the runtime
    ///
    /// The task yields the final snapshot, or `None` when the transaction
    /// left the registry some other way (the timeout sweeper).
    fn run(
        &self,
        meter_id: &str,
        address: &str,
        port: u16,
        command: Command,
    ) -> JoinHandle<Option<MeterTransaction>> {
        let transaction = self
            .transactions
            .create_target_transaction(meter_id, address, port, command.transaction_type);
        let id = transaction.transaction_id;
        let service = self.service.clone();
        let transactions = Arc::clone(&self.transactions);
        let address = address.to_string();

        tokio::spawn(async move {
            loop {
                transactions.update_transaction_status(id, TransactionStatus::InProgress, None)?;
                let is_write = command.value.is_some();
                let result = service
                    .communicate(&address, port, command.object, command.value.clone(), is_write)
                    .await
                    .unwrap_or_else(|e| OperationResult::failure(e.to_string()));

                if result.success {
                    return transactions.set_transaction_result(id, result);
                }
                let error = result.error().unwrap_or(command.failure);
                let snapshot = transactions.handle_failed_transaction(id, error)?;
                if snapshot.is_complete() {
                    log::warn!("Transaction {} failed: {}", id, error);
                    return Some(snapshot);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DlmsConfig;
    use crate::connection::CONNECT_FAILED;
    use crate::testing::{FakeConnector, MeterBehaviour};
    use crate::transaction::MAX_TRANSACTION_RETRIES;
    use std::time::Duration;

    fn commands(connector: &FakeConnector) -> MeterCommandService {
        let config = DlmsConfig::default()
            .with_hdlc(false)
            .with_read_timeout(Duration::from_millis(500))
            .with_max_retries(0);
        let service = MeterCommunicationService::with_connector(config, Arc::new(connector.clone())).unwrap();
        MeterCommandService::new(service, Arc::new(MeterTransactionManager::new()))
    }

    #[tokio::test]
    async fn test_commands_complete_transactions() {
        let connector = FakeConnector::new(MeterBehaviour::Accept);
        let commands = commands(&connector);

        let ping = commands.ping_meter("MTR-001", "10.0.0.1", 4059).await.unwrap().unwrap();
        assert_eq!(ping.transaction_type, TransactionType::Ping);
        assert_eq!(ping.status, TransactionStatus::Completed);
        assert_eq!(ping.retry_count, 0);
        assert_eq!(ping.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(
            ping.result.and_then(|r| r.value),
            Some(DataObject::Integer(4500))
        );

        let relay = commands.get_relay_status("MTR-001", "10.0.0.1", 4059).await.unwrap().unwrap();
        assert_eq!(relay.status, TransactionStatus::Completed);

        let connect = commands.connect_meter("MTR-001", "10.0.0.1", 4059).await.unwrap().unwrap();
        assert_eq!(connect.transaction_type, TransactionType::Connect);
        assert_eq!(connect.status, TransactionStatus::Completed);

        let disconnect = commands.disconnect_meter("MTR-001", "10.0.0.1", 4059).await.unwrap().unwrap();
        assert_eq!(disconnect.transaction_type, TransactionType::Disconnect);
        assert_eq!(disconnect.status, TransactionStatus::Completed);

        assert_eq!(
            connector.request_tags(),
            vec![0x60, 0xC0, 0x62, 0x60, 0xC0, 0x62, 0x60, 0xC1, 0x62, 0x60, 0xC1, 0x62]
        );
        assert!(commands.transactions().active_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_failed_command_retries_then_fails() {
        let connector = FakeConnector::new(MeterBehaviour::RejectAssociation);
        let commands = commands(&connector);

        let transaction = commands.ping_meter("MTR-002", "10.0.0.2", 4059).await.unwrap().unwrap();
        assert_eq!(transaction.status, TransactionStatus::Failed);
        assert_eq!(transaction.retry_count, MAX_TRANSACTION_RETRIES);
        assert_eq!(transaction.error_message.as_deref(), Some(CONNECT_FAILED));
        assert!(transaction.completion_time.is_some());
        assert!(transaction.result.is_none());

        // first attempt plus one per retry
        assert_eq!(connector.connections(), 1 + MAX_TRANSACTION_RETRIES as usize);
        assert!(commands.transactions().get_transaction(transaction.transaction_id).is_none());
        assert_eq!(commands.service().metrics().failure, 4);
    }

    #[tokio::test]
    async fn test_failed_command_recovers_on_retry() {
        let connector = FakeConnector::new(MeterBehaviour::Accept);
        connector.reject_next_associations(1);
        let commands = commands(&connector);

        let transaction = commands.connect_meter("MTR-003", "10.0.0.3", 4059).await.unwrap().unwrap();
        assert_eq!(transaction.status, TransactionStatus::Completed);
        assert_eq!(transaction.retry_count, 1);
        // the earlier failure stays on record
        assert_eq!(transaction.error_message.as_deref(), Some(CONNECT_FAILED));
        assert_eq!(connector.connections(), 2);
    }
}
