//! In-memory meter for unit tests
//!
//! [`FakeConnector`] hands out one end of a `tokio::io::duplex` pipe and runs a
//! TCP-wrapper meter on the other end.

use crate::config::DlmsConfig;
use crate::connection::Connector;
use async_trait::async_trait;
use dlms_application::pdu::{Conformance, DataAccessResult, InitiateResponse, INVOKE_ID_AND_PRIORITY};
use dlms_application::service::{GetDataResult, GetResponseNormal, SetResponseNormal};
use dlms_asn1::iso_acse::APPLICATION_CONTEXT_LN;
use dlms_asn1::{AAREApdu, AssociateResult};
use dlms_core::{DataObject, DlmsError, DlmsResult};
use dlms_session::WrapperPdu;
use dlms_transport::{IoStream, StreamAccessor};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MeterBehaviour {
    Accept,
    RejectAssociation,
    RefuseConnection,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeConnector {
    behaviour: Arc<Mutex<MeterBehaviour>>,
    value: DataObject,
    connections: Arc<AtomicUsize>,
    rejections: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FakeConnector {
    pub(crate) fn new(behaviour: MeterBehaviour) -> Self {
        Self {
            behaviour: Arc::new(Mutex::new(behaviour)),
            value: DataObject::Integer(4500),
            connections: Arc::new(AtomicUsize::new(0)),
            rejections: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn set_behaviour(&self, behaviour: MeterBehaviour) {
        *self.behaviour.lock() = behaviour;
    }

    /// Reject the next `count` associations whatever the behaviour
    pub(crate) fn reject_next_associations(&self, count: usize) {
        self.rejections.store(count, Ordering::SeqCst);
    }

    fn take_rejection(&self) -> bool {
        self.rejections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    pub(crate) fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// First byte of every APDU the meter received, in order
    pub(crate) fn request_tags(&self) -> Vec<u8> {
        self.requests.lock().iter().filter_map(|r| r.first().copied()).collect()
    }

    fn reply_to(&self, request: &[u8]) -> Vec<u8> {
        match request.first() {
            Some(0x60)
                if self.take_rejection() || *self.behaviour.lock() == MeterBehaviour::RejectAssociation =>
            {
                let mut aare = AAREApdu::new(&APPLICATION_CONTEXT_LN, AssociateResult::RejectedPermanent);
                aare.diagnostic = Some(13);
                aare.encode().unwrap()
            }
            Some(0x60) => {
                let mut aare = AAREApdu::new(&APPLICATION_CONTEXT_LN, AssociateResult::Accepted);
                aare.user_information =
                    Some(InitiateResponse::new(Conformance::TYPICAL_CLIENT_LN, 512).encode());
                aare.encode().unwrap()
            }
            Some(0xC0) => GetResponseNormal::new(INVOKE_ID_AND_PRIORITY, GetDataResult::Data(self.value.clone()))
                .encode()
                .unwrap(),
            Some(0xC1) => SetResponseNormal::new(INVOKE_ID_AND_PRIORITY, DataAccessResult::Success).encode(),
            Some(0x62) => vec![0x63, 0x03, 0x80, 0x01, 0x00],
            _ => vec![0xD8, 0x01, 0x02],
        }
    }

    async fn serve(self, mut stream: IoStream<tokio::io::DuplexStream>) {
        while let Ok(pdu) = WrapperPdu::read_from(&mut stream).await {
            self.requests.lock().push(pdu.data().to_vec());
            let reply = self.reply_to(pdu.data());
            let header = pdu.header();
            let frame = WrapperPdu::new(header.destination(), header.source(), reply).unwrap();
            if stream.write_all(&frame.encode()).await.is_err() {
                break;
            }
            let _ = stream.flush().await;
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        _address: &str,
        _port: u16,
        config: &DlmsConfig,
    ) -> DlmsResult<Box<dyn StreamAccessor>> {
        if *self.behaviour.lock() == MeterBehaviour::RefuseConnection {
            return Err(DlmsError::Connect("connection refused".to_string()));
        }
        self.connections.fetch_add(1, Ordering::SeqCst);
        let (client, server) = tokio::io::duplex(4096);
        tokio::spawn(self.clone().serve(IoStream::new(server, None)));
        Ok(Box::new(IoStream::new(client, Some(config.read_timeout()))))
    }
}
