//! TCP transport implementation

use crate::stream::{IoStream, StreamAccessor};
use async_trait::async_trait;
use dlms_core::{DlmsError, DlmsResult};
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;

/// TCP transport layer settings
#[derive(Debug, Clone)]
pub struct TcpSettings {
    /// `host:port` of the meter
    pub address: String,
    pub connect_timeout: Duration,
    /// Bounds every read and write once connected
    pub read_timeout: Option<Duration>,
}

impl TcpSettings {
    /// Create new TCP settings
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            address: format!("{}:{}", host, port),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Some(Duration::from_secs(5)),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// TCP transport layer implementation
pub struct TcpTransport {
    stream: IoStream<TcpStream>,
    address: String,
}

impl TcpTransport {
    /// Open a TCP connection, bounded by the connect timeout
    pub async fn connect(settings: &TcpSettings) -> DlmsResult<Self> {
        let stream = tokio::time::timeout(
            settings.connect_timeout,
            TcpStream::connect(settings.address.as_str()),
        )
        .await
        .map_err(|_| DlmsError::Timeout)?
        .map_err(|e| DlmsError::Connect(format!("{}: {}", settings.address, e)))?;

        stream.set_nodelay(true).map_err(DlmsError::Connection)?;
        log::debug!("Connected to {}", settings.address);

        Ok(Self {
            stream: IoStream::new(stream, settings.read_timeout),
            address: settings.address.clone(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpTransport")
            .field("address", &self.address)
            .field("closed", &self.stream.is_closed())
            .finish()
    }
}

#[async_trait]
impl StreamAccessor for TcpTransport {
    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.stream.set_timeout(timeout);
    }

    async fn read(&mut self, buf: &mut [u8]) -> DlmsResult<usize> {
        self.stream.read(buf).await
    }

    async fn write_all(&mut self, buf: &[u8]) -> DlmsResult<()> {
        self.stream.write_all(buf).await
    }

    async fn flush(&mut self) -> DlmsResult<()> {
        self.stream.flush().await
    }

    fn is_closed(&self) -> bool {
        self.stream.is_closed()
    }

    async fn close(&mut self) -> DlmsResult<()> {
        self.stream.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_tcp_settings() {
        let settings = TcpSettings::new("127.0.0.1", 4059)
            .with_connect_timeout(Duration::from_millis(250))
            .with_read_timeout(None);
        assert_eq!(settings.address, "127.0.0.1:4059");
        assert_eq!(settings.connect_timeout, Duration::from_millis(250));
        assert!(settings.read_timeout.is_none());
    }

    #[tokio::test]
    async fn test_connect_and_echo() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 3];
            socket.read_exact(&mut buf).await.unwrap();
            socket.write_all(&buf).await.unwrap();
        });

        let mut transport = TcpTransport::connect(&TcpSettings::new("127.0.0.1", port))
            .await
            .unwrap();
        transport.write_all(&[1, 2, 3]).await.unwrap();
        let mut buf = [0u8; 3];
        transport.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [1, 2, 3]);
        transport.close().await.unwrap();
        assert!(transport.is_closed());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = TcpTransport::connect(&TcpSettings::new("127.0.0.1", port))
            .await
            .unwrap_err();
        assert!(matches!(err, DlmsError::Connect(_)));
        assert!(err.is_retryable());
    }
}
