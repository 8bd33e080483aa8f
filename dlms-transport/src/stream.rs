//! Stream accessor trait for transport layer

use async_trait::async_trait;
use dlms_core::{DlmsError, DlmsResult};
use std::fmt;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Stream accessor interface to access a physical stream to a remote meter
#[async_trait]
pub trait StreamAccessor: Send {
    /// Set the timeout applied to each read and write
    ///
    /// # Arguments
    ///
    /// * `timeout` - The timeout duration. None means infinite timeout.
    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Read data from the stream
    ///
    /// # Returns
    ///
    /// Number of bytes read, or 0 if EOF
    async fn read(&mut self, buf: &mut [u8]) -> DlmsResult<usize>;

    /// Read exact number of bytes from the stream
    ///
    /// Returns an `UnexpectedEof` connection error if the stream ends first.
    async fn read_exact(&mut self, mut buf: &mut [u8]) -> DlmsResult<()> {
        while !buf.is_empty() {
            let n = self.read(buf).await?;
            if n == 0 {
                return Err(DlmsError::Connection(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Failed to read exact number of bytes",
                )));
            }
            buf = &mut buf[n..];
        }
        Ok(())
    }

    /// Write all data to the stream
    async fn write_all(&mut self, buf: &[u8]) -> DlmsResult<()>;

    /// Flush any buffered data
    async fn flush(&mut self) -> DlmsResult<()>;

    /// Check if the stream is closed
    fn is_closed(&self) -> bool;

    /// Close the stream
    async fn close(&mut self) -> DlmsResult<()>;
}

fn not_connected() -> DlmsError {
    DlmsError::Connection(io::Error::new(io::ErrorKind::NotConnected, "Stream not connected"))
}

/// [`StreamAccessor`] over any tokio byte stream
///
/// Reads and writes are bounded by the configured timeout and fail with
/// [`DlmsError::Timeout`] when it elapses. Reaching EOF, hitting an I/O
/// error or timing out mid-write marks the stream closed.
pub struct IoStream<T> {
    inner: Option<T>,
    timeout: Option<Duration>,
}

impl<T> IoStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(inner: T, timeout: Option<Duration>) -> Self {
        Self {
            inner: Some(inner),
            timeout,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl<T> fmt::Debug for IoStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoStream")
            .field("open", &self.inner.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl<T> StreamAccessor for IoStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    async fn read(&mut self, buf: &mut [u8]) -> DlmsResult<usize> {
        let stream = self.inner.as_mut().ok_or_else(not_connected)?;

        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, stream.read(buf))
                .await
                .map_err(|_| DlmsError::Timeout)?,
            None => stream.read(buf).await,
        };

        match result {
            Ok(0) => {
                self.inner = None;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) => {
                self.inner = None;
                Err(DlmsError::Connection(e))
            }
        }
    }

    async fn write_all(&mut self, buf: &[u8]) -> DlmsResult<()> {
        let stream = self.inner.as_mut().ok_or_else(not_connected)?;

        let result = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, stream.write_all(buf)).await {
                Ok(result) => result,
                Err(_) => {
                    // part of a frame may already be on the wire
                    self.inner = None;
                    return Err(DlmsError::Timeout);
                }
            },
            None => stream.write_all(buf).await,
        };

        if let Err(e) = result {
            self.inner = None;
            return Err(DlmsError::Connection(e));
        }
        Ok(())
    }

    async fn flush(&mut self) -> DlmsResult<()> {
        let stream = self.inner.as_mut().ok_or_else(not_connected)?;
        stream.flush().await.map_err(DlmsError::Connection)
    }

    fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    async fn close(&mut self) -> DlmsResult<()> {
        if let Some(mut stream) = self.inner.take() {
            stream.shutdown().await.map_err(DlmsError::Connection)?;
        }
        Ok(())
    }
}

/// Boxed accessors, so session layers can sit on whatever a connector opened
#[async_trait]
impl<S: StreamAccessor + ?Sized> StreamAccessor for Box<S> {
    fn set_timeout(&mut self, timeout: Option<Duration>) {
        (**self).set_timeout(timeout)
    }

    async fn read(&mut self, buf: &mut [u8]) -> DlmsResult<usize> {
        (**self).read(buf).await
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> DlmsResult<()> {
        (**self).read_exact(buf).await
    }

    async fn write_all(&mut self, buf: &[u8]) -> DlmsResult<()> {
        (**self).write_all(buf).await
    }

    async fn flush(&mut self) -> DlmsResult<()> {
        (**self).flush().await
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    async fn close(&mut self) -> DlmsResult<()> {
        (**self).close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_exact_across_chunks() {
        let mock = Builder::new().read(&[1, 2]).read(&[3, 4, 5]).build();
        let mut stream = IoStream::new(mock, None);
        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_read_exact_eof() {
        let mock = Builder::new().read(&[1, 2]).build();
        let mut stream = IoStream::new(mock, None);
        let mut buf = [0u8; 4];
        let err = stream.read_exact(&mut buf).await.unwrap_err();
        match err {
            DlmsError::Connection(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(stream.is_closed());
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let mock = Builder::new().wait(Duration::from_millis(200)).build();
        let mut stream = IoStream::new(mock, Some(Duration::from_millis(20)));
        let mut buf = [0u8; 1];
        assert!(matches!(stream.read(&mut buf).await, Err(DlmsError::Timeout)));
    }

    #[tokio::test]
    async fn test_write_timeout() {
        // nobody drains the peer, so the pipe fills up
        let (client, _peer) = tokio::io::duplex(4);
        let mut stream = IoStream::new(client, Some(Duration::from_millis(20)));
        assert!(matches!(stream.write_all(&[0u8; 64]).await, Err(DlmsError::Timeout)));
        assert!(stream.is_closed());
    }

    #[tokio::test]
    async fn test_write_then_close() {
        let mock = Builder::new().write(&[0x7E, 0xA0]).build();
        let mut stream = IoStream::new(mock, None);
        stream.write_all(&[0x7E, 0xA0]).await.unwrap();
        stream.flush().await.unwrap();
        stream.close().await.unwrap();
        assert!(stream.is_closed());
        assert!(stream.write_all(&[0]).await.is_err());
        // closing twice is harmless
        stream.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_boxed_accessor_delegates() {
        let mock = Builder::new().read(&[9, 8]).build();
        let mut stream: Box<dyn StreamAccessor> = Box::new(IoStream::new(mock, None));
        let mut buf = [0u8; 2];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [9, 8]);
        stream.close().await.unwrap();
        assert!(stream.is_closed());
    }
}
