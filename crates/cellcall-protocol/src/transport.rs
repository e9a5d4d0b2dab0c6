//! Frame transport over TCP.
//!
//! Frames have no outer length prefix, so the receiver keeps appending socket
//! reads to a buffer until a whole frame decodes from it.

use std::net::SocketAddr;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{CodecError, ConnectionError, Result};
use crate::message::Frame;

/// Default upper bound on the size of one frame, in either direction.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

const READ_CHUNK: usize = 8 * 1024;

/// A transport carrying [`Frame`]s over a TCP stream.
pub struct Transport {
    stream: TcpStream,
    read_buf: BytesMut,
    max_frame_len: usize,
}

impl Transport {
    /// Create a new transport wrapping a TCP stream.
    pub fn new(stream: TcpStream) -> Self {
        Self::with_max_frame_len(stream, MAX_FRAME_LEN)
    }

    /// Create a transport that refuses frames larger than `max_frame_len`.
    pub fn with_max_frame_len(stream: TcpStream, max_frame_len: usize) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            max_frame_len,
        }
    }

    /// Encode and write a frame, then flush.
    ///
    /// A frame over the size limit is refused with
    /// [`CodecError::FrameTooLarge`] and nothing is written.
    pub async fn send<F: Frame>(&mut self, frame: &F) -> Result<()> {
        let bytes = frame.to_bytes();
        if bytes.len() > self.max_frame_len {
            return Err(CodecError::FrameTooLarge(bytes.len()).into());
        }
        tracing::trace!("sending frame of {} bytes", bytes.len());
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Receive one frame.
    ///
    /// A clean end of stream before any byte of the frame is
    /// [`ConnectionError::ConnectionClosed`]; an end of stream in the middle of
    /// a frame is reported as the codec's truncation error.
    pub async fn recv<F: Frame>(&mut self) -> Result<F> {
        let mut pending: Option<CodecError> = None;
        // Buffered length below which the last decode attempt is known to fail.
        let mut wanted = 1;

        loop {
            if self.read_buf.len() >= wanted {
                let mut cursor: &[u8] = &self.read_buf;
                match F::decode_from(&mut cursor) {
                    Ok(frame) => {
                        let consumed = self.read_buf.len() - cursor.len();
                        self.read_buf.advance(consumed);
                        tracing::trace!("received frame of {consumed} bytes");
                        return Ok(frame);
                    }
                    Err(e) => match e {
                        CodecError::Truncated {
                            needed, remaining, ..
                        } => {
                            let parsed = self.read_buf.len() - remaining;
                            wanted = parsed.saturating_add(needed);
                            pending = Some(e);
                        }
                        e => return Err(e.into()),
                    },
                }
            }

            if wanted > self.max_frame_len {
                return Err(CodecError::FrameTooLarge(wanted).into());
            }

            self.read_buf.reserve(READ_CHUNK);
            let n = self.stream.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(match pending {
                    Some(e) => e.into(),
                    None => ConnectionError::ConnectionClosed,
                });
            }
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.peer_addr().ok()
    }

    /// Shut down the write half, signalling end of stream to the peer.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{CallRequest, Reply};
    use crate::value::{ArgumentList, CellError, Value};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_send_recv_request() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = Transport::new(stream);
            let req: CallRequest = transport.recv().await.unwrap();
            assert_eq!(req.name, "ECHO");
            assert_eq!(req.args.as_slice(), &[Value::text("hello")]);
        });

        let mut client = Transport::new(TcpStream::connect(addr).await.unwrap());
        let args = ArgumentList::new(vec![Value::text("hello")]).unwrap();
        client.send(&CallRequest::new("ECHO", args)).await.unwrap();

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_frame_split_across_writes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let bytes = Reply::ok(Value::text("split")).to_bytes();
            let (a, b) = bytes.split_at(4);
            stream.write_all(a).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            stream.write_all(b).await.unwrap();
        });

        let mut client = Transport::new(TcpStream::connect(addr).await.unwrap());
        let reply: Reply = client.recv().await.unwrap();
        assert_eq!(reply, Reply::ok(Value::text("split")));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_back_to_back_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = Transport::new(stream);
            transport.send(&Reply::ok(1.0)).await.unwrap();
            transport.send(&Reply::error(CellError::Na)).await.unwrap();
        });

        let mut client = Transport::new(TcpStream::connect(addr).await.unwrap());
        let first: Reply = client.recv().await.unwrap();
        let second: Reply = client.recv().await.unwrap();
        assert_eq!(first, Reply::ok(1.0));
        assert_eq!(second, Reply::error(CellError::Na));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_and_truncated() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
            let (mut stream, _) = listener.accept().await.unwrap();
            // status + number tag, payload missing
            stream.write_all(&[0, crate::codec::TAG_NUMBER, 1, 2]).await.unwrap();
        });

        let mut closed = Transport::new(TcpStream::connect(addr).await.unwrap());
        let err = closed.recv::<Reply>().await.unwrap_err();
        assert!(matches!(err, ConnectionError::ConnectionClosed), "{err:?}");

        let mut truncated = Transport::new(TcpStream::connect(addr).await.unwrap());
        let err = truncated.recv::<Reply>().await.unwrap_err();
        assert!(
            matches!(err, ConnectionError::Codec(ref e) if e.is_truncated()),
            "{err:?}"
        );

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_large_reply_in_small_chunks() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let rows: Vec<Vec<Value>> = (0..200)
            .map(|r| (0..50).map(|c| Value::text(format!("r{r}c{c}"))).collect())
            .collect();
        let expected = Reply::ok(Value::array(rows).unwrap());
        let bytes = expected.to_bytes();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            for chunk in bytes.chunks(512) {
                stream.write_all(chunk).await.unwrap();
                stream.flush().await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        let mut client = Transport::new(TcpStream::connect(addr).await.unwrap());
        let reply: Reply = client.recv().await.unwrap();
        assert_eq!(reply, expected);

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_frames_are_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = Transport::with_max_frame_len(stream, 64);
            // Too big to send: nothing reaches the peer.
            let err = transport
                .send(&Reply::ok(Value::text("x".repeat(100))))
                .await
                .unwrap_err();
            assert!(
                matches!(err, ConnectionError::Codec(CodecError::FrameTooLarge(n)) if n > 64),
                "{err:?}"
            );
            transport.send(&Reply::ok(Value::text("small"))).await.unwrap();

            // A header announcing a long text is refused before the body arrives.
            let mut header = vec![0u8, crate::codec::TAG_TEXT];
            header.extend_from_slice(&1000u32.to_le_bytes());
            transport.stream.write_all(&header).await.unwrap();
            transport.stream.flush().await.unwrap();
        });

        let mut client = Transport::with_max_frame_len(TcpStream::connect(addr).await.unwrap(), 64);
        let first: Reply = client.recv().await.unwrap();
        assert_eq!(first, Reply::ok(Value::text("small")));

        let err = client.recv::<Reply>().await.unwrap_err();
        assert!(
            matches!(err, ConnectionError::Codec(CodecError::FrameTooLarge(1006))),
            "{err:?}"
        );

        server.await.unwrap();
    }
}
