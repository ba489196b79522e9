//! Chunked, rate-paced byte copy
//!
//! Copies a source into a destination in bounded chunks. Pacing happens
//! before each read so a throttled transfer never reads ahead of its budget.

use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::bucket::TokenBucket;
use crate::logger;

/// Default chunk size for file transfers
pub const CHUNK_SIZE: usize = 16 * 1024;

/// How a transfer ended, when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// All requested bytes (or the whole source) were written
    Completed { bytes: u64 },
    /// The peer hung up; `bytes` were written before that
    PeerClosed { bytes: u64 },
}

impl StreamOutcome {
    pub const fn bytes(&self) -> u64 {
        match self {
            Self::Completed { bytes } | Self::PeerClosed { bytes } => *bytes,
        }
    }
}

/// Write errors that mean the client went away rather than a server fault
pub fn is_peer_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
    )
}

/// Copies bytes in fixed-size chunks, consulting a per-connection bucket
#[derive(Debug, Clone)]
pub struct ChunkedStreamer {
    limiter: Arc<TokenBucket>,
    chunk_size: usize,
    label: String,
}

impl ChunkedStreamer {
    pub const fn new(limiter: Arc<TokenBucket>) -> Self {
        Self {
            limiter,
            chunk_size: CHUNK_SIZE,
            label: String::new(),
        }
    }

    /// Name the transfer in log lines (usually the request path)
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Copy from `source` to `destination`
    ///
    /// With `remaining` set, at most that many bytes are copied. An empty
    /// read ends the transfer successfully either way. Peer disconnects end
    /// it with [`StreamOutcome::PeerClosed`]; any other I/O failure is
    /// returned to the caller.
    pub async fn stream<R, W>(
        &self,
        source: &mut R,
        destination: &mut W,
        mut remaining: Option<u64>,
    ) -> io::Result<StreamOutcome>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut buf = vec![0u8; self.chunk_size];
        let mut written: u64 = 0;
        let limited = self.limiter.is_limited();

        loop {
            let read_size = match remaining {
                Some(0) => break,
                Some(left) => {
                    usize::try_from(left).map_or(self.chunk_size, |left| left.min(self.chunk_size))
                }
                None => self.chunk_size,
            };

            if limited {
                #[allow(clippy::cast_precision_loss)]
                let delay = self.limiter.consume(read_size as f64);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            let n = source.read(&mut buf[..read_size]).await?;
            if n == 0 {
                break;
            }

            if let Err(e) = destination.write_all(&buf[..n]).await {
                return self.write_failed(e, written);
            }

            let n = n as u64;
            written += n;
            if let Some(left) = remaining.as_mut() {
                *left = left.saturating_sub(n);
            }
        }

        if let Err(e) = destination.flush().await {
            return self.write_failed(e, written);
        }

        logger::log_transfer_complete(&self.label, written);
        Ok(StreamOutcome::Completed { bytes: written })
    }

    fn write_failed(&self, err: io::Error, written: u64) -> io::Result<StreamOutcome> {
        if is_peer_disconnect(&err) {
            logger::log_transfer_aborted(&self.label, written, &err);
            Ok(StreamOutcome::PeerClosed { bytes: written })
        } else {
            Err(err)
        }
    }
}
