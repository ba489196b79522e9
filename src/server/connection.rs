// Connection handling module
// Serves one accepted TCP connection in its own task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::{LoggingConfig, ServerConfig};
use crate::handler::{self, ConnectionContext};
use crate::logger;
use crate::transfer::{is_peer_disconnect, TokenBucket};

/// What every connection handler is seeded with
///
/// Built once from the `ServerConfig`; each accepted socket gets its own
/// `ConnectionContext` (and so its own token bucket) from it.
#[derive(Debug, Clone)]
pub struct ConnectionTemplate {
    pub root: Arc<PathBuf>,
    /// 0 = unlimited
    pub rate_limit_bytes_per_second: u64,
    pub header_read_timeout: Duration,
    pub logging: Arc<LoggingConfig>,
}

impl ConnectionTemplate {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            root: Arc::new(config.share_set.root().to_path_buf()),
            rate_limit_bytes_per_second: config.rate_limit_bytes_per_second,
            header_read_timeout: config.header_read_timeout,
            logging: Arc::clone(&config.logging),
        }
    }

    /// Fresh per-connection state with a full, independent bucket
    pub fn context_for(&self, peer: SocketAddr) -> ConnectionContext {
        // Exact up to 2^53 B/s
        #[allow(clippy::cast_precision_loss)]
        let limiter = TokenBucket::new(self.rate_limit_bytes_per_second as f64);
        ConnectionContext {
            root: Arc::clone(&self.root),
            limiter: Arc::new(limiter),
            peer,
            logging: Arc::clone(&self.logging),
        }
    }
}

/// Accept a connection: log it and hand it to its own task
pub fn accept_connection(stream: TcpStream, peer_addr: SocketAddr, template: &ConnectionTemplate) {
    if template.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    let ctx = template.context_for(peer_addr);
    handle_connection(stream, ctx, template.header_read_timeout);
}

/// Serve a single connection in a spawned task.
fn handle_connection(stream: TcpStream, ctx: ConnectionContext, header_read_timeout: Duration) {
    tokio::spawn(async move {
        if let Err(err) = serve_io(TokioIo::new(stream), ctx, header_read_timeout).await {
            if !is_client_hangup(&err) {
                logger::log_connection_error(&err);
            }
        }
    });
}

/// Run the HTTP/1 protocol over `io` for one request.
///
/// Keep-alive is off, so the connection carries exactly one request and
/// closes once its response body has been sent or abandoned.
async fn serve_io<I>(
    io: I,
    ctx: ConnectionContext,
    header_read_timeout: Duration,
) -> Result<(), hyper::Error>
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let mut builder = http1::Builder::new();
    builder
        .keep_alive(false)
        .timer(TokioTimer::new())
        .header_read_timeout(header_read_timeout);

    builder
        .serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, ctx.clone())),
        )
        .await
}

/// Whether a connection error only means the client went away
///
/// The streamer already reports those transfers, so they get no error line.
pub fn is_client_hangup(err: &hyper::Error) -> bool {
    err.is_incomplete_message()
        || err.is_canceled()
        || err.is_body_write_aborted()
        || caused_by_peer_disconnect(err)
}

fn caused_by_peer_disconnect(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.downcast_ref::<io::Error>().is_some_and(is_peer_disconnect) {
            return true;
        }
        current = e.source();
    }
    false
}
