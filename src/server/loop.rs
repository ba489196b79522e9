// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use tokio::net::TcpListener;

use super::connection::{accept_connection, ConnectionTemplate};
use crate::logger;

/// Accept connections and dispatch each to its own task.
///
/// Returns once `shutdown` completes. Connections already accepted keep
/// running in their tasks; the listener is closed on return.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop<S>(listener: TcpListener, template: ConnectionTemplate, shutdown: S)
where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &template);
                    }
                    Err(e) => {
                        // Per-connection failures (e.g. reset before accept) do not stop the loop
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = &mut shutdown => {
                break;
            }
        }
    }
}
