// Server module entry point
// Binding, the accept loop, connection handling and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is exposed as `server_loop`
#[path = "loop.rs"]
pub mod server_loop;

pub use connection::ConnectionTemplate;
pub use listener::{access_url, bind_with_fallback, create_listener, local_network_ip};
pub use server_loop::start_server_loop;

use std::future::Future;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServeError;
use crate::logger;

/// Bind, announce the access URL and serve until `shutdown` completes.
///
/// Share teardown is left to the caller, which owns the `ShareSet` and must
/// run it on every exit path including bind failures.
pub async fn run<S>(config: &ServerConfig, shutdown: S) -> Result<(), ServeError>
where
    S: Future<Output = ()>,
{
    let listener = bind_with_fallback(
        config.port,
        config.search_free_port,
        config.max_port_attempts,
    )?;
    serve(listener, config, shutdown).await
}

/// Serve on an already bound listener
pub async fn serve<S>(
    listener: TcpListener,
    config: &ServerConfig,
    shutdown: S,
) -> Result<(), ServeError>
where
    S: Future<Output = ()>,
{
    let local_addr = listener.local_addr()?;
    let url = access_url(
        local_network_ip(),
        local_addr.port(),
        config.share_set.display_name(),
    );
    logger::log_server_start(&url, &local_addr, config.rate_limit_bytes_per_second);

    start_server_loop(listener, ConnectionTemplate::from_config(config), shutdown).await;
    Ok(())
}
