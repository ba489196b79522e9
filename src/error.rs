//! Process-level errors
//!
//! Everything that can stop the server before or while it listens. Request
//! level failures never reach this type; they are answered with a status code.

use std::io;
use thiserror::Error;

use crate::share::ShareError;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("cannot listen on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("no free port between {first} and {last}")]
    PortSearchExhausted { first: u16, last: u16 },
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Process exit status for how serving ended
///
/// `0` after a clean stop (including an interrupt), `1` for every failure,
/// a taken port with fallback disabled among them.
pub const fn exit_status(result: &Result<(), ServeError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}
