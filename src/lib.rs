//! Share local files and directories over HTTP on the LAN.
//!
//! Serves a single directory in place, or any set of files and directories
//! through a temporary root of symbolic links, with byte-range support and
//! optional per-connection rate limiting.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod share;
pub mod transfer;

pub use error::{exit_status, ServeError};
