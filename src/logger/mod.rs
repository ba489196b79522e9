//! Logger module
//!
//! Provides logging utilities for the file server including:
//! - Server lifecycle logging (bind, port fallback, shutdown)
//! - Access logging with multiple formats
//! - Transfer completion and abort lines
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use chrono::Local;
use std::net::SocketAddr;
use std::path::Path;

use crate::config::LoggingConfig;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    writer::init(
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn log_info(message: &str) {
    write_info(message);
}

pub fn log_server_start(url: &str, addr: &SocketAddr, rate_limit_bytes_per_second: u64) {
    write_info("======================================");
    write_info(&format!("Serving on {addr}"));
    if rate_limit_bytes_per_second > 0 {
        write_info(&format!(
            "Rate limit: {} KiB/s per connection",
            rate_limit_bytes_per_second / 1024
        ));
    }
    write_info(&format!("Access URL: {url}"));
    write_info("======================================\n");
}

pub fn log_port_in_use(port: u16, next: Option<u16>) {
    match next {
        Some(next) => write_info(&format!("[Bind] Port {port} is in use, trying {next}")),
        None => write_info(&format!("[Bind] Port {port} is in use")),
    }
}

pub fn log_bind_failed(port: u16, err: &impl std::fmt::Display) {
    log_error(&format!("[Bind] ✗ Cannot listen on port {port}: {err}"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_transfer_complete(label: &str, bytes: u64) {
    write_info(&format!("[{}] Transfer complete: {label} ({bytes} bytes)", timestamp()));
}

pub fn log_transfer_aborted(label: &str, bytes: u64, err: &std::io::Error) {
    write_info(&format!(
        "[{}] Client went away during {label} after {bytes} bytes ({err})",
        timestamp()
    ));
}

pub fn log_share_created(root: &Path, links: usize) {
    write_info(&format!(
        "[Share] Linked {links} input(s) under {}",
        root.display()
    ));
}

pub fn log_share_removed(root: &Path) {
    write_info(&format!("[Share] Removed {}", root.display()));
}

pub fn log_shutdown(reason: &str) {
    write_info(&format!("\n[Shutdown] {reason} received, stopping"));
}
