//! Byte transfer module
//!
//! Per-connection rate limiting, chunked streaming and the response body
//! types built on top of them.

pub mod body;
pub mod bucket;
pub mod streamer;

pub use body::{empty_body, file_body, full_body, ResponseBody};
pub use bucket::TokenBucket;
pub use streamer::{is_peer_disconnect, ChunkedStreamer, StreamOutcome, CHUNK_SIZE};
