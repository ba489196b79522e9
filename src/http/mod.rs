//! HTTP protocol layer module
//!
//! Range parsing, cache validators, content types and response builders,
//! decoupled from how paths are resolved.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, ByteRange, RangeError};
pub use response::{
    build_301_response, build_304_response, build_404_response, build_405_response,
    build_416_response, build_file_response, build_html_response, FileHeaders,
};
