//! Request handler module
//!
//! Maps requests onto the share root: method dispatch, path translation,
//! file responses and directory listings.

pub mod listing;
pub mod path;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, ConnectionContext, RequestContext};
