//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, header
//! extraction, dispatch to the file responder, and access logging.

use hyper::header::{HeaderName, CONTENT_LENGTH, IF_MODIFIED_SINCE, RANGE, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::static_files;
use crate::config::LoggingConfig;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::transfer::{ResponseBody, TokenBucket};

/// Per-connection state handed to every request on that connection
///
/// Each accepted socket gets its own instance with a fresh bucket, so
/// throttling is per connection.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub root: Arc<PathBuf>,
    pub limiter: Arc<TokenBucket>,
    pub peer: SocketAddr,
    pub logging: Arc<LoggingConfig>,
}

/// Request information needed for request processing
#[derive(Debug)]
pub struct RequestContext<'a> {
    pub method: Method,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub range_header: Option<String>,
    pub if_modified_since: Option<String>,
}

impl<'a> RequestContext<'a> {
    pub fn from_parts(parts: &'a Parts) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path(),
            query: parts.uri.query(),
            is_head: parts.method == Method::HEAD,
            range_header: header_string(parts, &RANGE),
            if_modified_since: header_string(parts, &IF_MODIFIED_SINCE),
        }
    }
}

fn header_string(parts: &Parts, name: &HeaderName) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    conn: ConnectionContext,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    // GET and HEAD bodies are never read
    let (parts, _) = req.into_parts();
    let ctx = RequestContext::from_parts(&parts);

    let response = route_request(&ctx, &conn).await;

    if conn.logging.access_log {
        let mut entry = AccessLogEntry::new(
            conn.peer.ip().to_string(),
            ctx.method.to_string(),
            ctx.path.to_string(),
        );
        entry.query = ctx.query.map(ToString::to_string);
        entry.http_version = format!("{:?}", parts.version);
        entry.status = response.status().as_u16();
        entry.body_bytes = if ctx.is_head {
            0
        } else {
            response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0)
        };
        entry.range.clone_from(&ctx.range_header);
        entry.user_agent = header_string(&parts, &USER_AGENT);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &conn.logging.access_log_format);
    }

    Ok(response)
}

/// Validate the method, then serve from the share root
pub async fn route_request(
    ctx: &RequestContext<'_>,
    conn: &ConnectionContext,
) -> Response<ResponseBody> {
    if let Some(resp) = check_http_method(&ctx.method) {
        return resp;
    }
    static_files::serve_path(ctx, &conn.root, &conn.limiter).await
}

/// Only GET and HEAD are served
fn check_http_method(method: &Method) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}
