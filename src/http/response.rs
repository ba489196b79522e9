//! HTTP response building module
//!
//! Builders for each status code the file server emits.

use hyper::header::{
    ACCEPT_RANGES, ALLOW, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, LAST_MODIFIED, LOCATION,
};
use hyper::{Response, StatusCode};

use crate::transfer::{empty_body, full_body, ResponseBody};

/// Headers shared by 200 and 206 file responses
#[derive(Debug, Clone)]
pub struct FileHeaders {
    pub content_type: String,
    pub content_length: u64,
    pub last_modified: String,
    /// `bytes A-B/total`, present only for partial content
    pub content_range: Option<String>,
}

/// Build 200 or 206 response for a file body
pub fn build_file_response(headers: FileHeaders, body: ResponseBody) -> Response<ResponseBody> {
    let status = if headers.content_range.is_some() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, headers.content_type)
        .header(CONTENT_LENGTH, headers.content_length)
        .header(ACCEPT_RANGES, "bytes")
        .header(LAST_MODIFIED, headers.last_modified);

    if let Some(range) = headers.content_range {
        builder = builder.header(CONTENT_RANGE, range);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        Response::new(empty_body())
    })
}

/// Build 301 Moved Permanently response
pub fn build_301_response(location: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, location)
        .header(CONTENT_LENGTH, 0)
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(empty_body())
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(last_modified: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(LAST_MODIFIED, last_modified)
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(empty_body())
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    const BODY: &str = "404 Not Found";
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, BODY.len())
        .body(full_body(BODY))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(full_body(BODY))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    const BODY: &str = "405 Method Not Allowed";
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, BODY.len())
        .header(ALLOW, "GET, HEAD")
        .body(full_body(BODY))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(full_body(BODY))
        })
}

/// Build 416 Range Not Satisfiable response (no body)
pub fn build_416_response(file_size: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(CONTENT_RANGE, format!("bytes */{file_size}"))
        .header(CONTENT_LENGTH, 0)
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(empty_body())
        })
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<ResponseBody> {
    let content_length = content.len();
    let body = if is_head {
        empty_body()
    } else {
        full_body(content)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .header(CONTENT_LENGTH, content_length)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(empty_body())
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_416_headers() {
        let resp = build_416_response(1234);
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes */1234");
        assert_eq!(resp.headers()[CONTENT_LENGTH], "0");
    }

    #[test]
    fn test_file_response_status_follows_content_range() {
        let full = build_file_response(
            FileHeaders {
                content_type: "text/plain".to_string(),
                content_length: 10,
                last_modified: "Tue, 15 Nov 1994 08:12:31 GMT".to_string(),
                content_range: None,
            },
            empty_body(),
        );
        assert_eq!(full.status(), StatusCode::OK);
        assert_eq!(full.headers()[ACCEPT_RANGES], "bytes");
        assert!(full.headers().get(CONTENT_RANGE).is_none());

        let partial = build_file_response(
            FileHeaders {
                content_type: "text/plain".to_string(),
                content_length: 5,
                last_modified: "Tue, 15 Nov 1994 08:12:31 GMT".to_string(),
                content_range: Some("bytes 0-4/10".to_string()),
            },
            empty_body(),
        );
        assert_eq!(partial.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(partial.headers()[CONTENT_RANGE], "bytes 0-4/10");
        assert_eq!(partial.headers()[CONTENT_LENGTH], "5");
    }

    #[test]
    fn test_redirect_location() {
        let resp = build_301_response("/docs/");
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[LOCATION], "/docs/");
    }
}
