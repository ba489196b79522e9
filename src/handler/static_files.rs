//! Static file serving module
//!
//! Resolves a request path under the share root and answers with a redirect,
//! a directory index or listing, a (partial) file, or an error status.

use hyper::Response;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs::{self, File};
use tokio::io::{AsyncSeekExt, SeekFrom};

use super::listing;
use super::path::translate_path;
use super::router::RequestContext;
use crate::http::{self, cache, mime, FileHeaders};
use crate::logger;
use crate::transfer::{empty_body, file_body, ResponseBody, TokenBucket};

/// Index files looked up in a directory, in order
pub const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Serve whatever `ctx.path` resolves to under `root`
pub async fn serve_path(
    ctx: &RequestContext<'_>,
    root: &Path,
    limiter: &Arc<TokenBucket>,
) -> Response<ResponseBody> {
    let local = translate_path(root, ctx.path);

    // Missing files are common (404), no need to log at warning level
    let Ok(metadata) = fs::metadata(&local).await else {
        return http::build_404_response();
    };

    if metadata.is_dir() {
        if !ctx.path.ends_with('/') {
            return http::build_301_response(&redirect_target(ctx));
        }
        return match find_index(&local).await {
            Some(index) => serve_file(ctx, &index, limiter).await,
            None => listing::serve_listing(ctx, &local).await,
        };
    }

    // A file cannot be addressed as a directory
    if ctx.path.ends_with('/') {
        return http::build_404_response();
    }

    serve_file(ctx, &local, limiter).await
}

/// `Location` for a directory requested without its trailing slash
fn redirect_target(ctx: &RequestContext<'_>) -> String {
    match ctx.query {
        Some(query) => format!("{}/?{query}", ctx.path),
        None => format!("{}/", ctx.path),
    }
}

/// First existing index file inside `dir`
async fn find_index(dir: &Path) -> Option<PathBuf> {
    for name in INDEX_FILES {
        let candidate = dir.join(name);
        if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            return Some(candidate);
        }
    }
    None
}

/// Serve a single file with Range and If-Modified-Since support
async fn serve_file(
    ctx: &RequestContext<'_>,
    path: &Path,
    limiter: &Arc<TokenBucket>,
) -> Response<ResponseBody> {
    // The file may vanish between resolution and open
    let mut file = match File::open(path).await {
        Ok(f) => f,
        Err(e) => {
            logger::log_warning(&format!("Cannot open '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };
    let metadata = match file.metadata().await {
        Ok(m) => m,
        Err(e) => {
            logger::log_warning(&format!("Cannot stat '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };

    let file_size = metadata.len();
    let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
    let last_modified = cache::format_http_date(modified);
    let content_type = mime::content_type_for(path);

    let Some(range_header) = ctx.range_header.as_deref() else {
        if cache::is_not_modified(ctx.if_modified_since.as_deref(), modified) {
            return http::build_304_response(&last_modified);
        }
        let headers = FileHeaders {
            content_type,
            content_length: file_size,
            last_modified,
            content_range: None,
        };
        let body = body_for(ctx, file, file_size, limiter);
        return http::build_file_response(headers, body);
    };

    let range = match http::parse_range_header(range_header, file_size) {
        Ok(range) => range,
        Err(e) => {
            logger::log_warning(&format!(
                "Rejecting Range '{range_header}' for {}: {e}",
                ctx.path
            ));
            return http::build_416_response(file_size);
        }
    };

    if let Err(e) = file.seek(SeekFrom::Start(range.start())).await {
        logger::log_error(&format!(
            "Cannot seek '{}' to {}: {e}",
            path.display(),
            range.start()
        ));
        return http::build_404_response();
    }

    let headers = FileHeaders {
        content_type,
        content_length: range.len(),
        last_modified,
        content_range: Some(range.content_range()),
    };
    let body = body_for(ctx, file, range.len(), limiter);
    http::build_file_response(headers, body)
}

fn body_for(
    ctx: &RequestContext<'_>,
    file: File,
    length: u64,
    limiter: &Arc<TokenBucket>,
) -> ResponseBody {
    if ctx.is_head || length == 0 {
        empty_body()
    } else {
        file_body(file, length, Arc::clone(limiter), ctx.path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::{
        ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, LAST_MODIFIED, LOCATION,
    };
    use hyper::StatusCode;
    use tempfile::TempDir;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 256) as u8).collect()
    }

    fn fixture() -> (TempDir, Vec<u8>) {
        let dir = tempfile::tempdir().unwrap();
        let data = sample(40_000);
        std::fs::write(dir.path().join("data.bin"), &data).unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs").join("a.txt"), b"alpha").unwrap();
        (dir, data)
    }

    fn get<'a>(path: &'a str, range: Option<&str>) -> RequestContext<'a> {
        RequestContext {
            method: hyper::Method::GET,
            path,
            query: None,
            is_head: false,
            range_header: range.map(ToString::to_string),
            if_modified_since: None,
        }
    }

    async fn serve(root: &Path, ctx: &RequestContext<'_>) -> Response<ResponseBody> {
        serve_path(ctx, root, &Arc::new(TokenBucket::unlimited())).await
    }

    async fn body_bytes(resp: Response<ResponseBody>) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_full_file() {
        let (dir, data) = fixture();
        let resp = serve(dir.path(), &get("/data.bin", None)).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "40000");
        assert_eq!(resp.headers()[ACCEPT_RANGES], "bytes");
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/octet-stream");
        assert!(resp.headers().contains_key(LAST_MODIFIED));
        assert_eq!(body_bytes(resp).await, data);
    }

    #[tokio::test]
    async fn test_ranges_return_exact_slices() {
        let (dir, data) = fixture();
        for (a, b) in [(0u64, 0u64), (0, 16_383), (100, 20_099), (39_999, 39_999), (1, 39_999)] {
            let header = format!("bytes={a}-{b}");
            let resp = serve(dir.path(), &get("/data.bin", Some(&header))).await;

            assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
            assert_eq!(
                resp.headers()[CONTENT_LENGTH],
                (b - a + 1).to_string().as_str()
            );
            assert_eq!(
                resp.headers()[CONTENT_RANGE],
                format!("bytes {a}-{b}/40000").as_str()
            );
            let (a, b) = (usize::try_from(a).unwrap(), usize::try_from(b).unwrap());
            assert_eq!(body_bytes(resp).await, &data[a..=b]);
        }
    }

    #[tokio::test]
    async fn test_oversized_suffix_serves_everything() {
        let (dir, data) = fixture();
        let resp = serve(dir.path(), &get("/data.bin", Some("bytes=-999999"))).await;

        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes 0-39999/40000");
        assert_eq!(body_bytes(resp).await, data);
    }

    #[tokio::test]
    async fn test_unsatisfiable_ranges() {
        let (dir, _) = fixture();
        for header in ["bytes=40000-40010", "bytes=500-100", "bytes=0-1,5-9", "lines=1-2"] {
            let resp = serve(dir.path(), &get("/data.bin", Some(header))).await;
            assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE, "{header}");
            assert_eq!(resp.headers()[CONTENT_RANGE], "bytes */40000");
            assert!(body_bytes(resp).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let (dir, _) = fixture();
        let resp = serve(dir.path(), &get("/docs", None)).await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[LOCATION], "/docs/");

        let mut ctx = get("/docs", None);
        ctx.query = Some("sort=name");
        let resp = serve(dir.path(), &ctx).await;
        assert_eq!(resp.headers()[LOCATION], "/docs/?sort=name");
    }

    #[tokio::test]
    async fn test_index_html_preferred_over_listing() {
        let (dir, _) = fixture();
        std::fs::write(dir.path().join("index.htm"), b"<p>htm</p>").unwrap();
        std::fs::write(dir.path().join("index.html"), b"<p>html</p>").unwrap();

        let resp = serve(dir.path(), &get("/", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body_bytes(resp).await, b"<p>html</p>");
    }

    #[tokio::test]
    async fn test_index_htm_fallback() {
        let (dir, _) = fixture();
        std::fs::write(dir.path().join("docs").join("index.htm"), b"old").unwrap();

        let resp = serve(dir.path(), &get("/docs/", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_bytes(resp).await, b"old");
    }

    #[tokio::test]
    async fn test_listing_without_index() {
        let (dir, _) = fixture();
        let resp = serve(dir.path(), &get("/docs/", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = String::from_utf8(body_bytes(resp).await).unwrap();
        assert!(html.contains("Directory listing for /docs/"));
        assert!(html.contains("<a href=\"a.txt\">a.txt</a>"));
    }

    #[tokio::test]
    async fn test_missing_and_misaddressed_files() {
        let (dir, _) = fixture();
        let resp = serve(dir.path(), &get("/nope.txt", None)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = serve(dir.path(), &get("/data.bin/", None)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_stays_inside_root() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
        let root = outer.path().join("share");
        std::fs::create_dir(&root).unwrap();

        let resp = serve(&root, &get("/../secret.txt", None)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = serve(&root, &get("/%2e%2e/secret.txt", None)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_head_has_headers_but_no_body() {
        let (dir, _) = fixture();
        let mut ctx = get("/data.bin", Some("bytes=10-19"));
        ctx.is_head = true;
        let resp = serve(dir.path(), &ctx).await;

        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "10");
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_if_modified_since() {
        let (dir, _) = fixture();
        let first = serve(dir.path(), &get("/data.bin", None)).await;
        let last_modified = first.headers()[LAST_MODIFIED].to_str().unwrap().to_string();

        let mut ctx = get("/data.bin", None);
        ctx.if_modified_since = Some(last_modified.clone());
        let resp = serve(dir.path(), &ctx).await;
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert!(body_bytes(resp).await.is_empty());

        // Range requests ignore the validator
        let mut ctx = get("/data.bin", Some("bytes=0-9"));
        ctx.if_modified_since = Some(last_modified);
        let resp = serve(dir.path(), &ctx).await;
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    }

    #[tokio::test]
    async fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.txt"), b"").unwrap();

        let resp = serve(dir.path(), &get("/empty.txt", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "0");

        let resp = serve(dir.path(), &get("/empty.txt", Some("bytes=0-"))).await;
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes */0");
    }
}
