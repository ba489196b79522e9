//! Directory listing module
//!
//! Minimal HTML index for directories without an index file.

use hyper::Response;
use std::fmt::Write;
use std::io;
use std::path::Path;
use tokio::fs;

use super::path::{decode_path, encode_segment};
use super::router::RequestContext;
use crate::http;
use crate::logger;
use crate::transfer::ResponseBody;

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

/// Serve the listing of `dir`, or 404 if it cannot be read
pub async fn serve_listing(ctx: &RequestContext<'_>, dir: &Path) -> Response<ResponseBody> {
    match read_entries(dir).await {
        Ok(entries) => {
            let html = render_listing(&decode_path(ctx.path), &entries);
            http::build_html_response(html, ctx.is_head)
        }
        Err(e) => {
            logger::log_warning(&format!(
                "Cannot list directory '{}': {e}",
                dir.display()
            ));
            http::build_404_response()
        }
    }
}

/// Read and sort the entries of a directory (case-insensitive by name)
pub async fn read_entries(dir: &Path) -> io::Result<Vec<ListingEntry>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let is_symlink = entry.file_type().await?.is_symlink();
        // Follows links, so a link to a directory lists as a directory
        let is_dir = fs::metadata(entry.path())
            .await
            .is_ok_and(|m| m.is_dir());
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }

    entries.sort_by_cached_key(|e| e.name.to_lowercase());
    Ok(entries)
}

/// Render the listing page for `display_path`
pub fn render_listing(display_path: &str, entries: &[ListingEntry]) -> String {
    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );

    for entry in entries {
        let mut href = encode_segment(&entry.name);
        let mut label = entry.name.clone();
        if entry.is_dir {
            href.push('/');
            label.push('/');
        }
        if entry.is_symlink {
            label = format!("{}@", entry.name);
        }
        let _ = writeln!(html, "<li><a href=\"{href}\">{}</a></li>", escape_html(&label));
    }

    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, is_dir: bool, is_symlink: bool) -> ListingEntry {
        ListingEntry {
            name: name.to_string(),
            is_dir,
            is_symlink,
        }
    }

    #[test]
    fn test_render_marks_dirs_and_links() {
        let html = render_listing(
            "/pub/",
            &[
                entry("docs", true, false),
                entry("notes.txt", false, false),
                entry("video.mp4", false, true),
            ],
        );
        assert!(html.contains("<title>Directory listing for /pub/</title>"));
        assert!(html.contains("<a href=\"docs/\">docs/</a>"));
        assert!(html.contains("<a href=\"notes.txt\">notes.txt</a>"));
        assert!(html.contains("<a href=\"video.mp4\">video.mp4@</a>"));
    }

    #[test]
    fn test_render_escapes_names() {
        let html = render_listing("/", &[entry("<b>&x y", false, false)]);
        assert!(html.contains("<a href=\"%3Cb%3E%26x%20y\">&lt;b&gt;&amp;x y</a>"));
    }

    #[tokio::test]
    async fn test_read_entries_sorted_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("beta.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("Alpha.txt"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("gamma")).unwrap();

        let entries = read_entries(dir.path()).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Alpha.txt", "beta.txt", "gamma"]);
        assert!(entries[2].is_dir);
        assert!(!entries[0].is_symlink);
    }
}
