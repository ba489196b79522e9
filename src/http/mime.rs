//! MIME type detection module
//!
//! Returns the Content-Type for a file name, backed by the `mime_guess` table.

use std::path::Path;

/// Get MIME Content-Type based on the file name's extension
///
/// # Examples
/// ```
/// use fileshare::http::mime::content_type_for;
/// assert_eq!(content_type_for("index.html".as_ref()), "text/html; charset=utf-8");
/// assert_eq!(content_type_for("movie.mp4".as_ref()), "video/mp4");
/// assert_eq!(content_type_for("blob".as_ref()), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() == mime_guess::mime::TEXT && mime.get_param("charset").is_none() {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(
            content_type_for(Path::new("a/index.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            content_type_for(Path::new("style.css")),
            "text/css; charset=utf-8"
        );
        assert_eq!(content_type_for(Path::new("photo.png")), "image/png");
        assert_eq!(content_type_for(Path::new("movie.mp4")), "video/mp4");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(
            content_type_for(Path::new("data.unknownext")),
            "application/octet-stream"
        );
        assert_eq!(
            content_type_for(Path::new("Makefile")),
            "application/octet-stream"
        );
    }
}
