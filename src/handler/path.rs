//! Request path translation
//!
//! Maps URL paths onto the share root. Translation is a sandboxed join:
//! `.`, `..` and empty segments are dropped, so the result never climbs above
//! the root. Symbolic links inside the root are followed on purpose, since the
//! temporary share root consists of nothing but links.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::{Path, PathBuf};

/// Characters left untouched when encoding one path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Translate a (percent-encoded) request path into a path under `root`
pub fn translate_path(root: &Path, request_path: &str) -> PathBuf {
    let decoded = percent_decode_str(request_path).decode_utf8_lossy();
    let mut local = root.to_path_buf();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
            continue;
        }
        local.push(segment);
    }
    local
}

/// Percent-decoded form of a request path, for display
pub fn decode_path(request_path: &str) -> String {
    percent_decode_str(request_path)
        .decode_utf8_lossy()
        .into_owned()
}

/// Percent-encode a single path segment (file or directory name)
pub fn encode_segment(name: &str) -> String {
    utf8_percent_encode(name, SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        let root = Path::new("/srv/share");
        assert_eq!(
            translate_path(root, "/docs/readme.txt"),
            PathBuf::from("/srv/share/docs/readme.txt")
        );
        assert_eq!(translate_path(root, "/"), PathBuf::from("/srv/share"));
    }

    #[test]
    fn test_traversal_segments_are_dropped() {
        let root = Path::new("/srv/share");
        assert_eq!(
            translate_path(root, "/../../etc/passwd"),
            PathBuf::from("/srv/share/etc/passwd")
        );
        assert_eq!(
            translate_path(root, "/a/./b/%2e%2e/c"),
            PathBuf::from("/srv/share/a/b/c")
        );
        assert_eq!(
            translate_path(root, "/%2F..%2F..%2Fetc"),
            PathBuf::from("/srv/share/etc")
        );
    }

    #[test]
    fn test_percent_decoding() {
        let root = Path::new("/srv/share");
        assert_eq!(
            translate_path(root, "/my%20file.txt"),
            PathBuf::from("/srv/share/my file.txt")
        );
        assert_eq!(decode_path("/caf%C3%A9/"), "/café/");
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("my file.txt"), "my%20file.txt");
        assert_eq!(encode_segment("a&b#c"), "a%26b%23c");
        assert_eq!(encode_segment("plain-name_1.tar.gz"), "plain-name_1.tar.gz");
    }
}
