//! OSC address handling
//!
//! OSCQuery addresses are slash-delimited paths:
//! ```text
//! /
//! /avatar/parameters/VelocityX
//! /tracking/head/position
//! ```
//!
//! Lookup is an exact, case-sensitive match on each segment. Empty segments
//! (doubled or trailing slashes) are ignored, so `/a//b/` addresses `/a/b`.

use crate::{Error, Result};

/// Check that `path` is usable as an endpoint address
pub fn validate(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::InvalidAddress("empty address".to_string()));
    }

    if !path.starts_with('/') {
        return Err(Error::InvalidAddress(format!(
            "an OSC path must start with '/': {}",
            path
        )));
    }

    Ok(())
}

/// Iterate over the non-empty segments of a path
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Build the absolute path for a list of segments
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }

    let mut path = String::new();
    for seg in segments {
        path.push('/');
        path.push_str(seg.as_ref());
    }
    path
}

/// Canonical form of a path (leading slash, no empty segments)
pub fn normalize(path: &str) -> String {
    let segs: Vec<&str> = segments(path).collect();
    join(&segs)
}

/// Parent path of an address, `None` for the root
pub fn parent(path: &str) -> Option<String> {
    let segs: Vec<&str> = segments(path).collect();
    segs.split_last().map(|(_, parents)| join(parents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(validate("/avatar/parameters").is_ok());
        assert!(validate("/").is_ok());
        assert!(validate("").is_err());
        assert!(validate("avatar/parameters").is_err());
    }

    #[test]
    fn test_segments_skip_empty() {
        let segs: Vec<&str> = segments("/a//b/").collect();
        assert_eq!(segs, vec!["a", "b"]);
        assert_eq!(segments("/").count(), 0);
        assert_eq!(segments("").count(), 0);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/a//b/"), "/a/b");
        assert_eq!(normalize("a/b"), "/a/b");
        assert_eq!(normalize(""), "/");
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("/a/b/c"), Some("/a/b".to_string()));
        assert_eq!(parent("/a"), Some("/".to_string()));
        assert_eq!(parent("/"), None);
    }
}
