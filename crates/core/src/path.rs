//! Path parsing for `s3://` URIs
//!
//! A walk starts from a fully qualified `s3://bucket[/prefix]` path.
//! Parsing is a pure function: no I/O, no validation against the service.

use crate::error::{Error, Result};

/// The key delimiter implied by directory-like prefixes.
pub const DELIMITER: char = '/';

/// URI scheme accepted by [`parse_s3_path`].
const SCHEME: &str = "s3://";

/// A parsed S3 location: bucket plus key prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Path {
    /// Bucket name
    pub bucket: String,
    /// Key prefix (empty for the bucket root)
    pub prefix: String,
}

impl S3Path {
    /// Create a new S3Path
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Whether the prefix has directory semantics; see [`is_dir_like`]
    pub fn is_dir(&self) -> bool {
        is_dir_like(&self.prefix)
    }
}

/// Whether a raw key prefix has directory semantics.
///
/// The bucket root (empty prefix) is directory-like, as is any prefix ending
/// with the delimiter. Anything else names a single key or a key fragment and
/// can only be flat-listed.
pub fn is_dir_like(prefix: &str) -> bool {
    prefix.is_empty() || prefix.ends_with(DELIMITER)
}

impl std::fmt::Display for S3Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{SCHEME}{}/{}", self.bucket, self.prefix)
    }
}

/// Parse an `s3://bucket[/prefix]` string into an [`S3Path`]
///
/// The prefix defaults to the empty string when absent. A missing scheme or
/// empty bucket component fails with [`Error::InvalidPath`].
pub fn parse_s3_path(path: &str) -> Result<S3Path> {
    let Some(rest) = path.strip_prefix(SCHEME) else {
        return Err(Error::InvalidPath(format!(
            "'{path}' must start with '{SCHEME}'"
        )));
    };

    let (bucket, prefix) = match rest.split_once(DELIMITER) {
        Some((bucket, prefix)) => (bucket, prefix),
        None => (rest, ""),
    };

    if bucket.is_empty() {
        return Err(Error::InvalidPath(format!(
            "'{path}' is missing a bucket name"
        )));
    }

    Ok(S3Path::new(bucket, prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bucket_and_prefix() {
        let path = parse_s3_path("s3://bucket/a/b/").unwrap();
        assert_eq!(path.bucket, "bucket");
        assert_eq!(path.prefix, "a/b/");
        assert!(path.is_dir());
    }

    #[test]
    fn test_parse_bucket_only() {
        let path = parse_s3_path("s3://bucket").unwrap();
        assert_eq!(path.bucket, "bucket");
        assert_eq!(path.prefix, "");
        assert!(path.is_dir());
    }

    #[test]
    fn test_parse_bucket_trailing_slash() {
        let path = parse_s3_path("s3://bucket/").unwrap();
        assert_eq!(path.bucket, "bucket");
        assert_eq!(path.prefix, "");
    }

    #[test]
    fn test_parse_object_key() {
        let path = parse_s3_path("s3://bucket/a/b/object.parquet").unwrap();
        assert_eq!(path.prefix, "a/b/object.parquet");
        assert!(!path.is_dir());
    }

    #[test]
    fn test_parse_missing_scheme() {
        let result = parse_s3_path("bucket/a/b/");
        assert!(matches!(result, Err(Error::InvalidPath(_))));

        let result = parse_s3_path("gs://bucket/a/");
        assert!(matches!(result, Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_parse_empty_bucket() {
        assert!(matches!(
            parse_s3_path("s3://"),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            parse_s3_path("s3:///prefix/"),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let path = parse_s3_path("s3://bucket/a/b/").unwrap();
        assert_eq!(path.to_string(), "s3://bucket/a/b/");
    }
}
