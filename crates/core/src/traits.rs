//! PageSource and ObjectSink trait definitions
//!
//! These traits decouple the traversal engine from the storage SDK on one
//! side and from result consumption on the other. The engine only ever sees
//! pages of prefixes or object records, and hands everything it discovers to
//! a caller-supplied sink.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata for one discovered object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Object key
    pub key: String,

    /// Size in bytes
    pub size_bytes: i64,

    /// Human-readable size
    pub size_human: String,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl ObjectRecord {
    /// Create a new ObjectRecord with the given key and size
    pub fn new(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: size,
            size_human: humansize::format_size(size.max(0) as u64, humansize::BINARY),
            last_modified: None,
            etag: None,
        }
    }
}

/// Options for a single page fetch
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Delimiter for hierarchical grouping; `None` lists every key under the
    /// prefix regardless of depth
    pub delimiter: Option<String>,

    /// Opaque continuation token from the previous page
    pub continuation_token: Option<String>,

    /// Maximum number of keys to return per request
    pub max_keys: Option<i32>,
}

impl ListOptions {
    /// Options for hierarchically grouped listing (one directory level)
    pub fn delimited(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: Some(delimiter.into()),
            ..Self::default()
        }
    }

    /// Options for flat listing of the entire subtree
    pub fn flat() -> Self {
        Self::default()
    }

    /// Replace the continuation token, keeping everything else
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }

    /// Replace the page size hint, keeping everything else
    pub fn with_max_keys(mut self, max_keys: Option<i32>) -> Self {
        self.max_keys = max_keys;
        self
    }
}

/// One page of common prefixes
#[derive(Debug, Clone, Default)]
pub struct PrefixPage {
    /// Discovered common prefixes
    pub prefixes: Vec<String>,

    /// Token for the next page; `None` when this is the last page
    pub next_token: Option<String>,
}

/// One page of object records
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Discovered objects
    pub objects: Vec<ObjectRecord>,

    /// Token for the next page; `None` when this is the last page
    pub next_token: Option<String>,
}

/// Paginated listing capability of the storage service
///
/// Each call fetches exactly one page. Re-fetching a page with the same
/// continuation token yields the same entries, so callers may safely retry a
/// failed fetch without duplicating entries from earlier pages. An empty page
/// is a normal result, not an error.
///
/// Implemented by the S3 adapter; test code supplies in-memory fakes.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page of common prefixes directly under `prefix`
    async fn list_prefixes(
        &self,
        bucket: &str,
        prefix: &str,
        options: ListOptions,
    ) -> Result<PrefixPage>;

    /// Fetch one page of objects under `prefix`
    ///
    /// With a delimiter set, only direct children are returned; without one,
    /// every key under the prefix is returned.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        options: ListOptions,
    ) -> Result<ObjectPage>;
}

/// Consumer of discovered objects and prefixes
///
/// The engine calls the sink from multiple workers concurrently and is
/// agnostic to what happens with a record after emission.
pub trait ObjectSink: Send + Sync {
    /// An object was discovered
    fn on_object(&self, record: ObjectRecord);

    /// A common prefix was discovered and queued for expansion
    fn on_prefix(&self, prefix: &str);
}
