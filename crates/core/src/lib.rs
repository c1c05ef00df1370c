//! sw-core: Core library for the s3walk namespace enumerator
//!
//! This crate provides the core functionality of s3walk, including:
//! - Path parsing for `s3://` URIs
//! - The PageSource and ObjectSink traits
//! - The exponential-backoff retry policy
//! - The concurrent breadth-first traversal engine
//! - Configuration management
//!
//! This crate is independent of any specific S3 SDK, allowing the traversal
//! engine to be tested against in-memory page sources.

pub mod config;
pub mod error;
pub mod path;
pub mod retry;
pub mod traits;
pub mod walker;

pub use config::{Config, ConfigManager};
pub use error::{Error, Result};
pub use path::{DELIMITER, S3Path, is_dir_like, parse_s3_path};
pub use retry::{RetryPolicy, retry_with_backoff};
pub use traits::{ListOptions, ObjectPage, ObjectRecord, ObjectSink, PageSource, PrefixPage};
pub use walker::{WalkConfig, WalkSummary, Walker};
