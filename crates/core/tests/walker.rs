//! Traversal engine tests against an in-memory page source
//!
//! The fake source serves a fixed key namespace through the same paginated,
//! delimiter-grouped interface the S3 adapter exposes, with per-prefix
//! failure injection to exercise retry and partial-failure behavior.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sw_core::error::{Error, Result};
use sw_core::path::S3Path;
use sw_core::retry::RetryPolicy;
use sw_core::traits::{
    ListOptions, ObjectPage, ObjectRecord, ObjectSink, PageSource, PrefixPage,
};
use sw_core::walker::{WalkConfig, WalkSummary, Walker};

const BUCKET: &str = "test-bucket";

/// Failure script for one prefix
#[derive(Debug, Clone, Copy)]
enum Fail {
    /// Every call for this prefix fails
    Always,
    /// The next `n` calls for this prefix fail, then calls succeed
    Times(u32),
}

/// In-memory page source over a fixed set of keys
struct MemorySource {
    keys: BTreeMap<String, i64>,
    page_size: usize,
    failures: Mutex<HashMap<String, Fail>>,
}

impl MemorySource {
    fn new(keys: &[(&str, i64)]) -> Self {
        Self {
            keys: keys.iter().map(|(k, s)| (k.to_string(), *s)).collect(),
            page_size: 2,
            failures: Mutex::new(HashMap::new()),
        }
    }

    fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    fn fail_prefix(self, prefix: &str, fail: Fail) -> Self {
        self.failures.lock().unwrap().insert(prefix.into(), fail);
        self
    }

    /// Consume one scripted failure for this prefix, if any
    fn check_failure(&self, prefix: &str) -> Result<()> {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(prefix) {
            Some(Fail::Always) => Err(Error::Network(format!("injected failure for {prefix}"))),
            Some(Fail::Times(n)) if *n > 0 => {
                *n -= 1;
                Err(Error::Network(format!("injected failure for {prefix}")))
            }
            _ => Ok(()),
        }
    }

    /// Slice one page out of a full listing; the token is a plain offset
    fn paginate<T: Clone>(&self, items: Vec<T>, token: Option<String>) -> (Vec<T>, Option<String>) {
        let offset: usize = token.as_deref().map_or(0, |t| t.parse().unwrap());
        let end = (offset + self.page_size).min(items.len());
        let next = (end < items.len()).then(|| end.to_string());
        (items[offset..end].to_vec(), next)
    }
}

#[async_trait]
impl PageSource for MemorySource {
    async fn list_prefixes(
        &self,
        bucket: &str,
        prefix: &str,
        options: ListOptions,
    ) -> Result<PrefixPage> {
        assert_eq!(bucket, BUCKET);
        self.check_failure(prefix)?;

        let groups: BTreeSet<String> = self
            .keys
            .keys()
            .filter_map(|key| {
                let rest = key.strip_prefix(prefix)?;
                let slash = rest.find('/')?;
                Some(format!("{prefix}{}", &rest[..=slash]))
            })
            .collect();

        let (prefixes, next_token) =
            self.paginate(groups.into_iter().collect(), options.continuation_token);
        Ok(PrefixPage {
            prefixes,
            next_token,
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        options: ListOptions,
    ) -> Result<ObjectPage> {
        assert_eq!(bucket, BUCKET);
        self.check_failure(prefix)?;

        let hierarchical = options.delimiter.is_some();
        let matches: Vec<ObjectRecord> = self
            .keys
            .iter()
            .filter_map(|(key, size)| {
                let rest = key.strip_prefix(prefix)?;
                if hierarchical && rest.contains('/') {
                    return None;
                }
                Some(ObjectRecord::new(key, *size))
            })
            .collect();

        let (objects, next_token) = self.paginate(matches, options.continuation_token);
        Ok(ObjectPage {
            objects,
            next_token,
        })
    }
}

/// Sink that accumulates everything it is handed
#[derive(Default)]
struct CollectSink {
    objects: Mutex<Vec<ObjectRecord>>,
    prefixes: Mutex<Vec<String>>,
}

impl ObjectSink for CollectSink {
    fn on_object(&self, record: ObjectRecord) {
        self.objects.lock().unwrap().push(record);
    }

    fn on_prefix(&self, prefix: &str) {
        self.prefixes.lock().unwrap().push(prefix.to_string());
    }
}

impl CollectSink {
    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.key.clone())
            .collect();
        keys.sort();
        keys
    }
}

fn sample_namespace() -> Vec<(&'static str, i64)> {
    vec![
        ("alpha/one.parquet", 100),
        ("alpha/two.parquet", 200),
        ("alpha/inner/three.parquet", 300),
        ("alpha/inner/deeper/six.parquet", 600),
        ("beta/four.parquet", 50),
        ("beta/deep/five.parquet", 75),
        ("manifest.json", 10),
    ]
}

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
    }
}

fn config(workers: usize) -> WalkConfig {
    WalkConfig {
        workers,
        retry: fast_retry(2),
        ..WalkConfig::default()
    }
}

/// Run a walk with a termination bound; a hung frontier fails the test
async fn run_bounded(
    source: MemorySource,
    config: WalkConfig,
    start: &str,
) -> (WalkSummary, Arc<CollectSink>) {
    let sink = Arc::new(CollectSink::default());
    let walker = Walker::new(source, config);
    let path = S3Path::new(BUCKET, start);
    let summary = tokio::time::timeout(Duration::from_secs(10), walker.run(&path, sink.clone()))
        .await
        .expect("traversal did not terminate");
    (summary, sink)
}

#[tokio::test]
async fn emits_every_object_exactly_once_for_any_parallelism() {
    let expected: Vec<String> = {
        let mut keys: Vec<String> = sample_namespace()
            .iter()
            .map(|(k, _)| k.to_string())
            .collect();
        keys.sort();
        keys
    };
    let expected_bytes: u64 = sample_namespace().iter().map(|(_, s)| *s as u64).sum();

    for workers in [1, 2, 5, 20] {
        let source = MemorySource::new(&sample_namespace());
        let (summary, sink) = run_bounded(source, config(workers), "").await;

        assert_eq!(sink.keys(), expected, "workers={workers}");
        assert_eq!(summary.objects, expected.len() as u64, "workers={workers}");
        assert_eq!(summary.bytes, expected_bytes, "workers={workers}");
        assert!(summary.is_clean(), "workers={workers}");
    }
}

#[tokio::test]
async fn reports_discovered_prefixes() {
    let source = MemorySource::new(&sample_namespace());
    let (summary, sink) = run_bounded(source, config(4), "").await;

    let mut prefixes = sink.prefixes.lock().unwrap().clone();
    prefixes.sort();
    // Expansion stops at max_depth 2, so deeper prefixes are never grouped.
    assert_eq!(
        prefixes,
        vec!["alpha/", "alpha/inner/", "beta/", "beta/deep/"]
    );
    assert_eq!(summary.prefixes, 4);
}

#[tokio::test]
async fn deep_chain_is_enumerated_via_flat_fallback() {
    let keys = vec![
        ("a/b/c/d/e/file.bin", 1),
        ("a/b/c/other.bin", 2),
        ("a/top.bin", 3),
    ];
    let source = MemorySource::new(&keys);
    let (summary, sink) = run_bounded(source, config(3), "").await;

    assert_eq!(
        sink.keys(),
        vec!["a/b/c/d/e/file.bin", "a/b/c/other.bin", "a/top.bin"]
    );
    assert_eq!(summary.objects, 3);
    assert!(summary.is_clean());
}

#[tokio::test]
async fn permanent_failure_is_isolated_to_its_prefix() {
    let source = MemorySource::new(&sample_namespace()).fail_prefix("beta/", Fail::Always);
    let (summary, sink) = run_bounded(source, config(4), "").await;

    // Everything outside the failing subtree is still emitted.
    let mut expected: Vec<String> = sample_namespace()
        .iter()
        .map(|(k, _)| k.to_string())
        .filter(|k| !k.starts_with("beta/"))
        .collect();
    expected.sort();
    assert_eq!(sink.keys(), expected);
    assert_eq!(summary.failed, vec!["beta/".to_string()]);
}

#[tokio::test]
async fn transient_failures_are_retried_without_duplicates() {
    let source = MemorySource::new(&sample_namespace()).fail_prefix("alpha/", Fail::Times(3));
    let mut config = config(4);
    config.retry = fast_retry(8);
    let (summary, sink) = run_bounded(source, config, "").await;

    let mut expected: Vec<String> = sample_namespace()
        .iter()
        .map(|(k, _)| k.to_string())
        .collect();
    expected.sort();
    assert_eq!(sink.keys(), expected);
    assert!(summary.is_clean());
}

#[tokio::test]
async fn failure_within_retry_budget_still_fails_when_budget_smaller() {
    let source = MemorySource::new(&sample_namespace()).fail_prefix("alpha/", Fail::Times(3));
    // Only 2 attempts: the third injected failure is never reached and the
    // prefix is abandoned.
    let (summary, sink) = run_bounded(source, config(2), "").await;

    assert_eq!(summary.failed, vec!["alpha/".to_string()]);
    assert!(sink.keys().iter().all(|k| !k.starts_with("alpha/")));
}

#[tokio::test]
async fn empty_namespace_terminates_immediately() {
    let source = MemorySource::new(&[]);
    let (summary, sink) = run_bounded(source, config(5), "").await;

    assert_eq!(summary.objects, 0);
    assert_eq!(summary.prefixes, 0);
    assert!(summary.is_clean());
    assert!(sink.keys().is_empty());
}

#[tokio::test]
async fn start_prefix_without_delimiter_uses_flat_listing() {
    let source = MemorySource::new(&sample_namespace());
    let (summary, sink) = run_bounded(source, config(2), "alpha/one.parquet").await;

    assert_eq!(sink.keys(), vec!["alpha/one.parquet"]);
    assert_eq!(summary.objects, 1);
    // Nothing was expanded, so no prefixes were reported.
    assert_eq!(summary.prefixes, 0);
}

#[tokio::test]
async fn start_prefix_within_tree_scopes_the_walk() {
    let source = MemorySource::new(&sample_namespace());
    let (summary, sink) = run_bounded(source, config(3), "alpha/").await;

    assert_eq!(
        sink.keys(),
        vec![
            "alpha/inner/deeper/six.parquet",
            "alpha/inner/three.parquet",
            "alpha/one.parquet",
            "alpha/two.parquet",
        ]
    );
    assert_eq!(summary.objects, 4);
    assert!(summary.is_clean());
}

#[tokio::test]
async fn single_entry_pages_produce_identical_results() {
    let expected: Vec<String> = {
        let mut keys: Vec<String> = sample_namespace()
            .iter()
            .map(|(k, _)| k.to_string())
            .collect();
        keys.sort();
        keys
    };

    let source = MemorySource::new(&sample_namespace()).with_page_size(1);
    let (summary, sink) = run_bounded(source, config(5), "").await;

    assert_eq!(sink.keys(), expected);
    assert_eq!(summary.objects, expected.len() as u64);
}
