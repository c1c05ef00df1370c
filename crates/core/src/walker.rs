//! Concurrent breadth-first traversal of a prefix tree
//!
//! The walker enumerates every object under a starting prefix with a fixed
//! pool of workers sharing one frontier queue. Directory-like prefixes are
//! expanded level by level up to a depth limit; anything deeper is enumerated
//! with a single flat (no-delimiter) listing per frontier item, trading one
//! broad call for unbounded recursive fan-out.
//!
//! Termination is gated on an explicit pending-work counter, not on queue
//! length: a worker may be mid-item with nothing queued while its children are
//! still about to be enqueued. The counter is incremented on every enqueue and
//! decremented only after an item's processing, including all of its own
//! enqueues, has completed. Once it reaches zero the driver delivers exactly
//! one shutdown sentinel per worker.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio::task::JoinSet;

use crate::error::Result;
use crate::path::{DELIMITER, S3Path, is_dir_like};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::traits::{ListOptions, ObjectSink, PageSource};

/// Default number of concurrent workers
pub const DEFAULT_WORKERS: usize = 10;

/// Default depth limit for hierarchical expansion
pub const DEFAULT_MAX_DEPTH: u32 = 2;

/// One unit of traversal work
#[derive(Debug, Clone)]
enum WorkItem {
    /// A prefix to expand or flat-list, with its expansion depth
    Prefix { prefix: String, depth: u32 },

    /// Shutdown sentinel; one is delivered per worker, never re-enqueued
    Shutdown,
}

/// Shared frontier: an MPMC queue of work items plus the pending-work counter
struct Frontier {
    items: Mutex<VecDeque<WorkItem>>,
    not_empty: Notify,
    pending: AtomicUsize,
    drained: Notify,
}

impl Frontier {
    fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            not_empty: Notify::new(),
            pending: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    /// Enqueue a prefix. Counts as outstanding work until [`Frontier::task_done`].
    fn push(&self, prefix: String, depth: u32) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.items
            .lock()
            .expect("frontier lock poisoned")
            .push_back(WorkItem::Prefix { prefix, depth });
        self.not_empty.notify_one();
    }

    /// Enqueue a shutdown sentinel. Sentinels are not outstanding work.
    fn push_shutdown(&self) {
        self.items
            .lock()
            .expect("frontier lock poisoned")
            .push_back(WorkItem::Shutdown);
        self.not_empty.notify_one();
    }

    /// Dequeue the next item, waiting while the queue is empty
    async fn pop(&self) -> WorkItem {
        loop {
            // Register interest before checking, so a push between the check
            // and the await still wakes us.
            let notified = self.not_empty.notified();
            if let Some(item) = self
                .items
                .lock()
                .expect("frontier lock poisoned")
                .pop_front()
            {
                return item;
            }
            notified.await;
        }
    }

    /// Mark one previously pushed prefix as fully processed
    fn task_done(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    /// Wait until every pushed prefix has been marked done
    async fn join(&self) {
        loop {
            let notified = self.drained.notified();
            if self.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Traversal tuning knobs
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Number of concurrent workers; also bounds in-flight listing calls
    pub workers: usize,

    /// Levels of hierarchical expansion before falling back to flat listing
    pub max_depth: u32,

    /// Backoff policy applied to each page fetch
    pub retry: RetryPolicy,

    /// Page size hint passed to the page source
    pub max_keys: Option<i32>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_depth: DEFAULT_MAX_DEPTH,
            retry: RetryPolicy::default(),
            max_keys: None,
        }
    }
}

/// Outcome of one traversal
///
/// Per-prefix failures do not abort the run; they are recorded here and the
/// run still counts as successful.
#[derive(Debug, Default)]
pub struct WalkSummary {
    /// Objects emitted to the sink
    pub objects: u64,

    /// Common prefixes discovered and expanded
    pub prefixes: u64,

    /// Total size of emitted objects in bytes
    pub bytes: u64,

    /// Prefixes abandoned after exhausting retries
    pub failed: Vec<String>,
}

impl WalkSummary {
    /// Whether every frontier item was processed without exhausting retries
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// State shared by all workers of one traversal
struct WalkContext<S: ?Sized> {
    source: Arc<S>,
    sink: Arc<dyn ObjectSink>,
    frontier: Frontier,
    bucket: String,
    config: WalkConfig,
    objects: AtomicU64,
    prefixes: AtomicU64,
    bytes: AtomicU64,
    failed: Mutex<Vec<String>>,
}

/// Breadth-first prefix-tree walker
pub struct Walker<S> {
    source: Arc<S>,
    config: WalkConfig,
}

impl<S: PageSource + 'static> Walker<S> {
    /// Create a walker over the given page source
    pub fn new(source: S, config: WalkConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
        }
    }

    /// Enumerate every object under `path`, handing discoveries to `sink`
    pub async fn run(&self, path: &S3Path, sink: Arc<dyn ObjectSink>) -> WalkSummary {
        let workers = self.config.workers.max(1);
        let ctx = Arc::new(WalkContext {
            source: Arc::clone(&self.source),
            sink,
            frontier: Frontier::new(),
            bucket: path.bucket.clone(),
            config: self.config.clone(),
            objects: AtomicU64::new(0),
            prefixes: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            failed: Mutex::new(Vec::new()),
        });

        ctx.frontier.push(path.prefix.clone(), 0);

        let mut tasks = JoinSet::new();
        for id in 0..workers {
            let ctx = Arc::clone(&ctx);
            tasks.spawn(worker(id, ctx));
        }

        ctx.frontier.join().await;
        for _ in 0..workers {
            ctx.frontier.push_shutdown();
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "walker task panicked");
            }
        }

        WalkSummary {
            objects: ctx.objects.load(Ordering::Relaxed),
            prefixes: ctx.prefixes.load(Ordering::Relaxed),
            bytes: ctx.bytes.load(Ordering::Relaxed),
            failed: std::mem::take(&mut *ctx.failed.lock().expect("failed-list lock poisoned")),
        }
    }
}

/// Worker loop: dequeue until the shutdown sentinel arrives
async fn worker<S: PageSource>(id: usize, ctx: Arc<WalkContext<S>>) {
    loop {
        match ctx.frontier.pop().await {
            WorkItem::Shutdown => break,
            WorkItem::Prefix { prefix, depth } => {
                if let Err(err) = process(&ctx, &prefix, depth).await {
                    // A single bad prefix must not abort the traversal.
                    tracing::warn!(
                        worker = id,
                        bucket = %ctx.bucket,
                        prefix = %prefix,
                        error = %err,
                        "abandoning prefix after exhausting retries"
                    );
                    ctx.failed
                        .lock()
                        .expect("failed-list lock poisoned")
                        .push(prefix);
                }
                // Done regardless of outcome, after any enqueues of children.
                ctx.frontier.task_done();
            }
        }
    }
    tracing::debug!(worker = id, "worker exiting");
}

async fn process<S: PageSource>(ctx: &WalkContext<S>, prefix: &str, depth: u32) -> Result<()> {
    if depth < ctx.config.max_depth && is_dir_like(prefix) {
        expand(ctx, prefix, depth).await
    } else {
        drain_objects(ctx, prefix, ListOptions::flat()).await
    }
}

/// Expand one directory level: feed subprefixes back into the frontier, then
/// emit the objects directly under this prefix (they do not recurse)
async fn expand<S: PageSource>(ctx: &WalkContext<S>, prefix: &str, depth: u32) -> Result<()> {
    let mut token: Option<String> = None;
    loop {
        let page = retry_with_backoff(&ctx.config.retry, || {
            let opts = ListOptions::delimited(DELIMITER)
                .with_token(token.clone())
                .with_max_keys(ctx.config.max_keys);
            ctx.source.list_prefixes(&ctx.bucket, prefix, opts)
        })
        .await?;

        if page.prefixes.is_empty() && token.is_none() && page.next_token.is_none() {
            tracing::debug!(bucket = %ctx.bucket, prefix = %prefix, "no common prefixes under prefix");
        }
        for sub in page.prefixes {
            tracing::debug!(bucket = %ctx.bucket, prefix = %sub, depth = depth + 1, "queueing subprefix");
            ctx.sink.on_prefix(&sub);
            ctx.prefixes.fetch_add(1, Ordering::Relaxed);
            ctx.frontier.push(sub, depth + 1);
        }

        token = page.next_token;
        if token.is_none() {
            break;
        }
    }

    drain_objects(ctx, prefix, ListOptions::delimited(DELIMITER)).await
}

/// Page through `list_objects` and emit every record to the sink
///
/// Delimited base options yield only direct children; flat ones yield the
/// whole subtree. Each page fetch is retried independently, so a retry never
/// re-emits pages that were already consumed.
async fn drain_objects<S: PageSource>(
    ctx: &WalkContext<S>,
    prefix: &str,
    base: ListOptions,
) -> Result<()> {
    let mut token: Option<String> = None;
    loop {
        let page = retry_with_backoff(&ctx.config.retry, || {
            let opts = base
                .clone()
                .with_token(token.clone())
                .with_max_keys(ctx.config.max_keys);
            ctx.source.list_objects(&ctx.bucket, prefix, opts)
        })
        .await?;

        if page.objects.is_empty() && token.is_none() && page.next_token.is_none() {
            tracing::debug!(bucket = %ctx.bucket, prefix = %prefix, "no objects under prefix");
        }
        for record in page.objects {
            ctx.objects.fetch_add(1, Ordering::Relaxed);
            ctx.bytes
                .fetch_add(record.size_bytes.max(0) as u64, Ordering::Relaxed);
            ctx.sink.on_object(record);
        }

        token = page.next_token;
        if token.is_none() {
            return Ok(());
        }
    }
}
