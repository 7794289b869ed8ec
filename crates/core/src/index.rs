use crate::config::{Provider, Toolchain};
use crate::error::Result;
use crate::process::{self, CommandOutput, Invocation};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;
use tokio::sync::Mutex;

/// Marker file the external tool writes at the root of its database.
const MARKER_FILE: &str = "GTAGS";

/// Substring `global -u` prints on stderr when the database is damaged.
const CORRUPTION_MARKER: &str = "seems corrupted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Absent,
    Ready,
    Stale,
    /// Build failed; the session keeps serving empty results.
    Fatal,
}

/// Lifecycle notifications. Each one is awaited before the lifecycle
/// proceeds, so a corruption warning reaches the user before the
/// rebuild command is spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEvent {
    Corrupted,
    BuildStarted,
    BuildFinished,
    BuildFailed(String),
}

/// Owns the on-disk tag database for one project root: decides at
/// session start whether it must be (re)built, and serializes the three
/// mutating operations (full build, integrity check, single-file
/// update) behind one lock. Queries go through [`run_global`] without
/// taking the lock; the database is read-only for them.
///
/// [`run_global`]: IndexManager::run_global
pub struct IndexManager {
    root: PathBuf,
    cache_dir: PathBuf,
    provider: Provider,
    toolchain: Toolchain,
    timeout: Duration,
    state: RwLock<IndexState>,
    mutation: Mutex<()>,
}

impl IndexManager {
    pub fn new(
        root: PathBuf,
        cache_dir: PathBuf,
        provider: Provider,
        toolchain: Toolchain,
        timeout: Duration,
    ) -> Self {
        Self {
            root,
            cache_dir,
            provider,
            toolchain,
            timeout,
            state: RwLock::new(IndexState::Absent),
            mutation: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn state(&self) -> IndexState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: IndexState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Drives the session-start state machine once: check the marker,
    /// verify integrity, rebuild when absent or corrupted. Returns the
    /// terminal state (`Ready`, or `Fatal` when the build failed).
    pub async fn initialize<F, Fut>(&self, notify: F) -> IndexState
    where
        F: Fn(IndexEvent) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let _guard = self.mutation.lock().await;

        if self.provider != Provider::Tagscope {
            // The LeaderF layout is maintained by the plugin that owns
            // it; reuse whatever is there.
            self.set_state(IndexState::Ready);
            return IndexState::Ready;
        }

        let mut need_build = false;
        if self.cache_dir.join(MARKER_FILE).exists() {
            match self.run_global(&["-u"], false).await {
                Ok(output) => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    if stderr.contains(CORRUPTION_MARKER) {
                        tracing::warn!(cache_dir = %self.cache_dir.display(), "tag database corrupted, rebuilding");
                        self.set_state(IndexState::Stale);
                        notify(IndexEvent::Corrupted).await;
                        need_build = true;
                    }
                }
                Err(e) => {
                    // The check is best-effort; an unrunnable tool will
                    // surface again on the first query.
                    tracing::warn!(error = %e, "integrity check did not run");
                }
            }
        } else {
            self.set_state(IndexState::Absent);
            need_build = true;
        }

        if need_build {
            notify(IndexEvent::BuildStarted).await;
            match self.build().await {
                Ok(_) => {
                    self.set_state(IndexState::Ready);
                    notify(IndexEvent::BuildFinished).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "index build failed, serving degraded results");
                    self.set_state(IndexState::Fatal);
                    notify(IndexEvent::BuildFailed(e.to_string())).await;
                    return IndexState::Fatal;
                }
            }
        } else {
            self.set_state(IndexState::Ready);
        }
        IndexState::Ready
    }

    /// Incremental reindex of exactly one file, fired on save. Failure
    /// is reported to the caller but never invalidates `Ready`.
    pub async fn update_file(&self, file: &Path) -> Result<()> {
        if self.provider != Provider::Tagscope || self.state() != IndexState::Ready {
            return Ok(());
        }
        let _guard = self.mutation.lock().await;
        let file = file.to_string_lossy();
        self.run_global(&["--single-update", file.as_ref()], true)
            .await
            .map(|_| ())
    }

    /// Full build: `gtags <cache_dir>` run in the project root. Caller
    /// must hold the mutation lock.
    async fn build(&self) -> Result<CommandOutput> {
        let invocation = Invocation {
            program: self.toolchain.gtags.clone(),
            args: vec![self.cache_dir.to_string_lossy().into_owned()],
            cwd: self.root.clone(),
            env: Vec::new(),
            must_succeed: true,
        };
        process::run(&invocation, self.timeout).await
    }

    /// Runs the query tool with the database environment bound to this
    /// project: cwd = project root, GTAGSROOT/GTAGSDBPATH pointing the
    /// tool at the root and the cache directory.
    pub async fn run_global(&self, args: &[&str], must_succeed: bool) -> Result<CommandOutput> {
        let invocation = Invocation {
            program: self.toolchain.global.clone(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: self.root.clone(),
            env: vec![
                (
                    "GTAGSROOT".to_string(),
                    self.root.to_string_lossy().into_owned(),
                ),
                (
                    "GTAGSDBPATH".to_string(),
                    self.cache_dir.to_string_lossy().into_owned(),
                ),
            ],
            must_succeed,
        };
        process::run(&invocation, self.timeout).await
    }
}
