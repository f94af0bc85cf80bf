//! Loading-state tracker.
//!
//! The tracker owns one default busy flag and a lazily populated map of
//! tagged flags. Tagged flags are created on first access (read or write) and
//! stay in the map until the tracker is disposed, so memory grows with the
//! number of distinct tags ever used.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use tokio::sync::watch;

use super::flag::{BusyFlag, BusyGuard};
use super::scope::LoadingScope;
use crate::config::OverlapPolicy;
use crate::constants::LOG_TAG_CREATED;
use crate::observable::Subscription;

pub(crate) struct TrackerState {
    default: Arc<BusyFlag>,
    tagged: Mutex<HashMap<String, Arc<BusyFlag>>>,
    policy: OverlapPolicy,
}

impl TrackerState {
    fn tags(&self) -> MutexGuard<'_, HashMap<String, Arc<BusyFlag>>> {
        self.tagged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get-or-insert the flag for `tag`.
    fn tagged(&self, tag: &str) -> Arc<BusyFlag> {
        let mut tags = self.tags();
        if let Some(flag) = tags.get(tag) {
            return Arc::clone(flag);
        }
        debug!("{} '{}'", LOG_TAG_CREATED, tag);
        let flag = Arc::new(BusyFlag::new());
        tags.insert(tag.to_string(), Arc::clone(&flag));
        flag
    }

    fn flag(&self, scope: &LoadingScope) -> Arc<BusyFlag> {
        match scope {
            LoadingScope::Default => Arc::clone(&self.default),
            LoadingScope::Tag(tag) => self.tagged(tag),
        }
    }

    fn is_loading_in(&self, scope: &LoadingScope) -> bool {
        self.flag(scope).get()
    }

    fn subscribe<F>(&self, scope: &LoadingScope, callback: F) -> Subscription<bool>
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.flag(scope).listen(move |busy| callback(*busy))
    }

    fn watch(&self, scope: &LoadingScope) -> watch::Receiver<bool> {
        self.flag(scope).cell().watch()
    }
}

/// Busy/idle state for a controller, optionally partitioned by tag.
#[derive(Clone)]
pub struct LoadTracker {
    state: Arc<TrackerState>,
}

impl LoadTracker {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            state: Arc::new(TrackerState {
                default: Arc::new(BusyFlag::new()),
                tagged: Mutex::new(HashMap::new()),
                policy,
            }),
        }
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.state.policy
    }

    /// Value of the default flag.
    pub fn is_loading(&self) -> bool {
        self.state.default.get()
    }

    /// Write the default flag.
    ///
    /// Meant for the owning controller only; views should go through
    /// [`LoadingView`], which has no setters.
    pub fn set_is_loading(&self, value: bool) {
        self.state.default.set(value);
    }

    /// Value of the flag for `tag`, creating it (idle) if it doesn't exist yet.
    pub fn is_loading_by_tag(&self, tag: &str) -> bool {
        self.state.tagged(tag).get()
    }

    pub fn set_is_loading_by_tag(&self, tag: &str, value: bool) {
        self.state.tagged(tag).set(value);
    }

    pub fn is_loading_in(&self, scope: &LoadingScope) -> bool {
        self.state.is_loading_in(scope)
    }

    /// Run `operation` with the default flag raised.
    ///
    /// The flag is reset before this returns, on every path. Whatever the
    /// operation produces, including an `Err`, is handed back untouched.
    pub async fn wait<F, Fut>(&self, operation: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        self.wait_in(LoadingScope::Default, operation).await
    }

    /// Like [`wait`](Self::wait), but raises the flag for `tag`.
    pub async fn wait_tagged<F, Fut>(&self, tag: &str, operation: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        self.wait_in(LoadingScope::tag(tag), operation).await
    }

    /// Like [`wait`](Self::wait), for any scope. `None` means the default flag.
    pub async fn wait_in<S, F, Fut>(&self, scope: S, operation: F) -> Fut::Output
    where
        S: Into<LoadingScope>,
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let _guard = self.enter(&scope.into());
        operation().await
    }

    /// Raise the flag for `scope` until the returned guard is dropped.
    pub fn enter(&self, scope: &LoadingScope) -> BusyGuard {
        self.state.flag(scope).enter(self.state.policy)
    }

    /// Number of tracked operations currently running in `scope`.
    pub fn in_flight(&self, scope: &LoadingScope) -> usize {
        self.state.flag(scope).in_flight()
    }

    /// Register a callback for every busy/idle transition in `scope`.
    pub fn subscribe<F>(&self, scope: &LoadingScope, callback: F) -> Subscription<bool>
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.state.subscribe(scope, callback)
    }

    pub fn watch(&self, scope: &LoadingScope) -> watch::Receiver<bool> {
        self.state.watch(scope)
    }

    /// Tags that have a flag, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.state.tags().keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Read-only handle for view code.
    pub fn view(&self) -> LoadingView {
        LoadingView {
            state: Arc::clone(&self.state),
        }
    }

    /// Release every listener on the default and tagged flags, then forget
    /// the tagged flags.
    pub fn dispose(&self) {
        self.state.default.dispose();
        let drained: Vec<Arc<BusyFlag>> = self.state.tags().drain().map(|(_, flag)| flag).collect();
        for flag in drained {
            flag.dispose();
        }
    }
}

impl Default for LoadTracker {
    fn default() -> Self {
        Self::new(OverlapPolicy::default())
    }
}

impl std::fmt::Debug for LoadTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadTracker")
            .field("is_loading", &self.is_loading())
            .field("tags", &self.tags())
            .field("policy", &self.state.policy)
            .finish()
    }
}

/// Read-only view of a [`LoadTracker`], handed to view-layer code.
#[derive(Clone)]
pub struct LoadingView {
    state: Arc<TrackerState>,
}

impl LoadingView {
    pub fn is_loading(&self) -> bool {
        self.state.default.get()
    }

    pub fn is_loading_by_tag(&self, tag: &str) -> bool {
        self.state.tagged(tag).get()
    }

    pub fn is_loading_in(&self, scope: &LoadingScope) -> bool {
        self.state.is_loading_in(scope)
    }

    pub fn subscribe<F>(&self, scope: &LoadingScope, callback: F) -> Subscription<bool>
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.state.subscribe(scope, callback)
    }

    pub fn watch(&self, scope: &LoadingScope) -> watch::Receiver<bool> {
        self.state.watch(scope)
    }

    /// Resolve once `scope` is idle. Returns immediately if it already is.
    ///
    /// Also returns if the tracker is disposed in the meantime.
    pub async fn idle(&self, scope: &LoadingScope) {
        let mut receiver = self.watch(scope);
        let _ = receiver.wait_for(|busy| !*busy).await;
    }
}

impl std::fmt::Debug for LoadingView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingView")
            .field("is_loading", &self.is_loading())
            .finish()
    }
}
