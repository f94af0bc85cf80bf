use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use tokio::sync::watch;

use crate::config::Config;
use crate::constants::LOG_CONTROLLER_DISPOSED;
use crate::dispatch::{DispatchOutcome, ErrorDispatcher, ErrorHandler};
use crate::loading::{BusyGuard, LoadTracker, LoadingScope, LoadingView};
use crate::observable::Subscription;

/// State shared by every controller: a [`LoadTracker`] and an
/// [`ErrorDispatcher`], both owned exclusively by this value.
///
/// Setters and [`handle_error`](Self::handle_error) are meant to be called
/// from the controller's own logic. View code should hold a
/// [`LoadingView`] and register handlers, nothing more.
pub struct ControllerBase {
    loading: LoadTracker,
    errors: ErrorDispatcher,
    disposed: AtomicBool,
}

impl ControllerBase {
    pub fn new(config: &Config) -> Self {
        Self {
            loading: LoadTracker::new(config.loading.overlap),
            errors: ErrorDispatcher::new(config.errors.clone()),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn loading(&self) -> &LoadTracker {
        &self.loading
    }

    pub fn errors(&self) -> &ErrorDispatcher {
        &self.errors
    }

    pub fn loading_view(&self) -> LoadingView {
        self.loading.view()
    }

    // ---- Loading ----

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn set_is_loading(&self, value: bool) {
        self.loading.set_is_loading(value);
    }

    pub fn is_loading_by_tag(&self, tag: &str) -> bool {
        self.loading.is_loading_by_tag(tag)
    }

    pub fn set_is_loading_by_tag(&self, tag: &str, value: bool) {
        self.loading.set_is_loading_by_tag(tag, value);
    }

    /// See [`LoadTracker::wait`].
    pub async fn wait<F, Fut>(&self, operation: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        self.loading.wait(operation).await
    }

    /// See [`LoadTracker::wait_tagged`].
    pub async fn wait_tagged<F, Fut>(&self, tag: &str, operation: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        self.loading.wait_tagged(tag, operation).await
    }

    /// See [`LoadTracker::wait_in`].
    pub async fn wait_in<S, F, Fut>(&self, scope: S, operation: F) -> Fut::Output
    where
        S: Into<LoadingScope>,
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        self.loading.wait_in(scope, operation).await
    }

    pub fn enter(&self, scope: &LoadingScope) -> BusyGuard {
        self.loading.enter(scope)
    }

    pub fn subscribe<F>(&self, scope: &LoadingScope, callback: F) -> Subscription<bool>
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.loading.subscribe(scope, callback)
    }

    pub fn watch(&self, scope: &LoadingScope) -> watch::Receiver<bool> {
        self.loading.watch(scope)
    }

    // ---- Errors ----

    pub fn set_error_handler<E, H>(&self, handler: H)
    where
        E: Any + Send + 'static,
        H: ErrorHandler<E> + 'static,
    {
        self.errors.set_error_handler::<E, H>(handler);
    }

    pub fn set_sync_error_handler<E, F>(&self, handler: F)
    where
        E: Any + Send + 'static,
        F: Fn(E) + Send + Sync + 'static,
    {
        self.errors.set_sync_error_handler::<E, F>(handler);
    }

    /// See [`ErrorDispatcher::handle_error`].
    pub async fn handle_error<E>(&self, error: E) -> DispatchOutcome
    where
        E: Any + Send + 'static,
    {
        self.errors.handle_error(error).await
    }

    // ---- Lifecycle ----

    /// Whether a dismiss/back action may proceed: only the default flag counts.
    pub fn allow_dismiss(&self) -> bool {
        !self.is_loading()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Release every flag listener, the tag map and the handler registry.
    ///
    /// Returns `false` if the controller was already disposed, in which case
    /// nothing happens.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            debug!("{} already, ignoring", LOG_CONTROLLER_DISPOSED);
            return false;
        }
        self.loading.dispose();
        self.errors.clear();
        debug!("{}", LOG_CONTROLLER_DISPOSED);
        true
    }
}

impl Default for ControllerBase {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl std::fmt::Debug for ControllerBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerBase")
            .field("loading", &self.loading)
            .field("errors", &self.errors)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
