//! Type-keyed error handler registry.
//!
//! Handlers are keyed by the [`TypeId`] of the error type they accept. Lookup
//! is exact: a handler for `A` is never invoked for a `B`, however the two are
//! related, and there is no fallback handler.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, error, trace, warn};

use super::handler::{ErrorHandler, SyncHandler};
use crate::config::ErrorsConfig;
use crate::constants::{LOG_HANDLER_FAILED, LOG_HANDLER_PANICKED, LOG_HANDLER_REPLACED, LOG_UNHANDLED_ERROR};
use crate::error::HandlerError;

type ErasedHandler = Arc<dyn Fn(Box<dyn Any + Send>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    kind: &'static str,
    handler: ErasedHandler,
}

/// Result of dispatching an error.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The registered handler ran to completion.
    Handled,
    /// Nothing was registered for the error's exact type; the error was dropped.
    Unhandled,
    /// The registered handler returned an error or panicked. Already logged.
    Failed(HandlerError),
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled)
    }

    pub fn is_unhandled(&self) -> bool {
        matches!(self, DispatchOutcome::Unhandled)
    }
}

/// Routes errors to the handler registered for their exact type.
pub struct ErrorDispatcher {
    handlers: RwLock<HashMap<TypeId, Entry>>,
    config: ErrorsConfig,
}

impl ErrorDispatcher {
    pub fn new(config: ErrorsConfig) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register `handler` for errors of type `E`, replacing any previous one.
    pub fn set_error_handler<E, H>(&self, handler: H)
    where
        E: Any + Send + 'static,
        H: ErrorHandler<E> + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |error: Box<dyn Any + Send>| {
            let handler = Arc::clone(&handler);
            async move {
                match error.downcast::<E>() {
                    Ok(error) => handler.handle(*error).await,
                    // Keyed by TypeId::of::<E>, so the downcast cannot miss
                    Err(_) => Ok(()),
                }
            }
            .boxed()
        });

        let entry = Entry {
            kind: type_name::<E>(),
            handler: erased,
        };
        let replaced = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<E>(), entry);
        if replaced.is_some() {
            debug!("{} {}", LOG_HANDLER_REPLACED, type_name::<E>());
        }
    }

    /// Register a synchronous handler for errors of type `E`.
    pub fn set_sync_error_handler<E, F>(&self, handler: F)
    where
        E: Any + Send + 'static,
        F: Fn(E) + Send + Sync + 'static,
    {
        self.set_error_handler::<E, _>(SyncHandler(handler));
    }

    /// Unregister the handler for `E`. Returns whether one was registered.
    pub fn remove_error_handler<E: Any>(&self) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&TypeId::of::<E>())
            .is_some()
    }

    pub fn has_error_handler<E: Any>(&self) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<E>())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop every registered handler.
    pub fn clear(&self) {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Dispatch `error` to the handler registered for exactly `E`.
    ///
    /// Never fails: unregistered types are ignored and handler failures are
    /// logged and reported in the returned outcome.
    ///
    /// The key is the static type `E`. Passing an already type-erased
    /// `Box<dyn Any + Send>` looks up a handler for the box itself, which is
    /// never what was registered; use
    /// [`handle_boxed_error`](Self::handle_boxed_error) for those.
    pub async fn handle_error<E>(&self, error: E) -> DispatchOutcome
    where
        E: Any + Send + 'static,
    {
        self.dispatch(TypeId::of::<E>(), type_name::<E>(), Box::new(error)).await
    }

    /// Dispatch a type-erased error by the dynamic type of the boxed value.
    pub async fn handle_boxed_error(&self, error: Box<dyn Any + Send>) -> DispatchOutcome {
        let type_id = (*error).type_id();
        self.dispatch(type_id, "<boxed>", error).await
    }

    async fn dispatch(&self, type_id: TypeId, name: &'static str, error: Box<dyn Any + Send>) -> DispatchOutcome {
        let entry = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned();

        let Some(entry) = entry else {
            if self.config.trace_unhandled {
                trace!("{} {}", LOG_UNHANDLED_ERROR, name);
            }
            return DispatchOutcome::Unhandled;
        };

        let call = (entry.handler)(error);
        let result = if self.config.catch_panics {
            match AssertUnwindSafe(call).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!("{} {}: {}", LOG_HANDLER_PANICKED, entry.kind, message);
                    return DispatchOutcome::Failed(HandlerError::Panicked {
                        kind: entry.kind,
                        message,
                    });
                }
            }
        } else {
            call.await
        };

        match result {
            Ok(()) => DispatchOutcome::Handled,
            Err(source) => {
                warn!("{} {}: {:#}", LOG_HANDLER_FAILED, entry.kind, source);
                DispatchOutcome::Failed(HandlerError::Failed {
                    kind: entry.kind,
                    source,
                })
            }
        }
    }
}

impl Default for ErrorDispatcher {
    fn default() -> Self {
        Self::new(ErrorsConfig::default())
    }
}

impl std::fmt::Debug for ErrorDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let mut kinds: Vec<&str> = handlers.values().map(|entry| entry.kind).collect();
        kinds.sort_unstable();
        f.debug_struct("ErrorDispatcher").field("handlers", &kinds).finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
