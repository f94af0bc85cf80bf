//! controlkit - loading state and error dispatch for application controllers
//!
//! A controller is the unit of application logic behind a view. This crate
//! gives every controller two things:
//!
//! * busy/idle tracking for long-running operations, with a default flag and
//!   any number of independently tagged ones, and a `wait` bracket that
//!   raises a flag for the duration of an operation and always lowers it
//! * a type-keyed table of error handlers, so the view layer decides how each
//!   kind of error is presented and the controller only has to dispatch
//!
//! # Modules
//!
//! * [`observable`] - observable value cells (push listeners and watch channels)
//! * [`loading`] - busy flags, [`LoadTracker`] and the read-only [`LoadingView`]
//! * [`dispatch`] - [`ErrorDispatcher`] and the [`ErrorHandler`] trait
//! * [`controller`] - [`ControllerBase`], the [`Controller`] trait and the dismiss guard
//! * [`config`] - configuration file loading
//! * [`logger`] - `fern`-based logging setup with an in-memory buffer
//!
//! # Example
//!
//! ```
//! use controlkit::{Controller, ControllerBase};
//!
//! #[derive(Debug)]
//! struct QuotaExceeded(u64);
//!
//! struct UploadController {
//!     base: ControllerBase,
//! }
//!
//! impl Controller for UploadController {
//!     fn base(&self) -> &ControllerBase {
//!         &self.base
//!     }
//! }
//!
//! impl UploadController {
//!     async fn upload(&self) {
//!         let result = self
//!             .base
//!             .wait_tagged("upload", || async { Err::<(), _>(QuotaExceeded(10)) })
//!             .await;
//!         if let Err(err) = result {
//!             self.base.handle_error(err).await;
//!         }
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let controller = UploadController { base: ControllerBase::default() };
//! controller.base().set_sync_error_handler(|err: QuotaExceeded| {
//!     eprintln!("quota exceeded by {} bytes", err.0);
//! });
//! controller.upload().await;
//! assert!(!controller.base().is_loading_by_tag("upload"));
//! # }
//! ```

/// Configuration loading and validation
pub mod config;

/// Constant values shared across modules
pub mod constants;

/// Controller composition, lifecycle and dismiss guard
pub mod controller;

/// Type-keyed error handler registry
pub mod dispatch;

/// Crate error types
pub mod error;

/// Busy/idle tracking
pub mod loading;

/// Logging setup and in-memory log buffer
pub mod logger;

/// Observable value cells
pub mod observable;

pub use config::{Config, OverlapPolicy};
pub use controller::{will_pop, Controller, ControllerBase};
pub use dispatch::{DispatchOutcome, ErrorDispatcher, ErrorHandler};
pub use error::HandlerError;
pub use loading::{BusyGuard, LoadTracker, LoadingScope, LoadingView};
pub use observable::{Observable, Subscription};
