//! Error dispatch.
//!
//! Controllers catch errors and pass them to [`ErrorDispatcher::handle_error`];
//! the view layer registers what to do for each error type ahead of time.

mod handler;
mod registry;

pub use handler::ErrorHandler;
pub use registry::{DispatchOutcome, ErrorDispatcher};
