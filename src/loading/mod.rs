//! Busy/idle tracking for long-running operations.
//!
//! - [`LoadTracker`] - default and tagged busy flags plus the `wait` bracket
//! - [`LoadingView`] - read-only handle for view code
//! - [`LoadingScope`] - addresses the default flag or a tagged one
//! - [`BusyGuard`] - RAII guard that keeps a flag raised

mod flag;
mod scope;
mod tracker;

pub use flag::BusyGuard;
pub use scope::LoadingScope;
pub use tracker::{LoadTracker, LoadingView};
