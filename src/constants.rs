//! Constants used throughout the crate
//!
//! Config file names, logging defaults and log message prefixes live here so
//! the rest of the crate doesn't carry magic strings.

// Config discovery
pub const CONFIG_FILE_NAME: &str = "controlkit.toml";
pub const CONFIG_DIR_NAME: &str = "controlkit";
pub const CONFIG_DIR_FILE_NAME: &str = "config.toml";
pub const CONFIG_GENERATED: &str = "Generated default controlkit configuration";

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_CAPACITY: usize = 500;
pub const LOG_TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

// Log message prefixes
pub const LOG_TAG_CREATED: &str = "Created busy flag for tag";
pub const LOG_HANDLER_REPLACED: &str = "Replaced error handler for";
pub const LOG_HANDLER_FAILED: &str = "Error handler failed for";
pub const LOG_HANDLER_PANICKED: &str = "Error handler panicked for";
pub const LOG_UNHANDLED_ERROR: &str = "No error handler registered for";
pub const LOG_CONTROLLER_DISPOSED: &str = "Controller disposed";
pub const LOG_DISMISS_BLOCKED: &str = "Dismiss blocked while controller is busy";
