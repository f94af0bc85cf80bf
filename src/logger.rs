//! Logging setup.
//!
//! The crate logs through the `log` facade. [`init`] installs a `fern`
//! dispatcher that feeds an in-memory [`Logger`] (for debug panels in the
//! view layer) and, depending on [`LoggingConfig`], stderr and a log file.

use anyhow::{Context, Result};
use chrono::Local;
use once_cell::sync::OnceCell;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::LoggingConfig;
use crate::constants::{DEFAULT_LOG_CAPACITY, LOG_TIMESTAMP_FORMAT};

static INSTALLED: OnceCell<Logger> = OnceCell::new();

/// Shared in-memory log buffer, bounded to the most recent entries
#[derive(Clone)]
pub struct Logger {
    logs: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Logger {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            logs: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Add a log entry, evicting the oldest one when full
    pub fn log(&self, message: String) {
        let timestamp = Local::now().format(LOG_TIMESTAMP_FORMAT).to_string();
        let formatted_message = format!("[{}] {}", timestamp, message);

        if let Ok(mut logs) = self.logs.lock() {
            if logs.len() == self.capacity {
                logs.pop_front();
            }
            logs.push_back(formatted_message);
        }
    }

    /// Get all logs, newest first
    pub fn get_logs(&self) -> Vec<String> {
        if let Ok(logs) = self.logs.lock() {
            logs.iter().rev().cloned().collect()
        } else {
            Vec::new()
        }
    }

    pub fn len(&self) -> usize {
        self.logs.lock().map(|logs| logs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all logs
    pub fn clear(&self) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.clear();
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the global logger described by `config`.
///
/// Only the first call installs anything; later calls return the buffer that
/// was installed then, whatever `config` they pass.
pub fn init(config: &LoggingConfig) -> Result<Logger> {
    INSTALLED.get_or_try_init(|| install(config)).cloned()
}

/// The buffer installed by [`init`], if any.
pub fn installed() -> Option<Logger> {
    INSTALLED.get().cloned()
}

fn install(config: &LoggingConfig) -> Result<Logger> {
    let level = config.level_filter()?;
    let logger = Logger::with_capacity(config.capacity);

    let sink = logger.clone();
    let memory = fern::Output::call(move |record| {
        sink.log(format!("{} {}: {}", record.level(), record.target(), record.args()));
    });

    let mut outputs = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "[{}] {} {}: {}",
            Local::now().format(LOG_TIMESTAMP_FORMAT),
            record.level(),
            record.target(),
            message
        ))
    });
    if config.enabled {
        outputs = outputs.chain(std::io::stderr());
    }
    if let Some(path) = &config.file {
        let file = fern::log_file(path).with_context(|| format!("Failed to open log file: {}", path.display()))?;
        outputs = outputs.chain(file);
    }

    fern::Dispatch::new()
        .level(level)
        .chain(memory)
        .chain(outputs)
        .apply()
        .context("Failed to install global logger")?;

    Ok(logger)
}
