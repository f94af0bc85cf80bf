//! Busy flags and the guard that resets them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::OverlapPolicy;
use crate::observable::{Observable, Subscription};

/// Observable busy/idle cell plus the number of tracked operations running
/// against it.
pub(crate) struct BusyFlag {
    cell: Observable<bool>,
    in_flight: Mutex<usize>,
}

impl BusyFlag {
    pub(crate) fn new() -> Self {
        Self {
            cell: Observable::new(false),
            in_flight: Mutex::new(0),
        }
    }

    pub(crate) fn get(&self) -> bool {
        self.cell.get()
    }

    /// Direct write. Leaves the in-flight count alone.
    pub(crate) fn set(&self, value: bool) {
        self.cell.set(value);
    }

    pub(crate) fn in_flight(&self) -> usize {
        *self.count()
    }

    pub(crate) fn cell(&self) -> &Observable<bool> {
        &self.cell
    }

    pub(crate) fn listen<F>(&self, callback: F) -> Subscription<bool>
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.cell.listen(callback)
    }

    /// Mark one more operation as running. The flag stays busy at least until
    /// the returned guard is dropped.
    pub(crate) fn enter(self: &Arc<Self>, policy: OverlapPolicy) -> BusyGuard {
        let transition = {
            let mut count = self.count();
            *count += 1;
            self.cell.stage(true)
        };
        // The count is already raised; the guard must own it before any
        // listener runs.
        let guard = BusyGuard {
            flag: Arc::clone(self),
            policy,
        };
        if let Some(transition) = transition {
            transition.notify();
        }
        guard
    }

    fn leave(&self, policy: OverlapPolicy) {
        let transition = {
            let mut count = self.count();
            *count = count.saturating_sub(1);
            match policy {
                OverlapPolicy::RefCounted if *count > 0 => None,
                _ => self.cell.stage(false),
            }
        };
        if let Some(transition) = transition {
            transition.notify();
        }
    }

    pub(crate) fn dispose(&self) {
        self.cell.dispose();
    }

    fn count(&self) -> MutexGuard<'_, usize> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps a busy flag raised while alive.
///
/// Dropping the guard resets the flag whether the tracked operation finished,
/// failed, panicked or was cancelled.
#[must_use = "the flag is reset as soon as the guard is dropped"]
pub struct BusyGuard {
    flag: Arc<BusyFlag>,
    policy: OverlapPolicy,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.leave(self.policy);
    }
}

impl std::fmt::Debug for BusyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusyGuard").field("policy", &self.policy).finish()
    }
}
