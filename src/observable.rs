//! Observable value cells.
//!
//! An [`Observable`] is a shared value holder that notifies listeners when the
//! value changes. Two observation styles are offered:
//!
//! * push: [`Observable::listen`] registers a callback that runs on every
//!   transition, synchronously, in commit order
//! * pull: [`Observable::watch`] hands out a [`tokio::sync::watch::Receiver`]
//!   for async consumers; intermediate values may be coalesced
//!
//! Writing the value it already holds is not a transition and notifies nobody.
//!
//! Committed transitions go through a per-cell queue drained by one writer at
//! a time. A writer that finds another delivery in progress (on another
//! thread, or a listener writing back into the cell) leaves its transition to
//! that drainer, so every listener sees transitions in the order they were
//! committed and the last value it sees is the cell's value.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::error;
use tokio::sync::watch;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Shared<T> {
    value: T,
    listeners: Vec<(u64, Listener<T>)>,
    next_listener_id: u64,
    sender: Option<watch::Sender<T>>,
    pending: VecDeque<T>,
    draining: bool,
}

struct Cell<T> {
    shared: Mutex<Shared<T>>,
}

impl<T> Cell<T> {
    fn lock(&self) -> MutexGuard<'_, Shared<T>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver queued transitions unless another caller already is.
    ///
    /// Listener panics are caught and logged so one broken listener can't
    /// stall delivery or unwind through the writer.
    fn deliver(&self) {
        {
            let mut shared = self.lock();
            if shared.draining {
                return;
            }
            shared.draining = true;
        }
        loop {
            let (value, listeners) = {
                let mut shared = self.lock();
                match shared.pending.pop_front() {
                    Some(value) => {
                        let listeners: Vec<Listener<T>> = shared.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
                        (value, listeners)
                    }
                    None => {
                        shared.draining = false;
                        return;
                    }
                }
            };
            for listener in listeners {
                if catch_unwind(AssertUnwindSafe(|| listener(&value))).is_err() {
                    error!("Observable listener panicked");
                }
            }
        }
    }
}

/// A value change that has been committed but not yet delivered to listeners.
///
/// Produced while the caller may still hold its own locks; [`Transition::notify`]
/// must be called once those are released.
#[must_use]
pub(crate) struct Transition<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Transition<T> {
    pub(crate) fn notify(self) {
        self.cell.deliver();
    }
}

/// Shared, observable value cell.
///
/// Cloning yields another handle to the same cell.
pub struct Observable<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> Observable<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(value: T) -> Self {
        let (sender, _) = watch::channel(value.clone());
        Self {
            cell: Arc::new(Cell {
                shared: Mutex::new(Shared {
                    value,
                    listeners: Vec::new(),
                    next_listener_id: 1,
                    sender: Some(sender),
                    pending: VecDeque::new(),
                    draining: false,
                }),
            }),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.cell.lock().value.clone()
    }

    /// Replace the value, notifying listeners if it changed.
    ///
    /// Returns `true` when a transition happened.
    pub fn set(&self, value: T) -> bool {
        match self.stage(value) {
            Some(transition) => {
                transition.notify();
                true
            }
            None => false,
        }
    }

    /// Replace the value with `f(current)`, notifying listeners if it changed.
    ///
    /// `f` runs with the cell locked and must not touch this cell.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        match self.stage_with(f) {
            Some(transition) => {
                transition.notify();
                true
            }
            None => false,
        }
    }

    /// Commit `value` without running listeners yet.
    ///
    /// Watch receivers see the new value immediately; push listeners run when
    /// the returned [`Transition`] is notified.
    pub(crate) fn stage(&self, value: T) -> Option<Transition<T>> {
        self.stage_with(|_| value)
    }

    fn stage_with<F>(&self, f: F) -> Option<Transition<T>>
    where
        F: FnOnce(&T) -> T,
    {
        let mut shared = self.cell.lock();
        let value = f(&shared.value);
        if shared.value == value {
            return None;
        }
        shared.value = value.clone();
        if let Some(sender) = &shared.sender {
            sender.send_replace(value.clone());
        }
        if shared.sender.is_some() && !shared.listeners.is_empty() {
            shared.pending.push_back(value);
        }
        Some(Transition {
            cell: Arc::clone(&self.cell),
        })
    }

    /// Register a callback run with the new value on every transition.
    ///
    /// The listener stays registered until [`Subscription::cancel`] is called
    /// or the cell is disposed. Dropping the subscription does not cancel it.
    pub fn listen<F>(&self, callback: F) -> Subscription<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut shared = self.cell.lock();
        let id = shared.next_listener_id;
        shared.next_listener_id += 1;
        if shared.sender.is_some() {
            shared.listeners.push((id, Arc::new(callback)));
        }
        Subscription {
            id,
            cell: Arc::downgrade(&self.cell),
        }
    }

    /// Receiver for async observation of the value.
    ///
    /// After [`dispose`](Self::dispose) the returned receiver is already closed.
    pub fn watch(&self) -> watch::Receiver<T> {
        let shared = self.cell.lock();
        match &shared.sender {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = watch::channel(shared.value.clone());
                drop(sender);
                receiver
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.cell.lock().listeners.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.cell.lock().sender.is_none()
    }

    /// Drop every listener and close the watch channel.
    pub fn dispose(&self) {
        let mut shared = self.cell.lock();
        shared.listeners.clear();
        shared.pending.clear();
        shared.sender = None;
    }
}

impl<T> Default for Observable<T>
where
    T: Clone + PartialEq + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> std::fmt::Debug for Observable<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.cell.lock();
        f.debug_struct("Observable")
            .field("value", &shared.value)
            .field("listeners", &shared.listeners.len())
            .finish()
    }
}

/// Handle to a listener registered with [`Observable::listen`].
pub struct Subscription<T> {
    id: u64,
    cell: Weak<Cell<T>>,
}

impl<T> Subscription<T> {
    /// Remove the listener. A no-op if the cell is gone or disposed.
    pub fn cancel(self) {
        if let Some(cell) = self.cell.upgrade() {
            cell.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.cell
            .upgrade()
            .map(|cell| cell.lock().listeners.iter().any(|(id, _)| *id == self.id))
            .unwrap_or(false)
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
