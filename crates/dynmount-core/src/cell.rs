//! Single-slot broadcast cell.
//!
//! A [`MountCell`] holds one optional value. Every update is pushed to all
//! live subscribers at the moment it happens, and a new subscriber is
//! handed the current value (present or absent) before anything else.
//!
//! Subscribers are unbounded channels, so a slow consumer never misses an
//! intermediate value. A subscription is released by dropping it or by
//! calling [`CellSubscription::unsubscribe`]; released subscribers are
//! pruned on the next update.

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

struct CellState<T> {
    value: Option<T>,
    subscribers: Vec<mpsc::UnboundedSender<Option<T>>>,
}

/// Shared single-slot broadcast holder. Clones refer to the same slot.
pub struct MountCell<T> {
    state: Arc<Mutex<CellState<T>>>,
}

impl<T> Clone for MountCell<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Clone> Default for MountCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> MountCell<T> {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CellState {
                value: None,
                subscribers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CellState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> Option<T> {
        self.lock().value.clone()
    }

    /// True if the cell currently holds a value.
    pub fn is_set(&self) -> bool {
        self.lock().value.is_some()
    }

    /// Replace the value and broadcast it. Returns the previous value.
    pub fn set(&self, value: Option<T>) -> Option<T> {
        let mut state = self.lock();
        state
            .subscribers
            .retain(|tx| tx.send(value.clone()).is_ok());
        std::mem::replace(&mut state.value, value)
    }

    /// Attach a new subscriber. The current value is delivered first.
    pub fn subscribe(&self) -> CellSubscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        // Cannot fail: the receiver is still in our hands.
        let _ = tx.send(state.value.clone());
        state.subscribers.retain(|s| !s.is_closed());
        state.subscribers.push(tx);
        CellSubscription { rx }
    }

    /// Number of subscribers that have not been released.
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|s| !s.is_closed());
        state.subscribers.len()
    }

    /// Detach every subscriber. Their streams end once drained.
    ///
    /// The stored value is left untouched.
    pub fn close(&self) {
        self.lock().subscribers.clear();
    }

    /// True if both cells share the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for MountCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MountCell")
            .field("value", &state.value)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

/// Live view on a [`MountCell`]: yields every value the cell takes,
/// starting with the value it held at subscription time.
#[derive(Debug)]
pub struct CellSubscription<T> {
    rx: mpsc::UnboundedReceiver<Option<T>>,
}

impl<T> CellSubscription<T> {
    /// Wait for the next value. `None` means the cell let go of this
    /// subscriber.
    pub async fn next_value(&mut self) -> Option<Option<T>> {
        self.rx.recv().await
    }

    /// Release the subscription explicitly.
    pub fn unsubscribe(mut self) {
        self.rx.close();
    }
}

impl<T> Stream for CellSubscription<T> {
    type Item = Option<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
