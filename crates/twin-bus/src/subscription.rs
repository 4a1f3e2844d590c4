//! # Subscriptions
//!
//! Identifiers and the resolution machinery of one-time subscriptions.
//!
//! ## One-Time Resolution
//!
//! ```text
//!                ┌── matching publish ──→ [RESOLVED]
//! [PENDING] ─────┼── timeout fires ─────→ [TIMED_OUT]
//!                └── unsubscribe/evict ─→ [CANCELLED]
//! ```
//!
//! The transition out of `PENDING` is a compare-and-set: whichever event
//! wins the slot delivers its outcome, every later attempt is a no-op. A
//! losing match gets its message handed back so dispatch can continue.

use crate::error::{BusError, BusResult};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Opaque identifier of a bus subscription, unique for the bus lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of subscription an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    /// One-time waiter for a raw text frame.
    OnceString,
    /// One-time waiter for a parsed adaptable.
    OnceAdaptable,
    /// Durable consumer.
    Persistent,
    /// Durable consumer that cleared the bus when registered.
    Exclusive,
    /// Durable consumer removed after an idle timeout or a terminal message.
    Timed,
}

impl SubscriptionKind {
    #[must_use]
    pub fn is_one_time(self) -> bool {
        matches!(self, SubscriptionKind::OnceString | SubscriptionKind::OnceAdaptable)
    }
}

/// Terminal states of a one-time subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Resolution {
    Pending = 0,
    Resolved = 1,
    TimedOut = 2,
    Cancelled = 3,
}

impl Resolution {
    #[cfg(test)]
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Resolution::Resolved,
            2 => Resolution::TimedOut,
            3 => Resolution::Cancelled,
            _ => Resolution::Pending,
        }
    }
}

/// Tri-state cell deciding the single outcome of a one-time subscription.
pub(crate) struct ResolutionCell<T> {
    state: AtomicU8,
    sender: Mutex<Option<oneshot::Sender<BusResult<T>>>>,
}

impl<T> ResolutionCell<T> {
    pub(crate) fn new(sender: oneshot::Sender<BusResult<T>>) -> Self {
        Self {
            state: AtomicU8::new(Resolution::Pending as u8),
            sender: Mutex::new(Some(sender)),
        }
    }

    /// Complete with a matched value. If another event already settled the
    /// cell, the value is handed back untouched.
    pub(crate) fn resolve(&self, value: T) -> Result<(), T> {
        if !self.claim(Resolution::Resolved) {
            return Err(value);
        }
        self.deliver(Ok(value));
        Ok(())
    }

    /// Fail with `error`, moving into `to`. Returns whether this call won.
    pub(crate) fn fail(&self, to: Resolution, error: BusError) -> bool {
        if !self.claim(to) {
            return false;
        }
        self.deliver(Err(error));
        true
    }

    fn claim(&self, to: Resolution) -> bool {
        self.state
            .compare_exchange(
                Resolution::Pending as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn deliver(&self, outcome: BusResult<T>) {
        if let Some(sender) = self.sender.lock().take() {
            // The caller may have dropped the future; nothing left to tell.
            let _ = sender.send(outcome);
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> Resolution {
        Resolution::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The caller dropped the future without resolving it.
    pub(crate) fn is_abandoned(&self) -> bool {
        self.sender
            .lock()
            .as_ref()
            .map_or(true, oneshot::Sender::is_closed)
    }
}

/// Future of a one-time subscription.
///
/// Resolves with the matched message, or fails with [`BusError::Timeout`],
/// [`BusError::Unsubscribed`], [`BusError::Evicted`],
/// [`BusError::SchedulerShutdown`] or [`BusError::Closed`].
#[must_use = "a one-time subscription does nothing unless awaited"]
#[derive(Debug)]
pub struct OneTimeSubscription<T> {
    id: SubscriptionId,
    receiver: oneshot::Receiver<BusResult<T>>,
}

impl<T> OneTimeSubscription<T> {
    pub(crate) fn new(id: SubscriptionId, receiver: oneshot::Receiver<BusResult<T>>) -> Self {
        Self { id, receiver }
    }

    /// Already failed, never registered.
    pub(crate) fn failed(id: SubscriptionId, error: BusError) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(Err(error));
        Self { id, receiver }
    }

    /// Id to pass to `unsubscribe`.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl<T> Future for OneTimeSubscription<T> {
    type Output = BusResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(BusError::Closed)),
            Poll::Pending => Poll::Pending,
        }
    }
}
