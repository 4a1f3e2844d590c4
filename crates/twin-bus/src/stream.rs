//! # Adaptable Stream
//!
//! Durable subscription exposed as a `tokio_stream::Stream`. The stream
//! ends when the subscription is removed from the bus; dropping the stream
//! removes the subscription on the next matching publish.

use crate::subscription::SubscriptionId;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use twin_types::Adaptable;

/// Stream of adaptables delivered to one durable subscription.
#[derive(Debug)]
pub struct AdaptableStream {
    id: SubscriptionId,
    inner: UnboundedReceiverStream<Adaptable>,
}

impl AdaptableStream {
    pub(crate) fn new(id: SubscriptionId, receiver: mpsc::UnboundedReceiver<Adaptable>) -> Self {
        Self {
            id,
            inner: UnboundedReceiverStream::new(receiver),
        }
    }

    /// Id to pass to `unsubscribe`.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Stream for AdaptableStream {
    type Item = Adaptable;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
