//! A [`Stream`](futures::Stream) over values produced by a background task.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use tokio::sync::mpsc;

/// Receiving half of a feed driven by a spawned task.
///
/// The stream ends once the producing task exits. Dropping the subscription makes the producer's
/// next send fail, which producers treat as a signal to stop.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Wraps the receiving end of an unbounded channel.
    pub const fn from_receiver(receiver: mpsc::UnboundedReceiver<T>) -> Self {
        Self { receiver }
    }
}

impl<T> futures::Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}
