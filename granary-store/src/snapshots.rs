// SPDX-License-Identifier: MIT OR Apache-2.0

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Handle on a live query: the store pushes a fresh result on every relevant
/// mutation.
///
/// Subscription lifecycle is explicit through ownership: dropping the handle
/// unsubscribes and lets the store prune its side of the channel. Consumers
/// either await [`Snapshots::changed`] in a loop or adapt the handle into a
/// stream.
#[derive(Debug)]
pub struct Snapshots<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Snapshots<T> {
    pub(crate) fn new(rx: watch::Receiver<T>) -> Self {
        Self { rx }
    }

    /// The most recently delivered result.
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Wait for the next delivered result.
    ///
    /// Returns `None` once the store side of the subscription is gone.
    /// Intermediate results may be skipped: only the latest snapshot
    /// matters, matching the push model of the backing database.
    pub async fn changed(&mut self) -> Option<T> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}

impl<T> Snapshots<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Adapt the subscription into a stream yielding each delivered result,
    /// starting with the current one.
    pub fn into_stream(self) -> impl Stream<Item = T> + Send + Unpin {
        WatchStream::new(self.rx)
    }
}
