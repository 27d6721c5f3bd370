// ── Reactive snapshot stream ──
//
// Subscription type for consuming snapshot replacements from the store.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use airios_api::model::AiriosData;
use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

type Slot = Option<Arc<AiriosData>>;

/// A subscription to the coordinator's snapshot.
///
/// Provides both point-in-time access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`. Only
/// successful polls produce a change; failures leave the snapshot alone.
pub struct SnapshotStream {
    current: Slot,
    receiver: watch::Receiver<Slot>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<Slot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or at the last `changed()`).
    pub fn current(&self) -> Option<&Arc<AiriosData>> {
        self.current.as_ref()
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Slot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next snapshot. Returns `None` once the coordinator
    /// has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<AiriosData>> {
        loop {
            self.receiver.changed().await.ok()?;
            let snap = self.receiver.borrow_and_update().clone();
            if let Some(snap) = snap {
                self.current = Some(Arc::clone(&snap));
                return Some(snap);
            }
        }
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current snapshot first, then each replacement. Empty slots
/// (before the first poll) are skipped.
pub struct SnapshotWatchStream {
    inner: WatchStream<Slot>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<AiriosData>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Some(snap))) => return Poll::Ready(Some(snap)),
                Poll::Ready(Some(None)) => {}
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
