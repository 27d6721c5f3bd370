// ── Current snapshot ──
//
// Readers load the latest `Arc<AiriosData>` without locking; a refresh
// swaps in a whole new snapshot, so no reader can observe a mix of old
// and new values. Subscribers are woken through a `watch` channel.

use std::sync::Arc;

use airios_api::model::AiriosData;
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::stream::SnapshotStream;

/// Holder of the most recent successful poll.
pub struct SnapshotStore {
    current: ArcSwapOption<AiriosData>,
    changes: watch::Sender<Option<Arc<AiriosData>>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(None);
        let (last_refresh, _) = watch::channel(None);

        Self {
            current: ArcSwapOption::empty(),
            changes,
            last_refresh,
        }
    }

    /// The current snapshot, `None` before the first successful poll.
    pub fn load(&self) -> Option<Arc<AiriosData>> {
        self.current.load_full()
    }

    /// Replace the snapshot wholesale.
    pub(crate) fn publish(&self, data: Arc<AiriosData>) {
        self.current.store(Some(Arc::clone(&data)));
        self.changes.send_replace(Some(data));
        self.last_refresh.send_replace(Some(Utc::now()));
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.changes.subscribe())
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// How long ago the last successful refresh occurred, or `None` if
    /// never refreshed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use airios_api::model::BusAddress;

    use super::*;

    #[test]
    fn publish_replaces_and_stamps() {
        let store = SnapshotStore::new();
        assert!(store.load().is_none());
        assert!(store.data_age().is_none());

        let first = Arc::new(AiriosData::new(BusAddress::new(207)));
        store.publish(Arc::clone(&first));
        assert!(Arc::ptr_eq(&store.load().unwrap(), &first));
        assert!(store.last_refresh().is_some());

        let second = Arc::new(AiriosData::new(BusAddress::new(1)));
        store.publish(Arc::clone(&second));
        assert!(Arc::ptr_eq(&store.load().unwrap(), &second));
    }

    #[test]
    fn reader_keeps_its_snapshot_across_publish() {
        let store = SnapshotStore::new();
        store.publish(Arc::new(AiriosData::new(BusAddress::new(207))));
        let held = store.load().unwrap();

        store.publish(Arc::new(AiriosData::new(BusAddress::new(1))));
        assert_eq!(held.bridge_address, BusAddress::new(207));
        assert_eq!(store.load().unwrap().bridge_address, BusAddress::new(1));
    }
}
