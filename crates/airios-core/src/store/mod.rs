// ── Snapshot store ──
//
// Lock-free holder of the current snapshot with push-based change
// notification.

mod snapshot_store;

pub use snapshot_store::SnapshotStore;
