// ── Bus address allocation ──
//
// Picks the slot for a node about to be bound. Reads the bridge's live
// node table rather than the cached snapshot: a node unbound since the
// last poll would otherwise still block its address, and one bound since
// would be handed out twice.

use std::collections::BTreeSet;

use airios_api::Connection;
use airios_api::model::BusAddress;
use tracing::debug;

use crate::binding::BindingError;

/// Lowest address in [`BusAddress::BIND_RANGE`] not in `occupied`.
///
/// Occupied addresses outside the range (the bridge's own slot, for one)
/// are ignored.
pub fn lowest_free(occupied: impl IntoIterator<Item = BusAddress>) -> Option<BusAddress> {
    let taken: BTreeSet<u8> = occupied.into_iter().map(BusAddress::get).collect();
    let mut candidates = BusAddress::BIND_RANGE;
    candidates
        .find(|raw| !taken.contains(raw))
        .map(BusAddress::new)
}

/// Allocate a free address from the bridge's live node table.
pub async fn allocate_address(connection: &Connection) -> Result<BusAddress, BindingError> {
    let nodes = connection
        .nodes()
        .await
        .map_err(|source| BindingError::Transport {
            address: None,
            last_status: None,
            source,
        })?;

    let address = lowest_free(nodes.iter().map(|n| n.address))
        .ok_or(BindingError::NoAddressAvailable)?;
    debug!(%address, occupied = nodes.len(), "allocated bus address");
    Ok(address)
}
