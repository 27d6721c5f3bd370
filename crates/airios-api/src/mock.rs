// ── Scripted in-memory bridge ──
//
// A deterministic `AiriosClient` for tests of code built on this crate.
// Responses are scripted up front; every call is recorded so tests can
// assert on what reached the "bridge" and whether calls ever overlapped.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::AiriosClient;
use crate::error::Error;
use crate::model::{
    AiriosData, BindingStatus, BusAddress, NodeInfo, ProductId, Property, PropertyResult,
    ResetMode, RfAddress, Value,
};

/// One scripted answer to `bind_status()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStep {
    Status(BindingStatus),
    /// The bridge answered without a decodable status.
    Missing,
    /// The request failed at the transport level.
    TransportError,
}

/// A recorded bind command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindCall {
    Controller {
        address: BusAddress,
        product_id: ProductId,
        rf_serial: Option<RfAddress>,
    },
    Accessory {
        controller: BusAddress,
        address: BusAddress,
        product_id: ProductId,
    },
}

#[derive(Debug, Default)]
struct Script {
    snapshot: Option<AiriosData>,
    fetch_queue: VecDeque<Result<AiriosData, String>>,
    fetch_delay: Duration,
    nodes: Vec<NodeInfo>,
    bind_ack: Option<bool>,
    statuses: VecDeque<StatusStep>,
    last_status: Option<StatusStep>,
    status_delay: Duration,
    reads: BTreeMap<(BusAddress, Property), PropertyResult>,
    write_result: Option<bool>,
    fail_writes: bool,

    // Recorded calls.
    fetches: usize,
    fetch_with_status: Vec<bool>,
    status_polls: usize,
    writes: Vec<(BusAddress, Property, Value)>,
    binds: Vec<BindCall>,
    unbinds: Vec<BusAddress>,
    resets: Vec<ResetMode>,
    closes: usize,
}

#[derive(Debug, Default)]
struct Shared {
    script: Mutex<Script>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Scripted bridge. Clones share state, so keep one clone for
/// assertions and hand the other to a `Connection`.
#[derive(Debug, Clone, Default)]
pub struct MockBridge {
    shared: Arc<Shared>,
}

impl MockBridge {
    /// A bridge whose every `fetch` returns `snapshot` until scripted
    /// otherwise.
    pub fn new(snapshot: AiriosData) -> Self {
        let bridge = Self::default();
        bridge.script().snapshot = Some(snapshot);
        bridge
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.shared
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.shared.in_flight)
    }

    // ── Scripting ────────────────────────────────────────────────────

    /// Replace the snapshot returned once the fetch queue is empty.
    pub fn set_snapshot(&self, snapshot: AiriosData) {
        self.script().snapshot = Some(snapshot);
    }

    /// Answer the next `fetch` with `snapshot`.
    pub fn push_fetch(&self, snapshot: AiriosData) {
        self.script().fetch_queue.push_back(Ok(snapshot));
    }

    /// Fail the next `fetch` with a transport error.
    pub fn fail_next_fetch(&self, message: &str) {
        self.script().fetch_queue.push_back(Err(message.to_owned()));
    }

    /// Make every `fetch` take this long.
    pub fn set_fetch_delay(&self, delay: Duration) {
        self.script().fetch_delay = delay;
    }

    pub fn set_nodes(&self, nodes: Vec<NodeInfo>) {
        self.script().nodes = nodes;
    }

    /// Acknowledgment for bind commands (default: accepted).
    pub fn set_bind_ack(&self, accepted: bool) {
        self.script().bind_ack = Some(accepted);
    }

    /// Queue `bind_status` answers. The last one repeats once the queue
    /// runs dry.
    pub fn script_bind_status(&self, steps: impl IntoIterator<Item = StatusStep>) {
        self.script().statuses.extend(steps);
    }

    /// Hold every `bind_status` answer for `delay`.
    pub fn set_status_delay(&self, delay: Duration) {
        self.script().status_delay = delay;
    }

    /// Override a single property read.
    pub fn set_read(&self, address: BusAddress, property: Property, result: PropertyResult) {
        self.script().reads.insert((address, property), result);
    }

    /// Acknowledgment for property writes (default: accepted).
    pub fn set_write_result(&self, accepted: bool) {
        self.script().write_result = Some(accepted);
    }

    /// Fail every write with a transport error.
    pub fn fail_writes(&self) {
        self.script().fail_writes = true;
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub fn fetch_count(&self) -> usize {
        self.script().fetches
    }

    /// `with_status` argument of each fetch, in order.
    pub fn fetch_flags(&self) -> Vec<bool> {
        self.script().fetch_with_status.clone()
    }

    pub fn status_polls(&self) -> usize {
        self.script().status_polls
    }

    pub fn writes(&self) -> Vec<(BusAddress, Property, Value)> {
        self.script().writes.clone()
    }

    pub fn binds(&self) -> Vec<BindCall> {
        self.script().binds.clone()
    }

    pub fn unbinds(&self) -> Vec<BusAddress> {
        self.script().unbinds.clone()
    }

    pub fn resets(&self) -> Vec<ResetMode> {
        self.script().resets.clone()
    }

    pub fn close_count(&self) -> usize {
        self.script().closes
    }

    /// Highest number of calls ever observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.shared.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn transport(message: impl Into<String>) -> Error {
    Error::Transport {
        message: message.into(),
    }
}

#[async_trait]
impl AiriosClient for MockBridge {
    async fn fetch(&self, with_status: bool) -> Result<AiriosData, Error> {
        let _guard = self.enter();
        let delay = self.script().fetch_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.script();
        script.fetches += 1;
        script.fetch_with_status.push(with_status);
        match script.fetch_queue.pop_front() {
            Some(Ok(data)) => Ok(data),
            Some(Err(message)) => Err(transport(message)),
            None => script
                .snapshot
                .clone()
                .ok_or_else(|| transport("no snapshot scripted")),
        }
    }

    async fn nodes(&self) -> Result<Vec<NodeInfo>, Error> {
        let _guard = self.enter();
        Ok(self.script().nodes.clone())
    }

    async fn read(&self, address: BusAddress, property: Property) -> Result<PropertyResult, Error> {
        let _guard = self.enter();
        let script = self.script();
        if let Some(result) = script.reads.get(&(address, property)) {
            return Ok(result.clone());
        }
        Ok(script
            .snapshot
            .as_ref()
            .and_then(|data| data.node(address))
            .and_then(|node| node.get(property))
            .cloned()
            .unwrap_or_default())
    }

    async fn write(
        &self,
        address: BusAddress,
        property: Property,
        value: Value,
    ) -> Result<bool, Error> {
        let _guard = self.enter();
        let mut script = self.script();
        if script.fail_writes {
            return Err(transport("write failed"));
        }
        script.writes.push((address, property, value));
        Ok(script.write_result.unwrap_or(true))
    }

    async fn bind_controller(
        &self,
        address: BusAddress,
        product_id: ProductId,
        rf_serial: Option<RfAddress>,
    ) -> Result<bool, Error> {
        let _guard = self.enter();
        let mut script = self.script();
        script.binds.push(BindCall::Controller {
            address,
            product_id,
            rf_serial,
        });
        Ok(script.bind_ack.unwrap_or(true))
    }

    async fn bind_accessory(
        &self,
        controller: BusAddress,
        address: BusAddress,
        product_id: ProductId,
    ) -> Result<bool, Error> {
        let _guard = self.enter();
        let mut script = self.script();
        script.binds.push(BindCall::Accessory {
            controller,
            address,
            product_id,
        });
        Ok(script.bind_ack.unwrap_or(true))
    }

    async fn bind_status(&self) -> Result<Option<BindingStatus>, Error> {
        let _guard = self.enter();
        let delay = self.script().status_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.script();
        script.status_polls += 1;
        let step = match script.statuses.pop_front() {
            Some(step) => {
                script.last_status = Some(step);
                step
            }
            None => script.last_status.unwrap_or(StatusStep::Missing),
        };
        match step {
            StatusStep::Status(status) => Ok(Some(status)),
            StatusStep::Missing => Ok(None),
            StatusStep::TransportError => Err(transport("status poll failed")),
        }
    }

    async fn unbind(&self, address: BusAddress) -> Result<bool, Error> {
        let _guard = self.enter();
        self.script().unbinds.push(address);
        Ok(true)
    }

    async fn reset(&self, mode: ResetMode) -> Result<bool, Error> {
        let _guard = self.enter();
        self.script().resets.push(mode);
        Ok(true)
    }

    async fn close(&self) {
        self.script().closes += 1;
    }
}
