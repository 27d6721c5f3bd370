// ── Coordinator ──
//
// Lifecycle management for one bridge: the initial refresh and identity
// check, periodic and on-demand polling, command routing, and the
// single-session binding gate. Everything funnels through the shared
// `Connection`, which serializes bridge traffic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use airios_api::Connection;
use airios_api::model::{AiriosData, BusAddress, ProductId, Property, RfAddress, Value};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, Notify, Semaphore, TryAcquireError, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::binding::{BindRequest, BindingHandle};
use crate::command::{Command, CommandEnvelope, CommandResult, route_command};
use crate::config::CoordinatorConfig;
use crate::error::CoreError;
use crate::store::SnapshotStore;
use crate::stream::SnapshotStream;

const COMMAND_CHANNEL_SIZE: usize = 64;
const EVENT_CHANNEL_SIZE: usize = 64;

// ── Events ───────────────────────────────────────────────────────

/// Outcome of one refresh, broadcast to listeners.
///
/// Always carries the whole snapshot, never a diff.
#[derive(Debug, Clone)]
pub enum RefreshEvent {
    Updated(Arc<AiriosData>),
    Failed { message: String, at: DateTime<Utc> },
}

/// Identity of the connected bridge, captured at start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeInfo {
    pub address: BusAddress,
    pub rf_address: RfAddress,
    pub product_id: ProductId,
    pub product_name: String,
    pub software_version: u16,
}

// ── Coordinator ──────────────────────────────────────────────────

/// The main entry point for hosts.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Owns the polling
/// loop, the current snapshot, the command processor and the binding
/// gate for one bridge.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    connection: Arc<Connection>,
    store: SnapshotStore,
    event_tx: broadcast::Sender<RefreshEvent>,
    last_update_success: AtomicBool,
    /// Serializes refreshes; a poll is never interleaved with another.
    refresh_lock: Mutex<()>,
    /// Set by `request_refresh`, cleared by the next refresh to start.
    refresh_pending: AtomicBool,
    /// Wakes the refresh worker.
    refresh_requested: Notify,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    /// One permit: at most one binding session at a time.
    binding_gate: Arc<Semaphore>,
    bridge: OnceLock<BridgeInfo>,
}

impl Coordinator {
    /// Create a coordinator. Does NOT touch the bridge; call
    /// [`start()`](Self::start) to load the first snapshot and spawn the
    /// background tasks.
    pub fn new(connection: Arc<Connection>, config: CoordinatorConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                connection,
                store: SnapshotStore::new(),
                event_tx,
                last_update_success: AtomicBool::new(false),
                refresh_lock: Mutex::new(()),
                refresh_pending: AtomicBool::new(false),
                refresh_requested: Notify::new(),
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
                binding_gate: Arc::new(Semaphore::new(1)),
                bridge: OnceLock::new(),
            }),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Load the first snapshot, validate the bridge, and spawn the
    /// refresh worker and command processor.
    ///
    /// Any failure here is `NotReady`: the host should retry setup
    /// later. A failed start can be retried on the same coordinator.
    pub async fn start(&self) -> Result<BridgeInfo, CoreError> {
        self.inner.config.validate()?;
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Disconnected);
        }

        let data = self
            .refresh(self.inner.config.fetch_result_status)
            .await
            .map_err(|e| CoreError::NotReady {
                reason: format!("initial refresh failed: {e}"),
            })?;

        let bridge = bridge_info(&data)?;
        let expected = self.inner.config.expected_bridge_rf;
        if let Some(expected) = expected.filter(|rf| *rf != bridge.rf_address) {
            return Err(CoreError::NotReady {
                reason: format!(
                    "unexpected bridge {} found, expected {}",
                    bridge.rf_address.to_hex(),
                    expected.to_hex()
                ),
            });
        }

        let Some(rx) = self.inner.command_rx.lock().await.take() else {
            return Err(CoreError::Internal("coordinator already started".into()));
        };
        let _ = self.inner.bridge.set(bridge.clone());

        let mut handles = self.inner.task_handles.lock().await;
        {
            let coordinator = self.clone();
            let cancel = self.inner.cancel.child_token();
            handles.push(tokio::spawn(command_processor_task(coordinator, rx, cancel)));
        }
        {
            let coordinator = self.clone();
            let cancel = self.inner.cancel.child_token();
            handles.push(tokio::spawn(refresh_task(coordinator, cancel)));
        }

        info!(
            address = %bridge.address,
            rf_address = %bridge.rf_address.to_hex(),
            product = %bridge.product_id,
            nodes = data.len(),
            "coordinator started"
        );
        Ok(bridge)
    }

    /// Stop background tasks, wait for a running binding session to
    /// finish its cleanup, and close the connection.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }

        // A session holds the permit until its cleanup unbind is done.
        if let Ok(permit) = self.inner.binding_gate.acquire().await {
            drop(permit);
        }
        self.inner.binding_gate.close();

        self.inner.connection.close().await;
        info!("coordinator shut down");
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Poll the bridge now and replace the snapshot.
    ///
    /// On failure the previous snapshot stays in place and listeners
    /// receive [`RefreshEvent::Failed`].
    pub async fn refresh(&self, with_status: bool) -> Result<Arc<AiriosData>, CoreError> {
        let _guard = self.inner.refresh_lock.lock().await;
        // This refresh starts after any request made so far.
        self.inner.refresh_pending.store(false, Ordering::Release);
        self.fetch_and_publish(with_status).await
    }

    /// Refresh only if a request is still outstanding once the refresh
    /// lock is held. Returns `None` when a refresh that started after the
    /// request already served it.
    async fn refresh_if_pending(
        &self,
        with_status: bool,
    ) -> Option<Result<Arc<AiriosData>, CoreError>> {
        let _guard = self.inner.refresh_lock.lock().await;
        if !self.inner.refresh_pending.swap(false, Ordering::AcqRel) {
            return None;
        }
        Some(self.fetch_and_publish(with_status).await)
    }

    /// Fetch and publish. Callers hold `refresh_lock`.
    async fn fetch_and_publish(&self, with_status: bool) -> Result<Arc<AiriosData>, CoreError> {
        match self.inner.connection.fetch(with_status).await {
            Ok(data) => {
                let data = Arc::new(data);
                self.inner.store.publish(Arc::clone(&data));
                self.inner.last_update_success.store(true, Ordering::Release);
                let _ = self.inner.event_tx.send(RefreshEvent::Updated(Arc::clone(&data)));
                debug!(nodes = data.len(), with_status, "refresh complete");
                Ok(data)
            }
            Err(e) => {
                self.inner.last_update_success.store(false, Ordering::Release);
                let message = e.to_string();
                let _ = self.inner.event_tx.send(RefreshEvent::Failed {
                    message: message.clone(),
                    at: Utc::now(),
                });
                Err(CoreError::UpdateFailed { message })
            }
        }
    }

    /// Ask the refresh worker for an out-of-schedule refresh.
    ///
    /// Requests made while a refresh is running collapse into a single
    /// follow-up refresh, whether the running one was requested, periodic
    /// or a direct [`refresh()`](Self::refresh) call. A refresh that
    /// starts after the request satisfies it.
    pub fn request_refresh(&self) {
        self.inner.refresh_pending.store(true, Ordering::Release);
        self.inner.refresh_requested.notify_one();
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Subscribe to refresh outcomes.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Subscribe to snapshot replacements.
    pub fn snapshot_stream(&self) -> SnapshotStream {
        self.inner.store.subscribe()
    }

    /// The latest successful snapshot.
    pub fn data(&self) -> Option<Arc<AiriosData>> {
        self.inner.store.load()
    }

    /// Bridge identity, once started.
    pub fn bridge(&self) -> Option<&BridgeInfo> {
        self.inner.bridge.get()
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.inner.connection
    }

    /// Whether the most recent refresh succeeded.
    pub fn last_update_success(&self) -> bool {
        self.inner.last_update_success.load(Ordering::Acquire)
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_refresh()
    }

    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.inner.store.data_age()
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Execute a command through the command processor.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Disconnected);
        }
        if self.inner.bridge.get().is_none() {
            return Err(CoreError::NotReady {
                reason: "coordinator not started".into(),
            });
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::Disconnected)?;

        rx.await.map_err(|_| CoreError::Disconnected)?
    }

    /// Start a binding session.
    ///
    /// Only one session runs at a time; a second request fails with
    /// `BindingInProgress` until the first has finished, cleanup
    /// included.
    pub fn bind(&self, request: BindRequest) -> Result<BindingHandle, CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Disconnected);
        }
        let permit = Arc::clone(&self.inner.binding_gate)
            .try_acquire_owned()
            .map_err(|e| match e {
                TryAcquireError::NoPermits => CoreError::BindingInProgress,
                TryAcquireError::Closed => CoreError::Disconnected,
            })?;

        Ok(BindingHandle::spawn_with(
            Arc::clone(&self.inner.connection),
            request,
            self.inner.config.binding,
            &self.inner.cancel,
            Some(permit),
        ))
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("bridge", &self.bridge())
            .field("last_update_success", &self.last_update_success())
            .finish_non_exhaustive()
    }
}

// ── Bridge identity ──────────────────────────────────────────────

/// Identity of the bridge node in `data`.
fn bridge_info(data: &AiriosData) -> Result<BridgeInfo, CoreError> {
    let not_ready = |what: &str| CoreError::NotReady {
        reason: format!("bridge {what} not available"),
    };
    let node = data.bridge().ok_or_else(|| not_ready("node"))?;

    Ok(BridgeInfo {
        address: node.address,
        rf_address: node.rf_address().ok_or_else(|| not_ready("RF address"))?,
        product_id: node.product_id().ok_or_else(|| not_ready("product ID"))?,
        product_name: node
            .product_name()
            .ok_or_else(|| not_ready("product name"))?
            .to_owned(),
        software_version: node
            .software_version()
            .ok_or_else(|| not_ready("software version"))?,
    })
}

/// Check that the device answering on `connection` is a supported
/// bridge, reading its identity live.
///
/// Used before a coordinator is created for a new bridge.
pub async fn probe_bridge(connection: &Connection) -> Result<BridgeInfo, CoreError> {
    let bridge = connection.bridge();

    let product_id = bridge.product_id().await?;
    if product_id != Some(ProductId::BRDG_02R13) {
        return Err(CoreError::UnexpectedDevice {
            expected: ProductId::BRDG_02R13,
            found: product_id.map_or_else(|| "unknown".to_owned(), |id| id.to_string()),
        });
    }

    let not_ready = |what: &str| CoreError::NotReady {
        reason: format!("bridge {what} not available"),
    };
    let rf_address = bridge
        .rf_address()
        .await?
        .ok_or_else(|| not_ready("RF address"))?;
    let product_name = bridge
        .get(Property::ProductName)
        .await?
        .value()
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| not_ready("product name"))?;
    let software_version = bridge
        .get(Property::SoftwareVersion)
        .await?
        .value()
        .and_then(Value::as_i64)
        .and_then(|raw| u16::try_from(raw).ok())
        .ok_or_else(|| not_ready("software version"))?;

    Ok(BridgeInfo {
        address: bridge.address(),
        rf_address,
        product_id: ProductId::BRDG_02R13,
        product_name,
        software_version,
    })
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodic and on-demand refresh.
async fn refresh_task(coordinator: Coordinator, cancel: CancellationToken) {
    let inner = &coordinator.inner;
    let with_status = inner.config.fetch_result_status;

    let mut interval = (!inner.config.scan_interval.is_zero()).then(|| {
        let mut interval = tokio::time::interval(inner.config.scan_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    if let Some(interval) = interval.as_mut() {
        interval.tick().await; // consume the immediate first tick
    }

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = inner.refresh_requested.notified() => {
                let Some(result) = coordinator.refresh_if_pending(with_status).await else {
                    debug!("requested refresh already served");
                    continue;
                };
                result
            }
            () = next_tick(interval.as_mut()) => coordinator.refresh(with_status).await,
        };

        if let Err(e) = result {
            warn!(error = %e, "background refresh failed");
        }
    }
}

async fn next_tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Process commands from the mpsc channel one at a time.
async fn command_processor_task(
    coordinator: Coordinator,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&coordinator, envelope.command).await;
                match &result {
                    Ok(CommandResult::Applied) => coordinator.request_refresh(),
                    Ok(CommandResult::Unchanged) => {}
                    Err(e) => warn!(error = %e, "command failed"),
                }
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}
