// ── Bridge facade ──
//
// Full lifecycle management for one hardware connection: the worker cycle
// (connection check, watch-list synchronization, notification wait,
// periodic maintenance), the independent write path, and cooperative
// shutdown with join semantics. One `Bridge` per hardware instance; no
// process-wide state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::cache::{CachedDevice, DeviceCache};
use crate::config::BridgeConfig;
use crate::connection::{ConnectionState, Link};
use crate::convert;
use crate::error::BridgeError;
use crate::model::{DeviceId, SwitchRequest};
use crate::registry::DeviceRegistry;
use crate::session::ControllerSession;
use crate::sink::CommandSink;

// ── Stats ────────────────────────────────────────────────────────────

/// Observability counters. They never influence retry policy.
#[derive(Debug)]
struct BridgeStats {
    cycles: AtomicU64,
    faults: AtomicU64,
    commands_delivered: AtomicU64,
    updates_written: AtomicU64,
    last_cycle: watch::Sender<Option<DateTime<Utc>>>,
    last_levels_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl BridgeStats {
    fn new() -> Self {
        let (last_cycle, _) = watch::channel(None);
        let (last_levels_refresh, _) = watch::channel(None);
        Self {
            cycles: AtomicU64::new(0),
            faults: AtomicU64::new(0),
            commands_delivered: AtomicU64::new(0),
            updates_written: AtomicU64::new(0),
            last_cycle,
            last_levels_refresh,
        }
    }

    fn tick_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.last_cycle.send_replace(Some(Utc::now()));
    }

    fn mark_levels_refresh(&self) {
        self.last_levels_refresh.send_replace(Some(Utc::now()));
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
            commands_delivered: self.commands_delivered.load(Ordering::Relaxed),
            updates_written: self.updates_written.load(Ordering::Relaxed),
            last_cycle: *self.last_cycle.borrow(),
            last_levels_refresh: *self.last_levels_refresh.borrow(),
        }
    }
}

/// Point-in-time view of the bridge's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub cycles: u64,
    pub faults: u64,
    pub commands_delivered: u64,
    pub updates_written: u64,
    pub last_cycle: Option<DateTime<Utc>>,
    pub last_levels_refresh: Option<DateTime<Utc>>,
}

// ── Bridge ───────────────────────────────────────────────────────────

/// The device-synchronization engine for one controller connection.
///
/// Cheaply cloneable via `Arc`. [`start()`](Self::start) spawns the worker
/// cycle; [`write()`](Self::write) may be called concurrently from any
/// task while the worker runs; [`stop()`](Self::stop) cancels the worker
/// and blocks until it has unwound and released the session.
pub struct Bridge<S, R, K> {
    inner: Arc<BridgeInner<S, R, K>>,
}

impl<S, R, K> Clone for Bridge<S, R, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct BridgeInner<S, R, K> {
    config: BridgeConfig,
    link: Link<S>,
    registry: R,
    sink: K,
    cache: DeviceCache,
    /// Set on startup and after every session fault; the next connected
    /// cycle rebuilds the cache and serial index from the registry.
    needs_rebuild: AtomicBool,
    stats: BridgeStats,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

enum CycleOutcome {
    Ran,
    /// No device watched: session was reset and the cooldown served.
    Idle,
}

impl<S, R, K> Bridge<S, R, K>
where
    S: ControllerSession,
    R: DeviceRegistry,
    K: CommandSink,
{
    /// Create a bridge. Does NOT connect -- call [`start()`](Self::start)
    /// to spawn the worker cycle.
    pub fn new(config: BridgeConfig, session: S, registry: R, sink: K) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                config,
                link: Link::new(session),
                registry,
                sink,
                cache: DeviceCache::new(),
                needs_rebuild: AtomicBool::new(true),
                stats: BridgeStats::new(),
                cancel: CancellationToken::new(),
                worker: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the worker cycle. A bridge runs at most one worker; calling
    /// this twice is a no-op.
    pub async fn start(&self) {
        let mut worker = self.inner.worker.lock().await;
        if worker.is_some() {
            warn!("bridge worker already running");
            return;
        }
        let bridge = self.clone();
        let cancel = self.inner.cancel.clone();
        *worker = Some(tokio::spawn(worker_task(bridge, cancel)));
    }

    /// Request shutdown and block until the worker has observed it and
    /// exited. The worker logs out best-effort and releases the session
    /// on the way down.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.worker.lock().await.take();
        if let Some(handle) = handle {
            if let Err(error) = handle.await {
                warn!(%error, "worker task aborted");
            }
        }
    }

    /// Graceful session termination, independent of shutdown.
    pub async fn logout(&self) {
        self.inner.link.logout().await;
    }

    // ── State observation ────────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        self.inner.link.is_connected()
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.link.subscribe()
    }

    /// Cached metadata for a device, if the cache knows it.
    pub fn device(&self, id: DeviceId) -> Option<CachedDevice> {
        self.inner.cache.lookup(id)
    }

    pub fn device_count(&self) -> usize {
        self.inner.cache.len()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    // ── Write path (hub → controller) ────────────────────────────────

    /// Apply an inbound hub command to the controller.
    ///
    /// Requires an established session: returns `false` immediately when
    /// disconnected, without touching the session. A transport fault
    /// resets the session and flags a cache rebuild for the next cycle.
    /// No retry.
    pub async fn write(&self, request: SwitchRequest) -> bool {
        if !self.inner.link.is_connected() {
            return false;
        }

        let update = match convert::request_to_update(&request) {
            Ok(update) => update,
            Err(error) => {
                warn!(device = %request.device_id, %error, "rejected write");
                return false;
            }
        };

        match self.inner.link.session().resource_update(&update).await {
            Ok(true) => {
                self.inner
                    .stats
                    .updates_written
                    .fetch_add(1, Ordering::Relaxed);
                info!(device = %request.device_id, "resource update was successful");
                true
            }
            Ok(false) => {
                info!(device = %request.device_id, "failed resource update");
                false
            }
            Err(error) => {
                warn!(device = %request.device_id, %error, "resource update failed");
                self.inner.link.reset().await;
                self.inner.needs_rebuild.store(true, Ordering::SeqCst);
                false
            }
        }
    }

    // ── Maintenance (controller → cache + registry) ──────────────────

    /// Refresh battery/signal for all serial-bearing devices from the
    /// controller's wireless report. `Ok(false)` means the report was
    /// structurally empty -- nothing to update, not a failure.
    pub async fn refresh_levels(&self) -> Result<bool, BridgeError> {
        debug!("refreshing battery and signal levels");
        let report = self.inner.link.session().detected_rf_devices().await?;
        if report.is_empty() {
            return Ok(false);
        }

        for entry in &report.devices {
            let battery = convert::quantize_battery(entry.battery_indicator);
            let signal = convert::quantize_signal(entry.signal_strength);
            let touched = self.inner.cache.set_levels(entry.serial, battery, signal);
            trace!(serial = %entry.serial, battery, signal, touched, "levels refreshed");
            if let Err(error) = self
                .inner
                .registry
                .store_levels(entry.serial, battery, signal)
                .await
            {
                warn!(serial = %entry.serial, %error, "failed to persist levels");
            }
        }

        self.inner.stats.mark_levels_refresh();
        Ok(true)
    }

    /// Maintenance wrapper for the cycle: failures are logged, never fatal.
    async fn run_maintenance(&self) {
        match self.refresh_levels().await {
            Ok(true) => {}
            Ok(false) => warn!("controller reported no detected wireless devices"),
            Err(error) => warn!(%error, "battery/signal refresh failed"),
        }
    }

    // ── Worker cycle internals ───────────────────────────────────────

    /// Watched ids from the registry, parsed; unparseable entries are
    /// logged and skipped so one bad row cannot stall synchronization.
    async fn watched_devices(&self) -> Result<Vec<DeviceId>, BridgeError> {
        let raw = self.inner.registry.watched_ids().await?;
        let mut ids = Vec::with_capacity(raw.len());
        for text in &raw {
            match DeviceId::from_hex(text) {
                Ok(id) => ids.push(id),
                Err(error) => warn!(value = %text, %error, "skipping unparseable watched id"),
            }
        }
        Ok(ids)
    }

    /// One connected pass: rebuild if flagged, synchronize the watch
    /// list, run due maintenance, wait for and translate notifications.
    async fn run_cycle(
        &self,
        active: &mut Vec<DeviceId>,
        maintenance_tick: &mut u32,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome, BridgeError> {
        let config = &self.inner.config;

        if self.inner.needs_rebuild.swap(false, Ordering::SeqCst) {
            active.clear();
            let rows = self.inner.registry.all_devices().await?;
            let summary = self.inner.cache.rebuild(&rows);
            debug!(
                devices = summary.devices,
                wireless = summary.wireless,
                skipped = summary.skipped,
                "device cache rebuilt"
            );
            // Fresh devices get levels immediately, then on the regular cadence.
            self.run_maintenance().await;
            *maintenance_tick = 1;
        }

        let watched = self.watched_devices().await?;
        if watched.is_empty() {
            info!("no devices watched - disconnecting");
            self.inner.link.reset().await;
            active.clear();
            pause(cancel, config.idle_cooldown()).await;
            return Ok(CycleOutcome::Idle);
        }

        self.inner.link.ensure_open().await?;

        let maintenance_every = config.maintenance_interval_cycles.max(1);
        if *maintenance_tick % maintenance_every == 0 {
            self.run_maintenance().await;
        }
        *maintenance_tick = maintenance_tick.wrapping_add(1);

        // Re-subscribing is disruptive on the controller side; only do it
        // when the sequence actually changed.
        if *active != watched {
            debug!(devices = watched.len(), "updating notification watch list");
            self.inner
                .link
                .session()
                .enable_runtime_notifications(&watched)
                .await?;
            *active = watched;
        }

        let notifications = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(CycleOutcome::Ran),
            result = self
                .inner
                .link
                .session()
                .wait_resource_notifications(config.notification_timeout()) => result?,
        };

        for value in notifications {
            let Some(device) = self.inner.cache.lookup(value.id) else {
                trace!(resource = %value.id, "notification for unknown device");
                continue;
            };
            let command = convert::notification_to_command(&value, &device);
            self.inner.sink.deliver(command, device.battery).await?;
            self.inner
                .stats
                .commands_delivered
                .fetch_add(1, Ordering::Relaxed);
        }

        Ok(CycleOutcome::Ran)
    }
}

// ── Worker task ──────────────────────────────────────────────────────

/// The repeating synchronization cycle. Exactly one per bridge; all
/// mutable cycle state (open throttle, maintenance tick, active watch
/// list) lives in this task's locals.
async fn worker_task<S, R, K>(bridge: Bridge<S, R, K>, cancel: CancellationToken)
where
    S: ControllerSession,
    R: DeviceRegistry,
    K: CommandSink,
{
    info!("worker started");

    let config = bridge.inner.config.clone();
    let open_every = config.open_retry_cycles.max(1);
    // Seeded near the boundary so the first attempt lands a couple of
    // cycles after startup instead of a full throttle period later.
    let mut open_backoff = open_every.saturating_sub(2);
    let mut maintenance_tick: u32 = 1;
    let mut active: Vec<DeviceId> = Vec::new();

    while !cancel.is_cancelled() {
        bridge.inner.stats.tick_cycle();

        if bridge.inner.link.is_connected() {
            match bridge
                .run_cycle(&mut active, &mut maintenance_tick, &cancel)
                .await
            {
                Ok(CycleOutcome::Ran) => {}
                Ok(CycleOutcome::Idle) => {
                    open_backoff = 0;
                }
                Err(error) => {
                    bridge.inner.stats.faults.fetch_add(1, Ordering::Relaxed);
                    match &error {
                        BridgeError::Protocol { request, response } => {
                            error!(%request, %response, "controller protocol fault");
                        }
                        other => error!(error = %other, "synchronization cycle failed"),
                    }
                    bridge.inner.link.reset().await;
                    bridge.inner.needs_rebuild.store(true, Ordering::SeqCst);
                    active.clear();
                    open_backoff = 0;
                }
            }
        } else {
            if open_backoff % open_every == 0 {
                debug!("connecting to controller");
                if let Err(error) = bridge.inner.link.open().await {
                    warn!(%error, "controller connection failed");
                    bridge.inner.needs_rebuild.store(true, Ordering::SeqCst);
                }
            }
            open_backoff = open_backoff.wrapping_add(1);
        }

        if !pause(&cancel, config.pacing()).await {
            break;
        }
    }

    if bridge.inner.link.is_connected() {
        bridge.inner.link.logout().await;
    }
    bridge.inner.link.reset().await;
    info!("worker stopped");
}

/// Cancellable sleep. Returns `false` when shutdown was requested.
async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}
