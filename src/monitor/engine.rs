//! The network interface engine.
//!
//! [`NetworkInterfaces`] owns the [`Store`], runs reconciliation passes
//! against its collaborators and serves freshness-bounded reads and feeds.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::{Notify, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, trace, warn};

use super::change::Change;
use super::dispatch::{ChangeFeed, Dispatcher, FramedChanges, FramedWarnings, WarningFeed};
use super::error::{Warning, WatchError};
use super::reconcile::{Plan, reconcile};
use super::scheduler::{Scheduler, SchedulerState, Subscription};
use crate::config::defaults;
use crate::encoding::Framing;
use crate::network::{ActiveInterfaceLookup, Family, InterfaceEnumerator, NicTypeLookup, NicTypes};
use crate::state::{InterfaceRecord, Store};
use crate::time::{Clock, SystemClock};

/// Engine options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Maximum age of state observed by reads, and the polling period while
    /// change subscribers exist.
    pub max_age: Duration,
}

impl WatchOptions {
    /// Default maximum age.
    pub const DEFAULT_MAX_AGE: Duration = Duration::from_millis(defaults::MAX_AGE_MS);

    /// Creates options with the given maximum age.
    #[must_use]
    pub const fn new(max_age: Duration) -> Self {
        Self { max_age }
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_AGE)
    }
}

/// A consistent copy of the store taken at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    store: Store,
}

impl Snapshot {
    /// Lazily lists the snapshot as `add-interface` / `add-address` changes.
    ///
    /// This is the same sequence a new change subscriber receives first.
    pub fn changes(&self) -> impl Iterator<Item = Change> + '_ {
        self.store.changes()
    }

    /// Iterates over the interface records.
    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceRecord> {
        self.store.interfaces()
    }

    /// Returns the record of `interface_id`.
    #[must_use]
    pub fn get(&self, interface_id: &str) -> Option<&InterfaceRecord> {
        self.store.get(interface_id)
    }

    /// Returns the active interface record.
    #[must_use]
    pub fn active(&self) -> Option<&InterfaceRecord> {
        self.store.current_active()
    }

    /// Returns the number of interfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true when no interface was observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// Last successful auxiliary lookup results.
#[derive(Debug, Default)]
struct LookupCache {
    active: Option<String>,
    nic_types: Option<NicTypes>,
}

struct Shared<E, A, N, C> {
    options: WatchOptions,
    enumerator: E,
    active_lookup: A,
    nic_lookup: N,
    clock: C,
    store: RwLock<Store>,
    cache: Mutex<LookupCache>,
    /// Serializes passes.
    gate: tokio::sync::Mutex<()>,
    scheduler: Arc<Mutex<Scheduler>>,
    changes: Dispatcher<Change>,
    warnings: Dispatcher<Warning>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Watches the host's network interfaces.
///
/// Cloning is cheap; clones share one store and one set of subscribers.
/// There is no global instance: construct one per independent consumer.
///
/// # Type Parameters
///
/// * `E` - The [`InterfaceEnumerator`] reporting interfaces and addresses
/// * `A` - The [`ActiveInterfaceLookup`] naming the default-route interface
/// * `N` - The [`NicTypeLookup`] classifying interfaces
/// * `C` - The [`Clock`] stamping framed change records (defaults to [`SystemClock`])
///
/// # Example
///
/// ```ignore
/// use netif_watch::monitor::{NetworkInterfaces, WatchOptions};
/// use netif_watch::network::platform::{NetdevActiveLookup, NetdevEnumerator, PlatformNicTypes};
/// use tokio_stream::StreamExt;
///
/// let timeout = std::time::Duration::from_secs(5);
/// let engine = NetworkInterfaces::new(
///     WatchOptions::default(),
///     NetdevEnumerator,
///     NetdevActiveLookup::new(timeout),
///     PlatformNicTypes::new(timeout),
/// );
///
/// let mut feed = engine.subscribe().await?;
/// while let Some(change) = feed.next().await {
///     println!("{change}");
/// }
/// ```
pub struct NetworkInterfaces<E, A, N, C = SystemClock> {
    shared: Arc<Shared<E, A, N, C>>,
}

impl<E, A, N, C> Clone for NetworkInterfaces<E, A, N, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E, A, N> NetworkInterfaces<E, A, N, SystemClock>
where
    E: InterfaceEnumerator + 'static,
    A: ActiveInterfaceLookup + 'static,
    N: NicTypeLookup + 'static,
{
    /// Creates an engine stamping records with the system clock.
    #[must_use]
    pub fn new(options: WatchOptions, enumerator: E, active_lookup: A, nic_lookup: N) -> Self {
        Self::with_clock(options, enumerator, active_lookup, nic_lookup, SystemClock)
    }
}

impl<E, A, N, C> NetworkInterfaces<E, A, N, C>
where
    E: InterfaceEnumerator + 'static,
    A: ActiveInterfaceLookup + 'static,
    N: NicTypeLookup + 'static,
    C: Clock + Clone + Unpin + 'static,
{
    /// Creates an engine with a custom clock.
    #[must_use]
    pub fn with_clock(
        options: WatchOptions,
        enumerator: E,
        active_lookup: A,
        nic_lookup: N,
        clock: C,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                options,
                enumerator,
                active_lookup,
                nic_lookup,
                clock,
                store: RwLock::new(Store::new()),
                cache: Mutex::new(LookupCache::default()),
                gate: tokio::sync::Mutex::new(()),
                scheduler: Arc::new(Mutex::new(Scheduler::new(options.max_age))),
                changes: Dispatcher::new(),
                warnings: Dispatcher::new(),
            }),
        }
    }

    /// Returns the configured maximum state age.
    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.shared.options.max_age
    }

    /// Returns the clock stamping framed change records.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.shared.clock
    }

    /// Returns whether periodic polling is running.
    #[must_use]
    pub fn scheduler_state(&self) -> SchedulerState {
        lock(&self.shared.scheduler).state()
    }

    /// Runs one reconciliation pass now, after any pass in flight.
    ///
    /// Returns the applied changes and the warnings raised.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Enumerate`] if the enumeration collaborator fails.
    pub async fn refresh(&self) -> Result<Plan, WatchError> {
        let _gate = self.shared.gate.lock().await;
        self.shared.pass().await
    }

    /// Runs one pass only if the state is older than the maximum age.
    ///
    /// Concurrent callers wait for the pass in flight instead of starting
    /// another one.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Enumerate`] if a pass was due and failed.
    pub async fn check_refresh(&self) -> Result<(), WatchError> {
        self.shared.check_refresh().await
    }

    /// Returns the current state after a freshness check.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] if a due pass failed.
    pub async fn state(&self) -> Result<Snapshot, WatchError> {
        self.check_refresh().await?;
        let store = self.shared.store.read().await.clone();
        Ok(Snapshot { store })
    }

    /// Returns the interface currently carrying the default route.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] if a due pass failed.
    pub async fn active(&self) -> Result<Option<InterfaceRecord>, WatchError> {
        self.check_refresh().await?;
        Ok(self.shared.store.read().await.current_active().cloned())
    }

    /// Returns true when `address` of `family` is bound to some interface.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] if a due pass failed.
    pub async fn is_local_address(&self, family: Family, address: &str) -> Result<bool, WatchError> {
        self.check_refresh().await?;
        Ok(self.shared.store.read().await.is_local(family, address))
    }

    /// Maps a local address to the first internal address of the same family.
    ///
    /// Non-local addresses, and local ones with no internal alternative, are
    /// returned unchanged. With several internal candidates the choice
    /// follows store order and is not otherwise specified.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] if a due pass failed.
    pub async fn prefer_internal_for_local(
        &self,
        family: Family,
        address: &str,
    ) -> Result<String, WatchError> {
        self.check_refresh().await?;
        let store = self.shared.store.read().await;
        if !store.is_local(family, address) {
            return Ok(address.to_string());
        }
        Ok(store
            .first_internal(family)
            .map_or_else(|| address.to_string(), |internal| internal.address.clone()))
    }

    /// Subscribes to changes.
    ///
    /// The feed starts with the current state as adds and continues with
    /// every change applied afterwards. The first subscriber starts periodic
    /// polling; dropping the last one stops it.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] if a due pass failed.
    pub async fn subscribe(&self) -> Result<ChangeFeed, WatchError> {
        self.check_refresh().await?;
        let shared = &self.shared;

        // Registering under the read lock keeps replay and live changes gapless.
        let (replay, receiver) = {
            let store = shared.store.read().await;
            (store.changes().collect::<VecDeque<_>>(), shared.changes.register())
        };

        let cancel = lock(&shared.scheduler).add_subscriber();
        if let Some(cancel) = cancel {
            spawn_timer(Arc::downgrade(shared), cancel);
        }

        Ok(ChangeFeed::new(
            replay,
            receiver,
            Subscription::new(Arc::clone(&shared.scheduler)),
        ))
    }

    /// Subscribes to warnings raised from now on.
    #[must_use]
    pub fn warnings(&self) -> WarningFeed {
        WarningFeed::new(self.shared.warnings.register())
    }

    /// Subscribes to both feeds rendered through `framing`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] if a due pass failed.
    pub async fn stream(
        &self,
        framing: Framing,
    ) -> Result<(FramedChanges<C>, FramedWarnings), WatchError> {
        let warnings = self.warnings().framed(framing);
        let changes = self
            .subscribe()
            .await?
            .framed(framing, self.shared.clock.clone());
        Ok((changes, warnings))
    }
}

impl<E, A, N, C> Shared<E, A, N, C>
where
    E: InterfaceEnumerator,
    A: ActiveInterfaceLookup,
    N: NicTypeLookup,
{
    fn is_stale(&self) -> bool {
        lock(&self.scheduler).is_stale(Instant::now())
    }

    async fn check_refresh(&self) -> Result<(), WatchError> {
        if !self.is_stale() {
            return Ok(());
        }
        let _gate = self.gate.lock().await;
        if !self.is_stale() {
            return Ok(());
        }
        self.pass().await.map(drop)
    }

    /// One full lookup, enumerate, diff, apply and publish cycle.
    ///
    /// Callers must hold `gate`.
    async fn pass(&self) -> Result<Plan, WatchError> {
        let started = Instant::now();
        let (active_id, nic_types, mut warnings) = self.lookups().await;

        for warning in &warnings {
            warn!(code = %warning.code, "{warning}");
            self.warnings.publish(warning);
        }

        // Freshness dates from the enumeration, not from the lookups before it.
        let read_at = Instant::now();
        let interfaces = self.enumerator.enumerate()?;

        let mut store = self.store.write().await;
        let mut plan = reconcile(&mut store, interfaces, active_id.as_deref(), nic_types.as_ref());
        for change in &plan.changes {
            trace!(%change, "Applied change");
            self.changes.publish(change);
        }
        drop(store);

        for warning in &plan.warnings {
            self.warnings.publish(warning);
        }
        lock(&self.scheduler).mark_refreshed(read_at);

        debug!(
            changes = plan.changes.len(),
            warnings = warnings.len() + plan.warnings.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Reconciliation pass complete"
        );

        warnings.append(&mut plan.warnings);
        plan.warnings = warnings;
        Ok(plan)
    }

    /// Runs both lookups concurrently, keeping the last good value on failure.
    async fn lookups(&self) -> (Option<String>, Option<NicTypes>, Vec<Warning>) {
        let (active, nic_types) = tokio::join!(
            self.active_lookup.active_interface(),
            self.nic_lookup.nic_types()
        );

        let mut warnings = Vec::new();
        let mut cache = lock(&self.cache);
        match active {
            Ok(active) => cache.active = active,
            Err(e) => warnings.push(Warning::active_lookup(&e)),
        }
        match nic_types {
            Ok(types) => cache.nic_types = Some(types),
            Err(e) => warnings.push(Warning::nic_type_lookup(&e)),
        }
        (cache.active.clone(), cache.nic_types.clone(), warnings)
    }
}

/// Reconciles once per max age until `cancel` is notified or the engine is dropped.
fn spawn_timer<E, A, N, C>(shared: Weak<Shared<E, A, N, C>>, cancel: Arc<Notify>)
where
    E: InterfaceEnumerator + 'static,
    A: ActiveInterfaceLookup + 'static,
    N: NicTypeLookup + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        loop {
            let Some(engine) = shared.upgrade() else {
                break;
            };
            let due = lock(&engine.scheduler).next_due(Instant::now());
            let max_age = engine.options.max_age;
            drop(engine);

            tokio::select! {
                () = cancel.notified() => break,
                () = tokio::time::sleep_until(due) => {}
            }

            let Some(engine) = shared.upgrade() else {
                break;
            };
            if let Err(e) = engine.check_refresh().await {
                error!("Periodic reconciliation failed: {e}");
                drop(engine);
                tokio::select! {
                    () = cancel.notified() => break,
                    () = tokio::time::sleep(max_age) => {}
                }
            }
        }
        trace!("Polling timer stopped");
    });
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
