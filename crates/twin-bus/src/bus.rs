//! # Adaptable Bus
//!
//! Routes every inbound text frame to the subscribers waiting for it.
//!
//! ## Dispatch Tiers
//!
//! ```text
//!  raw frame
//!     │
//!     ▼
//!  string classifiers ──match──→ one-time string waiter ──→ done
//!     │ (no waiter)
//!     ▼
//!  parse ──fails──→ unhandled sink
//!     │
//!     ▼
//!  adaptable classifiers ──none──→ unhandled sink
//!     │
//!     ├──→ one-time adaptable waiter ──→ done
//!     │ (no waiter)
//!     ▼
//!  durable consumers (registration order) ──none──→ unhandled sink
//! ```
//!
//! A frame consumed by a one-time waiter never reaches a lower tier.
//!
//! ## Locking
//!
//! Publishing and subscription changes are serialized by a reentrant
//! dispatch lock, so a consumer may publish, subscribe or unsubscribe from
//! inside its callback. The subscription table has its own short-lived
//! mutex that is never held while consumer code runs. Timeout tasks only
//! take the table mutex; a one-time subscription's outcome is decided by a
//! compare-and-set on its resolution cell.

use crate::classifier::{Classification, Classifier, ClassifierChain};
use crate::config::BusConfig;
use crate::error::{BusError, BusResult};
use crate::parser::{AdaptableParser, JsonAdaptableParser};
use crate::registry::{AdaptableConsumer, IdleTimeout, PersistentEntry, Registry, Removed, Waiter};
use crate::scheduler::TimeoutScheduler;
use crate::sink::{LoggingUnhandledSink, UnhandledReason, UnhandledSink};
use crate::stats::{BusStats, BusStatsSnapshot};
use crate::stream::AdaptableStream;
use crate::subscription::{
    OneTimeSubscription, Resolution, ResolutionCell, SubscriptionId, SubscriptionKind,
};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};
use twin_types::Adaptable;

/// Anything inbound frames can be handed to.
///
/// Transports depend on this rather than on [`AdaptableBus`] directly.
pub trait FramePublisher: Send + Sync {
    /// Dispatch one inbound frame.
    fn publish(&self, raw: &str);

    /// Total frames published so far.
    fn frames_published(&self) -> u64;
}

/// Builder for [`AdaptableBus`].
pub struct AdaptableBusBuilder {
    config: BusConfig,
    runtime: Option<Handle>,
    parser: Option<Arc<dyn AdaptableParser>>,
    unhandled: Option<Arc<dyn UnhandledSink>>,
}

impl AdaptableBusBuilder {
    fn new() -> Self {
        Self {
            config: BusConfig::default(),
            runtime: None,
            parser: None,
            unhandled: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    /// Runtime that drives timeouts. Defaults to the current one.
    #[must_use]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Frame parser. Defaults to [`JsonAdaptableParser`].
    #[must_use]
    pub fn parser(mut self, parser: impl AdaptableParser + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Destination of unroutable frames. Defaults to [`LoggingUnhandledSink`].
    #[must_use]
    pub fn unhandled_sink(mut self, sink: impl UnhandledSink + 'static) -> Self {
        self.unhandled = Some(Arc::new(sink));
        self
    }

    /// Build the bus.
    ///
    /// # Errors
    ///
    /// [`BusError::NoRuntime`] if no runtime was given and the caller is not
    /// inside one.
    pub fn build(self) -> BusResult<AdaptableBus> {
        let scheduler = match self.runtime {
            Some(handle) => TimeoutScheduler::new(handle),
            None => TimeoutScheduler::current()?,
        };
        let unhandled = self
            .unhandled
            .unwrap_or_else(|| Arc::new(LoggingUnhandledSink::new(self.config.clone())));
        let parser = self
            .parser
            .unwrap_or_else(|| Arc::new(JsonAdaptableParser));

        debug!(bus = %self.config.name, "Adaptable bus created");

        Ok(AdaptableBus {
            inner: Arc::new(BusInner {
                config: self.config,
                string_classifiers: RwLock::new(ClassifierChain::new()),
                adaptable_classifiers: RwLock::new(ClassifierChain::new()),
                registry: Mutex::new(Registry::default()),
                dispatch: ReentrantMutex::new(()),
                scheduler,
                parser,
                unhandled,
                stats: BusStats::default(),
            }),
        })
    }
}

/// Classification and dispatch bus for inbound protocol frames.
///
/// Cloning is cheap; all clones share one subscription table.
#[derive(Clone)]
pub struct AdaptableBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    config: BusConfig,
    string_classifiers: RwLock<ClassifierChain<str>>,
    adaptable_classifiers: RwLock<ClassifierChain<Adaptable>>,
    registry: Mutex<Registry>,
    dispatch: ReentrantMutex<()>,
    scheduler: TimeoutScheduler,
    parser: Arc<dyn AdaptableParser>,
    unhandled: Arc<dyn UnhandledSink>,
    stats: BusStats,
}

impl AdaptableBus {
    /// Bus with default parser and sink on the current runtime.
    ///
    /// # Errors
    ///
    /// [`BusError::NoRuntime`] outside of a tokio runtime.
    pub fn new(config: BusConfig) -> BusResult<Self> {
        Self::builder().config(config).build()
    }

    #[must_use]
    pub fn builder() -> AdaptableBusBuilder {
        AdaptableBusBuilder::new()
    }

    // -------------------------------------------------------------------------
    // Classifiers
    // -------------------------------------------------------------------------

    /// Append a text frame classifier. Earlier classifiers take precedence.
    pub fn add_string_classifier(&self, classifier: impl Classifier<str> + 'static) -> &Self {
        self.inner.string_classifiers.write().push(Arc::new(classifier));
        self
    }

    /// Append an adaptable classifier. Earlier classifiers take precedence.
    pub fn add_adaptable_classifier(
        &self,
        classifier: impl Classifier<Adaptable> + 'static,
    ) -> &Self {
        self.inner
            .adaptable_classifiers
            .write()
            .push(Arc::new(classifier));
        self
    }

    // -------------------------------------------------------------------------
    // One-time subscriptions
    // -------------------------------------------------------------------------

    /// Wait for the next text frame classified as `tag`.
    ///
    /// The future fails with [`BusError::Timeout`] if nothing matches within
    /// `timeout`.
    pub fn subscribe_once_for_string(
        &self,
        tag: Classification,
        timeout: Duration,
    ) -> OneTimeSubscription<String> {
        let _dispatch = self.inner.dispatch.lock();
        self.inner
            .subscribe_once(tag, timeout, SubscriptionKind::OnceString, Registry::insert_once_string)
    }

    /// Wait for the next adaptable classified as `tag`.
    pub fn subscribe_once_for_adaptable(
        &self,
        tag: Classification,
        timeout: Duration,
    ) -> OneTimeSubscription<Adaptable> {
        let _dispatch = self.inner.dispatch.lock();
        self.inner.subscribe_once(
            tag,
            timeout,
            SubscriptionKind::OnceAdaptable,
            Registry::insert_once_adaptable,
        )
    }

    // -------------------------------------------------------------------------
    // Durable subscriptions
    // -------------------------------------------------------------------------

    /// Invoke `consumer` for every adaptable classified as `tag` until
    /// unsubscribed.
    pub fn subscribe_for_adaptable<F>(&self, tag: Classification, consumer: F) -> SubscriptionId
    where
        F: Fn(&Adaptable) + Send + Sync + 'static,
    {
        let id = SubscriptionId::generate();
        let _dispatch = self.inner.dispatch.lock();
        self.inner
            .insert_durable(id, tag, SubscriptionKind::Persistent, Arc::new(consumer));
        id
    }

    /// Remove every existing subscription, then subscribe like
    /// [`AdaptableBus::subscribe_for_adaptable`].
    ///
    /// Pending one-time subscriptions fail with [`BusError::Evicted`].
    /// Timed subscriptions are dropped without their timeout callback.
    pub fn subscribe_for_adaptable_exclusively<F>(
        &self,
        tag: Classification,
        consumer: F,
    ) -> SubscriptionId
    where
        F: Fn(&Adaptable) + Send + Sync + 'static,
    {
        let id = SubscriptionId::generate();
        let _dispatch = self.inner.dispatch.lock();
        let evicted = {
            let mut registry = self.inner.registry.lock();
            let evicted = registry.drain();
            registry.insert_persistent(
                tag.clone(),
                PersistentEntry {
                    id,
                    kind: SubscriptionKind::Exclusive,
                    consumer: Arc::new(consumer),
                    idle: None,
                },
            );
            evicted
        };

        debug!(
            bus = %self.inner.config.name,
            subscription = %id,
            tag = %tag,
            evicted = evicted.len(),
            "Exclusive subscription registered"
        );

        for removed in evicted {
            trace!(subscription = %removed.id(), by = %id, "Subscription evicted");
            self.inner.discard(removed, BusError::Evicted { by: id });
        }
        id
    }

    /// Durable subscription that ends on its own.
    ///
    /// Every matching adaptable resets an idle timer of `timeout`. If the
    /// timer expires, the subscription is removed and `on_timeout` receives
    /// [`BusError::IdleTimeout`]. A matching adaptable for which
    /// `is_terminal` returns `true` removes the subscription without calling
    /// `consumer` or `on_timeout`.
    ///
    /// # Errors
    ///
    /// [`BusError::SchedulerShutdown`] after [`AdaptableBus::shutdown_executor`].
    pub fn subscribe_for_adaptable_with_timeout<C, P, T>(
        &self,
        tag: Classification,
        timeout: Duration,
        consumer: C,
        is_terminal: P,
        on_timeout: T,
    ) -> BusResult<SubscriptionId>
    where
        C: Fn(&Adaptable) + Send + Sync + 'static,
        P: Fn(&Adaptable) -> bool + Send + Sync + 'static,
        T: FnOnce(BusError) + Send + 'static,
    {
        let id = SubscriptionId::generate();
        let _dispatch = self.inner.dispatch.lock();
        let mut registry = self.inner.registry.lock();
        let timer = self
            .inner
            .scheduler
            .schedule(timeout, self.inner.idle_timeout_task(id, 0))?;
        registry.insert_persistent(
            tag.clone(),
            PersistentEntry {
                id,
                kind: SubscriptionKind::Timed,
                consumer: Arc::new(consumer),
                idle: Some(IdleTimeout {
                    tag: tag.clone(),
                    timeout,
                    is_terminal: Arc::new(is_terminal),
                    on_timeout: Some(Box::new(on_timeout)),
                    timer: Some(timer),
                    generation: 0,
                }),
            },
        );
        drop(registry);

        debug!(
            bus = %self.inner.config.name,
            subscription = %id,
            tag = %tag,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "Timed subscription registered"
        );
        Ok(id)
    }

    /// Durable subscription delivered through a stream.
    ///
    /// The stream ends when the subscription is removed. Dropping the stream
    /// removes the subscription on the next matching adaptable.
    pub fn subscribe_for_adaptable_stream(&self, tag: Classification) -> AdaptableStream {
        let id = SubscriptionId::generate();
        let (sender, receiver) = mpsc::unbounded_channel();
        let bus = Arc::downgrade(&self.inner);
        let consumer = move |adaptable: &Adaptable| {
            if sender.send(adaptable.clone()).is_err() {
                if let Some(inner) = bus.upgrade() {
                    inner.registry.lock().remove(&id);
                    debug!(bus = %inner.config.name, subscription = %id, "Stream dropped, unsubscribed");
                }
            }
        };

        let _dispatch = self.inner.dispatch.lock();
        self.inner
            .insert_durable(id, tag, SubscriptionKind::Persistent, Arc::new(consumer));
        AdaptableStream::new(id, receiver)
    }

    /// Remove a subscription of any kind. Returns whether this call removed
    /// it; a one-time subscription that already resolved or timed out is not
    /// affected.
    ///
    /// A removed one-time subscription fails with [`BusError::Unsubscribed`].
    pub fn unsubscribe<'a>(&self, id: impl Into<Option<&'a SubscriptionId>>) -> bool {
        let Some(id) = id.into() else {
            return false;
        };
        let _dispatch = self.inner.dispatch.lock();
        let removed = self.inner.registry.lock().remove(id);
        match removed {
            Some(removed) => {
                let effective = self.inner.discard(removed, BusError::Unsubscribed);
                debug!(bus = %self.inner.config.name, subscription = %id, effective, "Unsubscribed");
                effective
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Dispatch one inbound frame. Consumers run on the calling thread.
    pub fn publish(&self, raw: &str) {
        self.inner.publish(raw);
    }

    // -------------------------------------------------------------------------
    // Scheduler
    // -------------------------------------------------------------------------

    /// The scheduler backing every timeout of this bus.
    #[must_use]
    pub fn scheduled_executor(&self) -> &TimeoutScheduler {
        &self.inner.scheduler
    }

    /// Stop the timeout scheduler.
    ///
    /// Pending one-time subscriptions fail with
    /// [`BusError::SchedulerShutdown`], timed subscriptions are removed and
    /// their `on_timeout` receives the same error. Plain durable
    /// subscriptions keep working; new one-time and timed subscriptions fail
    /// immediately.
    pub fn shutdown_executor(&self) {
        let _dispatch = self.inner.dispatch.lock();
        let cancelled = self.inner.scheduler.shutdown();
        let orphaned = self
            .inner
            .registry
            .lock()
            .remove_kinds(|kind| kind.is_one_time() || kind == SubscriptionKind::Timed);

        debug!(
            bus = %self.inner.config.name,
            cancelled,
            orphaned = orphaned.len(),
            "Bus executor shut down"
        );

        for removed in orphaned {
            match removed {
                Removed::Persistent(mut entry) => {
                    if let Some(on_timeout) = entry.idle.as_mut().and_then(|idle| idle.on_timeout.take()) {
                        on_timeout(BusError::SchedulerShutdown);
                    }
                }
                waiter => {
                    self.inner.discard(waiter, BusError::SchedulerShutdown);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn stats(&self) -> BusStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Number of live subscriptions of all kinds.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.registry.lock().len()
    }

    #[must_use]
    pub fn is_subscribed(&self, id: &SubscriptionId) -> bool {
        self.inner.registry.lock().contains(id)
    }

    #[must_use]
    pub fn subscription_kind(&self, id: &SubscriptionId) -> Option<SubscriptionKind> {
        self.inner.registry.lock().kind_of(id)
    }
}

impl FramePublisher for AdaptableBus {
    fn publish(&self, raw: &str) {
        self.inner.publish(raw);
    }

    fn frames_published(&self) -> u64 {
        self.inner.stats.snapshot().published
    }
}

impl std::fmt::Debug for AdaptableBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptableBus")
            .field("name", &self.inner.config.name)
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}

impl BusInner {
    fn publish(self: &Arc<Self>, raw: &str) {
        let _dispatch = self.dispatch.lock();
        self.stats.record_published();
        trace!(bus = %self.config.name, frame = self.config.preview(raw), "Publishing frame");

        let string_tag = self.string_classifiers.read().classify(raw);
        if let Some(tag) = string_tag {
            if self.resolve_once_string(&tag, raw) {
                return;
            }
        }

        let adaptable = match self.parser.parse(raw) {
            Ok(adaptable) => adaptable,
            Err(error) => {
                self.route_unhandled(raw, UnhandledReason::ParseFailed(error));
                return;
            }
        };

        let tag = self.adaptable_classifiers.read().classify(&adaptable);
        let Some(tag) = tag else {
            self.route_unhandled(raw, UnhandledReason::Unclassified);
            return;
        };

        let Some(adaptable) = self.resolve_once_adaptable(&tag, adaptable) else {
            return;
        };

        if !self.deliver_durable(&tag, &adaptable) {
            self.route_unhandled(raw, UnhandledReason::NoSubscriber(tag));
        }
    }

    fn route_unhandled(&self, raw: &str, reason: UnhandledReason) {
        self.stats.record_unhandled();
        self.unhandled.unhandled(raw, &reason);
    }

    /// Returns whether a waiter took the frame.
    fn resolve_once_string(&self, tag: &Classification, raw: &str) -> bool {
        loop {
            let waiter = self.registry.lock().take_once_string(tag);
            let Some(waiter) = waiter else {
                return false;
            };
            // A failed resolve means the timeout claimed the waiter between
            // the lookup and here; try the next one.
            if waiter.cell.resolve(raw.to_string()).is_ok() {
                self.stats.record_string_resolution();
                debug!(bus = %self.config.name, subscription = %waiter.id, tag = %tag, "Resolved one-time string subscription");
                return true;
            }
        }
    }

    /// Hands the adaptable back if no waiter took it.
    fn resolve_once_adaptable(&self, tag: &Classification, adaptable: Adaptable) -> Option<Adaptable> {
        let mut adaptable = adaptable;
        loop {
            let waiter = self.registry.lock().take_once_adaptable(tag);
            let Some(waiter) = waiter else {
                return Some(adaptable);
            };
            match waiter.cell.resolve(adaptable) {
                Ok(()) => {
                    self.stats.record_adaptable_resolution();
                    debug!(bus = %self.config.name, subscription = %waiter.id, tag = %tag, "Resolved one-time adaptable subscription");
                    return None;
                }
                Err(returned) => adaptable = returned,
            }
        }
    }

    /// Returns whether any durable subscription exists for `tag`.
    fn deliver_durable(self: &Arc<Self>, tag: &Classification, adaptable: &Adaptable) -> bool {
        let deliveries = self.registry.lock().deliveries(tag);
        if deliveries.is_empty() {
            return false;
        }

        for delivery in deliveries {
            // An earlier consumer may have removed this one.
            let deliver = match &delivery.is_terminal {
                None => self.registry.lock().contains(&delivery.id),
                Some(is_terminal) => {
                    let terminal = is_terminal(adaptable);
                    self.touch_timed(delivery.id, terminal)
                }
            };
            if deliver {
                self.stats.record_persistent_delivery();
                (delivery.consumer)(adaptable);
            }
        }
        true
    }

    /// Reset the idle timer of a timed subscription, or remove it on a
    /// terminal message. Returns whether the consumer should run.
    fn touch_timed(self: &Arc<Self>, id: SubscriptionId, terminal: bool) -> bool {
        let mut registry = self.registry.lock();
        if terminal {
            let removed = registry.remove(&id);
            drop(registry);
            if removed.is_some() {
                debug!(bus = %self.config.name, subscription = %id, "Timed subscription received terminal message");
            }
            return false;
        }

        let Some(idle) = registry
            .persistent_mut(&id)
            .and_then(|entry| entry.idle.as_mut())
        else {
            return false;
        };
        if let Some(timer) = idle.timer.take() {
            timer.cancel();
        }
        idle.generation += 1;
        match self
            .scheduler
            .schedule(idle.timeout, self.idle_timeout_task(id, idle.generation))
        {
            Ok(timer) => idle.timer = Some(timer),
            Err(error) => {
                warn!(bus = %self.config.name, subscription = %id, %error, "Could not reset idle timeout");
            }
        }
        true
    }

    fn subscribe_once<T>(
        self: &Arc<Self>,
        tag: Classification,
        timeout: Duration,
        kind: SubscriptionKind,
        insert: fn(&mut Registry, Classification, Waiter<T>),
    ) -> OneTimeSubscription<T>
    where
        T: Send + 'static,
    {
        let id = SubscriptionId::generate();
        let (sender, receiver) = oneshot::channel();
        let cell = Arc::new(ResolutionCell::new(sender));

        let mut registry = self.registry.lock();
        let task = self.once_timeout_task(id, tag.clone(), timeout, Arc::clone(&cell));
        let timer = match self.scheduler.schedule(timeout, task) {
            Ok(timer) => timer,
            Err(error) => return OneTimeSubscription::failed(id, error),
        };
        insert(
            &mut registry,
            tag.clone(),
            Waiter {
                id,
                cell,
                timer: Some(timer),
            },
        );
        drop(registry);

        debug!(
            bus = %self.config.name,
            subscription = %id,
            ?kind,
            tag = %tag,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "One-time subscription registered"
        );
        OneTimeSubscription::new(id, receiver)
    }

    fn once_timeout_task<T>(
        self: &Arc<Self>,
        id: SubscriptionId,
        tag: Classification,
        timeout: Duration,
        cell: Arc<ResolutionCell<T>>,
    ) -> impl FnOnce() + Send + 'static
    where
        T: Send + 'static,
    {
        let bus = Arc::downgrade(self);
        move || {
            // Out of the table first, so nobody can pick the waiter up once
            // its future has failed.
            let inner = bus.upgrade();
            if let Some(inner) = &inner {
                inner.registry.lock().remove(&id);
            }
            let error = BusError::Timeout {
                tag: tag.clone(),
                timeout,
            };
            if !cell.fail(Resolution::TimedOut, error) {
                return;
            }
            if let Some(inner) = inner {
                inner.stats.record_timeout();
                debug!(bus = %inner.config.name, subscription = %id, tag = %tag, "One-time subscription timed out");
            }
        }
    }

    fn idle_timeout_task(
        self: &Arc<Self>,
        id: SubscriptionId,
        generation: u64,
    ) -> impl FnOnce() + Send + 'static {
        let bus = Arc::downgrade(self);
        move || {
            let Some(inner) = bus.upgrade() else {
                return;
            };
            let expired = {
                let mut registry = inner.registry.lock();
                let current = registry
                    .persistent_mut(&id)
                    .and_then(|entry| entry.idle.as_ref())
                    .map(|idle| idle.generation);
                if current != Some(generation) {
                    return;
                }
                registry.remove(&id)
            };

            let Some(Removed::Persistent(mut entry)) = expired else {
                return;
            };
            let Some(idle) = entry.idle.as_mut() else {
                return;
            };
            inner.stats.record_timeout();
            debug!(bus = %inner.config.name, subscription = %id, tag = %idle.tag, "Timed subscription idle, removed");
            if let Some(on_timeout) = idle.on_timeout.take() {
                on_timeout(BusError::IdleTimeout {
                    id,
                    tag: idle.tag.clone(),
                    timeout: idle.timeout,
                });
            }
        }
    }

    fn insert_durable(
        &self,
        id: SubscriptionId,
        tag: Classification,
        kind: SubscriptionKind,
        consumer: AdaptableConsumer,
    ) {
        debug!(bus = %self.config.name, subscription = %id, ?kind, tag = %tag, "Durable subscription registered");
        self.registry.lock().insert_persistent(
            tag,
            PersistentEntry {
                id,
                kind,
                consumer,
                idle: None,
            },
        );
    }

    /// Settle a subscription taken out of the table. Returns whether the
    /// removal took effect, i.e. a one-time subscription was still pending.
    fn discard(&self, removed: Removed, error: BusError) -> bool {
        match removed {
            Removed::OnceString(waiter) => waiter.cell.fail(Resolution::Cancelled, error),
            Removed::OnceAdaptable(waiter) => waiter.cell.fail(Resolution::Cancelled, error),
            Removed::Persistent(_) => true,
        }
    }
}
