//! # Subscription Registry
//!
//! The subscription table of one bus, keyed by classification and by id.
//! Not synchronized itself: the bus guards it with a mutex and never calls
//! consumer code while holding it.
//!
//! One-time waiters for the same classification are served first-in,
//! first-out. Durable subscriptions for the same classification are all
//! invoked, in registration order.

use crate::classifier::Classification;
use crate::error::BusError;
use crate::scheduler::ScheduledTask;
use crate::subscription::{ResolutionCell, SubscriptionId, SubscriptionKind};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use twin_types::Adaptable;

pub(crate) type AdaptableConsumer = Arc<dyn Fn(&Adaptable) + Send + Sync>;
pub(crate) type TerminationPredicate = Arc<dyn Fn(&Adaptable) -> bool + Send + Sync>;
pub(crate) type TimeoutCallback = Box<dyn FnOnce(BusError) + Send>;

/// A pending one-time subscription.
pub(crate) struct Waiter<T> {
    pub(crate) id: SubscriptionId,
    pub(crate) cell: Arc<ResolutionCell<T>>,
    pub(crate) timer: Option<ScheduledTask>,
}

impl<T> Waiter<T> {
    fn cancel_timer(&self) {
        if let Some(timer) = &self.timer {
            timer.cancel();
        }
    }
}

/// Idle-timeout bookkeeping of a timed subscription.
pub(crate) struct IdleTimeout {
    pub(crate) tag: Classification,
    pub(crate) timeout: Duration,
    pub(crate) is_terminal: TerminationPredicate,
    pub(crate) on_timeout: Option<TimeoutCallback>,
    pub(crate) timer: Option<ScheduledTask>,
    /// Bumped on every reset so a stale timer recognizes itself.
    pub(crate) generation: u64,
}

/// A durable subscription.
pub(crate) struct PersistentEntry {
    pub(crate) id: SubscriptionId,
    pub(crate) kind: SubscriptionKind,
    pub(crate) consumer: AdaptableConsumer,
    pub(crate) idle: Option<IdleTimeout>,
}

impl PersistentEntry {
    fn cancel_timer(&self) {
        if let Some(timer) = self.idle.as_ref().and_then(|idle| idle.timer.as_ref()) {
            timer.cancel();
        }
    }
}

/// Consumer snapshot taken for one dispatch.
#[derive(Clone)]
pub(crate) struct Delivery {
    pub(crate) id: SubscriptionId,
    pub(crate) consumer: AdaptableConsumer,
    pub(crate) is_terminal: Option<TerminationPredicate>,
}

/// A subscription taken out of the table. Timers are already cancelled.
pub(crate) enum Removed {
    OnceString(Waiter<String>),
    OnceAdaptable(Waiter<Adaptable>),
    Persistent(PersistentEntry),
}

impl Removed {
    pub(crate) fn id(&self) -> SubscriptionId {
        match self {
            Removed::OnceString(waiter) => waiter.id,
            Removed::OnceAdaptable(waiter) => waiter.id,
            Removed::Persistent(entry) => entry.id,
        }
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    once_strings: HashMap<Classification, VecDeque<Waiter<String>>>,
    once_adaptables: HashMap<Classification, VecDeque<Waiter<Adaptable>>>,
    persistent: HashMap<Classification, Vec<PersistentEntry>>,
    index: HashMap<SubscriptionId, (Classification, SubscriptionKind)>,
}

impl Registry {
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn contains(&self, id: &SubscriptionId) -> bool {
        self.index.contains_key(id)
    }

    pub(crate) fn kind_of(&self, id: &SubscriptionId) -> Option<SubscriptionKind> {
        self.index.get(id).map(|(_, kind)| *kind)
    }

    // -------------------------------------------------------------------------
    // Insertion
    // -------------------------------------------------------------------------

    pub(crate) fn insert_once_string(&mut self, tag: Classification, waiter: Waiter<String>) {
        self.index
            .insert(waiter.id, (tag.clone(), SubscriptionKind::OnceString));
        self.once_strings.entry(tag).or_default().push_back(waiter);
    }

    pub(crate) fn insert_once_adaptable(&mut self, tag: Classification, waiter: Waiter<Adaptable>) {
        self.index
            .insert(waiter.id, (tag.clone(), SubscriptionKind::OnceAdaptable));
        self.once_adaptables.entry(tag).or_default().push_back(waiter);
    }

    pub(crate) fn insert_persistent(&mut self, tag: Classification, entry: PersistentEntry) {
        self.index.insert(entry.id, (tag.clone(), entry.kind));
        self.persistent.entry(tag).or_default().push(entry);
    }

    // -------------------------------------------------------------------------
    // Lookup for dispatch
    // -------------------------------------------------------------------------

    /// Oldest live string waiter for `tag`, removed from the table.
    /// Waiters whose future was dropped are discarded on the way.
    pub(crate) fn take_once_string(&mut self, tag: &Classification) -> Option<Waiter<String>> {
        take_live_waiter(&mut self.once_strings, &mut self.index, tag)
    }

    /// Oldest live adaptable waiter for `tag`, removed from the table.
    pub(crate) fn take_once_adaptable(&mut self, tag: &Classification) -> Option<Waiter<Adaptable>> {
        take_live_waiter(&mut self.once_adaptables, &mut self.index, tag)
    }

    /// Durable consumers for `tag` in registration order.
    pub(crate) fn deliveries(&self, tag: &Classification) -> Vec<Delivery> {
        self.persistent
            .get(tag)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| Delivery {
                        id: entry.id,
                        consumer: Arc::clone(&entry.consumer),
                        is_terminal: entry
                            .idle
                            .as_ref()
                            .map(|idle| Arc::clone(&idle.is_terminal)),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn persistent_mut(&mut self, id: &SubscriptionId) -> Option<&mut PersistentEntry> {
        let (tag, _) = self.index.get(id)?;
        self.persistent
            .get_mut(tag)?
            .iter_mut()
            .find(|entry| entry.id == *id)
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Remove one subscription and cancel its timer.
    pub(crate) fn remove(&mut self, id: &SubscriptionId) -> Option<Removed> {
        let (tag, kind) = self.index.remove(id)?;
        match kind {
            SubscriptionKind::OnceString => {
                remove_waiter(&mut self.once_strings, &tag, id).map(Removed::OnceString)
            }
            SubscriptionKind::OnceAdaptable => {
                remove_waiter(&mut self.once_adaptables, &tag, id).map(Removed::OnceAdaptable)
            }
            SubscriptionKind::Persistent | SubscriptionKind::Exclusive | SubscriptionKind::Timed => {
                let entries = self.persistent.get_mut(&tag)?;
                let position = entries.iter().position(|entry| entry.id == *id)?;
                let entry = entries.remove(position);
                if entries.is_empty() {
                    self.persistent.remove(&tag);
                }
                entry.cancel_timer();
                Some(Removed::Persistent(entry))
            }
        }
    }

    /// Remove every subscription of a matching kind, cancelling timers.
    pub(crate) fn remove_kinds(&mut self, matches: impl Fn(SubscriptionKind) -> bool) -> Vec<Removed> {
        let ids: Vec<SubscriptionId> = self
            .index
            .iter()
            .filter(|(_, (_, kind))| matches(*kind))
            .map(|(id, _)| *id)
            .collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Remove everything, cancelling all timers.
    pub(crate) fn drain(&mut self) -> Vec<Removed> {
        self.index.clear();
        let mut removed = Vec::new();
        for (_, waiters) in self.once_strings.drain() {
            for waiter in waiters {
                waiter.cancel_timer();
                removed.push(Removed::OnceString(waiter));
            }
        }
        for (_, waiters) in self.once_adaptables.drain() {
            for waiter in waiters {
                waiter.cancel_timer();
                removed.push(Removed::OnceAdaptable(waiter));
            }
        }
        for (_, entries) in self.persistent.drain() {
            for entry in entries {
                entry.cancel_timer();
                removed.push(Removed::Persistent(entry));
            }
        }
        removed
    }
}

fn take_live_waiter<T>(
    table: &mut HashMap<Classification, VecDeque<Waiter<T>>>,
    index: &mut HashMap<SubscriptionId, (Classification, SubscriptionKind)>,
    tag: &Classification,
) -> Option<Waiter<T>> {
    let waiters = table.get_mut(tag)?;
    let mut found = None;
    while let Some(waiter) = waiters.pop_front() {
        index.remove(&waiter.id);
        waiter.cancel_timer();
        if !waiter.cell.is_abandoned() {
            found = Some(waiter);
            break;
        }
    }
    if waiters.is_empty() {
        table.remove(tag);
    }
    found
}

fn remove_waiter<T>(
    table: &mut HashMap<Classification, VecDeque<Waiter<T>>>,
    tag: &Classification,
    id: &SubscriptionId,
) -> Option<Waiter<T>> {
    let waiters = table.get_mut(tag)?;
    let position = waiters.iter().position(|waiter| waiter.id == *id)?;
    let waiter = waiters.remove(position)?;
    if waiters.is_empty() {
        table.remove(tag);
    }
    waiter.cancel_timer();
    Some(waiter)
}
