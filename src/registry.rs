//! Correlation Registry
//!
//! Associates call identifiers with pending waiters and fires them when a
//! matching response arrives.
//!
//! ## Waiter Kinds
//! - **Once**: capacity-1 channel, removed after the first delivery (or when
//!   its deadline passes and the dispatcher sweeps it)
//! - **Subscription**: unbounded channel, fires on every matching response,
//!   removed by [`Registry::unsubscribe`] or once its receiver is dropped
//!
//! ## Locking
//! One mutex guards both maps. It is held only while the maps are read or
//! changed; envelopes are delivered after it is released. Delivery never
//! blocks: a once channel receives at most one message and subscription
//! channels are unbounded.

use std::collections::HashMap;
use std::time::Instant;

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::protocol::{CallId, ResponseEnvelope};

/// A one-shot waiter
struct OnceWaiter {
    tx: Sender<ResponseEnvelope>,
    expires_at: Option<Instant>,
}

#[derive(Default)]
struct Waiters {
    once: HashMap<CallId, Vec<OnceWaiter>>,
    subscriptions: HashMap<CallId, Vec<Sender<ResponseEnvelope>>>,
}

/// Maps call identifiers to the waiters expecting their replies
#[derive(Default)]
pub struct Registry {
    waiters: Mutex<Waiters>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a one-shot waiter for `id`
    ///
    /// `expires_at` bounds how long the waiter is kept if no reply arrives;
    /// `None` keeps it until a reply does.
    pub fn register_once(&self, id: CallId, expires_at: Option<Instant>) -> Receiver<ResponseEnvelope> {
        let (tx, rx) = channel::bounded(1);
        self.waiters
            .lock()
            .once
            .entry(id)
            .or_default()
            .push(OnceWaiter { tx, expires_at });
        rx
    }

    /// Register a persistent waiter for `id`
    pub fn register_subscription(&self, id: CallId) -> Receiver<ResponseEnvelope> {
        let (tx, rx) = channel::unbounded();
        self.waiters
            .lock()
            .subscriptions
            .entry(id)
            .or_default()
            .push(tx);
        rx
    }

    /// Remove every persistent waiter for `id`
    pub fn unsubscribe(&self, id: &CallId) -> bool {
        self.waiters.lock().subscriptions.remove(id).is_some()
    }

    /// Deliver `envelope` to every waiter registered under its id
    ///
    /// Subscriptions fire first, then once waiters; within each kind the
    /// most recently registered fires first. Returns how many waiters
    /// accepted the envelope; 0 means it was dropped.
    pub fn dispatch(&self, envelope: ResponseEnvelope) -> usize {
        let (subscribers, once) = {
            let mut waiters = self.waiters.lock();
            let subscribers = waiters
                .subscriptions
                .get(&envelope.id)
                .cloned()
                .unwrap_or_default();
            let once = waiters.once.remove(&envelope.id).unwrap_or_default();
            (subscribers, once)
        };

        if subscribers.is_empty() && once.is_empty() {
            tracing::trace!("No waiter for {}, dropping response", envelope.id);
            return 0;
        }

        let mut delivered = 0;
        let mut dropped = Vec::new();
        for tx in subscribers.iter().rev() {
            if tx.send(envelope.clone()).is_ok() {
                delivered += 1;
            } else {
                dropped.push(tx);
            }
        }
        if !dropped.is_empty() {
            self.prune_subscribers(&envelope.id, &dropped);
        }

        // Abandoned once waiters have dropped their receiver; try_send fails harmlessly
        for waiter in once.iter().rev() {
            if waiter.tx.try_send(envelope.clone()).is_ok() {
                delivered += 1;
            }
        }

        delivered
    }

    /// Remove subscribers whose receiver is gone
    fn prune_subscribers(&self, id: &CallId, dropped: &[&Sender<ResponseEnvelope>]) {
        let mut waiters = self.waiters.lock();
        if let Some(list) = waiters.subscriptions.get_mut(id) {
            list.retain(|tx| !dropped.iter().any(|gone| gone.same_channel(tx)));
            if list.is_empty() {
                waiters.subscriptions.remove(id);
            }
        }
        tracing::trace!("Pruned {} closed subscriber(s) for {}", dropped.len(), id);
    }

    /// Drop one-shot waiters whose deadline is at or before `now`
    pub fn evict_expired(&self, now: Instant) -> usize {
        let mut waiters = self.waiters.lock();
        let mut evicted = 0;

        waiters.once.retain(|_, list| {
            let before = list.len();
            list.retain(|w| w.expires_at.map_or(true, |at| at > now));
            evicted += before - list.len();
            !list.is_empty()
        });

        evicted
    }

    /// Number of one-shot waiters still pending
    pub fn pending_once(&self) -> usize {
        self.waiters.lock().once.values().map(Vec::len).sum()
    }

    /// Number of persistent waiters
    pub fn subscriptions(&self) -> usize {
        self.waiters.lock().subscriptions.values().map(Vec::len).sum()
    }

    /// Whether any waiter is registered under `id`
    pub fn contains(&self, id: &CallId) -> bool {
        let waiters = self.waiters.lock();
        waiters.once.contains_key(id) || waiters.subscriptions.contains_key(id)
    }
}
