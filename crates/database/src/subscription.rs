use crate::query::TradeQuery;
use core_types::{Trade, UserId};
use futures::Stream;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;

type Slots = Arc<Mutex<HashMap<u64, Slot>>>;

#[derive(Debug)]
struct Slot {
    query: TradeQuery,
    sender: watch::Sender<Vec<Trade>>,
}

/// The set of live subscriptions a repository pushes snapshots to.
#[derive(Debug, Default, Clone)]
pub(crate) struct SubscriberRegistry {
    slots: Slots,
    next_id: Arc<AtomicU64>,
}

impl SubscriberRegistry {
    pub(crate) fn register(&self, query: TradeQuery, initial: Vec<Trade>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = watch::channel(initial);
        self.slots.lock().insert(
            id,
            Slot {
                query: query.clone(),
                sender,
            },
        );
        tracing::debug!(subscription = id, user = %query.user_id, "Subscription registered.");

        Subscription {
            id,
            query,
            receiver,
            delivered_initial: false,
            slots: Arc::downgrade(&self.slots),
        }
    }

    /// Live subscriptions whose results a write by `user_id` may change.
    pub(crate) fn queries_for(&self, user_id: &UserId) -> Vec<(u64, TradeQuery)> {
        self.slots
            .lock()
            .iter()
            .filter(|(_, slot)| &slot.query.user_id == user_id)
            .map(|(id, slot)| (*id, slot.query.clone()))
            .collect()
    }

    pub(crate) fn publish(&self, id: u64, snapshot: Vec<Trade>) {
        if let Some(slot) = self.slots.lock().get(&id) {
            slot.sender.send_replace(snapshot);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

/// A live view of a query: the full matching collection on subscribe and
/// again after every change.
///
/// The consumer owns the subscription. Dropping it deregisters it from the
/// repository. Snapshots that arrive faster than they are read are coalesced,
/// so a slow reader always sees the latest state rather than every step.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    query: TradeQuery,
    receiver: watch::Receiver<Vec<Trade>>,
    delivered_initial: bool,
    slots: Weak<Mutex<HashMap<u64, Slot>>>,
}

impl Subscription {
    pub fn query(&self) -> &TradeQuery {
        &self.query
    }

    /// The most recent snapshot, without waiting.
    pub fn current(&self) -> Vec<Trade> {
        self.receiver.borrow().clone()
    }

    /// Waits for the next snapshot. The first call returns the initial one
    /// immediately. Returns `None` once the repository has gone away.
    pub async fn next_snapshot(&mut self) -> Option<Vec<Trade>> {
        if !self.delivered_initial {
            self.delivered_initial = true;
            return Some(self.receiver.borrow_and_update().clone());
        }
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    pub fn into_stream(self) -> impl Stream<Item = Vec<Trade>> {
        futures::stream::unfold(self, |mut subscription| async move {
            let snapshot = subscription.next_snapshot().await?;
            Some((snapshot, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            slots.lock().remove(&self.id);
            tracing::debug!(subscription = self.id, "Subscription released.");
        }
    }
}
