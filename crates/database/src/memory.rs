use crate::DbError;
use crate::query::TradeQuery;
use crate::repository::TradeRepository;
use crate::subscription::{SubscriberRegistry, Subscription};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{NewTrade, Trade, TradeId, TradeUpdate, UserId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A process-local trade store.
///
/// Writes and snapshot publication happen under the same lock, so
/// subscribers observe snapshots in write order.
#[derive(Debug, Default, Clone)]
pub struct MemoryRepository {
    trades: Arc<RwLock<HashMap<TradeId, Trade>>>,
    subscribers: SubscriberRegistry,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions, mostly useful in tests.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn snapshot(trades: &HashMap<TradeId, Trade>, query: &TradeQuery) -> Vec<Trade> {
        let mut selected: Vec<Trade> = trades
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        query.arrange(&mut selected);
        selected
    }

    fn publish(&self, trades: &HashMap<TradeId, Trade>, user_id: &UserId) {
        for (id, query) in self.subscribers.queries_for(user_id) {
            self.subscribers.publish(id, Self::snapshot(trades, &query));
        }
    }
}

#[async_trait]
impl TradeRepository for MemoryRepository {
    async fn insert(&self, new_trade: NewTrade) -> Result<Trade, DbError> {
        let mut trades = self.trades.write();
        let trade = Trade::open(TradeId::new_v4(), new_trade, Utc::now());
        trades.insert(trade.id, trade.clone());
        self.publish(&trades, &trade.user_id);
        Ok(trade)
    }

    async fn update(
        &self,
        user_id: &UserId,
        id: TradeId,
        update: TradeUpdate,
    ) -> Result<Trade, DbError> {
        let mut trades = self.trades.write();
        let trade = trades
            .get_mut(&id)
            .filter(|t| &t.user_id == user_id)
            .ok_or(DbError::NotFound)?;
        trade.apply(update, Utc::now())?;
        let updated = trade.clone();
        self.publish(&trades, user_id);
        Ok(updated)
    }

    async fn get(&self, user_id: &UserId, id: TradeId) -> Result<Trade, DbError> {
        self.trades
            .read()
            .get(&id)
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .ok_or(DbError::NotFound)
    }

    async fn list(&self, query: &TradeQuery) -> Result<Vec<Trade>, DbError> {
        Ok(Self::snapshot(&self.trades.read(), query))
    }

    async fn subscribe(&self, query: TradeQuery) -> Result<Subscription, DbError> {
        let trades = self.trades.read();
        let initial = Self::snapshot(&trades, &query);
        Ok(self.subscribers.register(query, initial))
    }
}
