use crate::DbError;
use crate::query::TradeQuery;
use crate::subscription::Subscription;
use async_trait::async_trait;
use core_types::{NewTrade, Trade, TradeId, TradeUpdate, UserId};

/// The storage collaborator the journal writes through.
///
/// Every read and write is scoped to a user: a record owned by someone else
/// is reported as `DbError::NotFound`. Implementations assign ids and
/// timestamps and enforce the trade lifecycle atomically with the write.
#[async_trait]
pub trait TradeRepository: Send + Sync {
    /// Stores a new active trade and returns it with its assigned id.
    async fn insert(&self, trade: NewTrade) -> Result<Trade, DbError>;

    /// Merges `update` into the user's trade `id`.
    ///
    /// Fails with `DbError::Rejected` and leaves the record unchanged when the
    /// trade is already closed.
    async fn update(
        &self,
        user_id: &UserId,
        id: TradeId,
        update: TradeUpdate,
    ) -> Result<Trade, DbError>;

    async fn get(&self, user_id: &UserId, id: TradeId) -> Result<Trade, DbError>;

    async fn list(&self, query: &TradeQuery) -> Result<Vec<Trade>, DbError>;

    /// Opens a live view of `query`. See `Subscription`.
    async fn subscribe(&self, query: TradeQuery) -> Result<Subscription, DbError>;
}
