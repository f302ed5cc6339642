use crate::DbError;
use crate::query::TradeQuery;
use crate::repository::TradeRepository;
use crate::subscription::{SubscriberRegistry, Subscription};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{Indicators, NewTrade, Ratio, Trade, TradeId, TradeUpdate, UserId};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgPool, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::Row;
use std::sync::Arc;
use tokio::sync::Mutex;

const TRADE_COLUMNS: &str = "id, user_id, ticker, direction, timeframe, trade_date, \
    entry_prices, average_entry, quantity, stop_loss, take_profits, risk_reward, cost, \
    leverage, trade_value, notes, indicators, status, exit_price, final_pnl, \
    created_at, updated_at, closed_at";

/// The `PgRepository` stores trades in PostgreSQL.
///
/// Snapshots are pushed to subscribers after each write made through this
/// handle (or a clone of it). Writes through the handle are serialized so
/// snapshots go out in write order.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
    subscribers: SubscriberRegistry,
    write_lock: Arc<Mutex<()>>,
}

impl PgRepository {
    /// Creates a new `PgRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            subscribers: SubscriberRegistry::default(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn fetch(&self, query: &TradeQuery) -> Result<Vec<Trade>, DbError> {
        // The ORDER BY clause comes from a fixed set of constants, never from
        // user input. All values go through bind parameters.
        let sql = format!(
            "SELECT {TRADE_COLUMNS} FROM trades \
             WHERE user_id = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY {}",
            query.order_clause()
        );
        let rows = sqlx::query(&sql)
            .bind(query.user_id.as_str())
            .bind(query.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(trade_from_row).collect()
    }

    async fn publish(&self, user_id: &UserId) {
        for (id, query) in self.subscribers.queries_for(user_id) {
            match self.fetch(&query).await {
                Ok(snapshot) => self.subscribers.publish(id, snapshot),
                Err(e) => {
                    tracing::warn!(error = %e, subscription = id, "Failed to refresh subscription snapshot.")
                }
            }
        }
    }
}

#[async_trait]
impl TradeRepository for PgRepository {
    async fn insert(&self, new_trade: NewTrade) -> Result<Trade, DbError> {
        let _guard = self.write_lock.lock().await;
        let trade = Trade::open(TradeId::new_v4(), new_trade, Utc::now());

        let sql = format!(
            "INSERT INTO trades ({TRADE_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
              $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)"
        );
        bind_trade(sqlx::query(&sql), &trade)
            .execute(&self.pool)
            .await?;

        self.publish(&trade.user_id).await;
        Ok(trade)
    }

    async fn update(
        &self,
        user_id: &UserId,
        id: TradeId,
        update: TradeUpdate,
    ) -> Result<Trade, DbError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT {TRADE_COLUMNS} FROM trades WHERE id = $1 AND user_id = $2 FOR UPDATE"
        );
        let row = sqlx::query(&select)
            .bind(id.0)
            .bind(user_id.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        let mut trade = trade_from_row(&row)?;
        // A rejected transition drops `tx`, which rolls back.
        trade.apply(update, Utc::now())?;

        let write = format!(
            "UPDATE trades SET ({TRADE_COLUMNS}) = \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
              $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23) \
             WHERE id = $1"
        );
        bind_trade(sqlx::query(&write), &trade)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.publish(user_id).await;
        Ok(trade)
    }

    async fn get(&self, user_id: &UserId, id: TradeId) -> Result<Trade, DbError> {
        let sql = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = $1 AND user_id = $2");
        let row = sqlx::query(&sql)
            .bind(id.0)
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;
        trade_from_row(&row)
    }

    async fn list(&self, query: &TradeQuery) -> Result<Vec<Trade>, DbError> {
        self.fetch(query).await
    }

    async fn subscribe(&self, query: TradeQuery) -> Result<Subscription, DbError> {
        let initial = self.fetch(&query).await?;
        Ok(self.subscribers.register(query, initial))
    }
}

/// Binds every column of `trade` in `TRADE_COLUMNS` order.
fn bind_trade<'q>(
    query: Query<'q, Postgres, PgArguments>,
    trade: &'q Trade,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(trade.id.0)
        .bind(trade.user_id.as_str())
        .bind(trade.ticker.as_str())
        .bind(trade.direction.as_str())
        .bind(trade.timeframe.as_str())
        .bind(trade.trade_date)
        .bind(Json(&trade.entry_prices))
        .bind(trade.average_entry)
        .bind(trade.quantity)
        .bind(trade.stop_loss)
        .bind(Json(&trade.take_profits))
        .bind(trade.risk_reward.value())
        .bind(trade.cost)
        .bind(trade.leverage.as_str())
        .bind(trade.trade_value)
        .bind(trade.notes.as_deref())
        .bind(Json(&trade.indicators))
        .bind(trade.status.as_str())
        .bind(trade.exit_price)
        .bind(trade.final_pnl)
        .bind(trade.created_at)
        .bind(trade.updated_at)
        .bind(trade.closed_at)
}

fn trade_from_row(row: &PgRow) -> Result<Trade, DbError> {
    let direction: String = row.try_get("direction")?;
    let timeframe: String = row.try_get("timeframe")?;
    let status: String = row.try_get("status")?;
    let user_id: String = row.try_get("user_id")?;
    let entry_prices: Json<Vec<Decimal>> = row.try_get("entry_prices")?;
    let take_profits: Json<Vec<Decimal>> = row.try_get("take_profits")?;
    let indicators: Json<Indicators> = row.try_get("indicators")?;
    let risk_reward: Option<Decimal> = row.try_get("risk_reward")?;

    Ok(Trade {
        id: TradeId(row.try_get("id")?),
        user_id: UserId::new(user_id),
        ticker: row.try_get("ticker")?,
        direction: direction.parse().map_err(corrupt)?,
        timeframe: timeframe.parse().map_err(corrupt)?,
        trade_date: row.try_get("trade_date")?,
        entry_prices: entry_prices.0,
        average_entry: row.try_get("average_entry")?,
        quantity: row.try_get("quantity")?,
        stop_loss: row.try_get("stop_loss")?,
        take_profits: take_profits.0,
        risk_reward: Ratio::from(risk_reward),
        cost: row.try_get("cost")?,
        leverage: row.try_get("leverage")?,
        trade_value: row.try_get("trade_value")?,
        notes: row.try_get("notes")?,
        indicators: indicators.0,
        status: status.parse().map_err(corrupt)?,
        exit_price: row.try_get("exit_price")?,
        final_pnl: row.try_get("final_pnl")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        closed_at: row.try_get("closed_at")?,
    })
}

fn corrupt(e: core_types::CoreError) -> DbError {
    DbError::Corrupt(e.to_string())
}
