//! # Journal Crate
//!
//! The trade lifecycle service. A `Journal` validates entry forms, derives the
//! save-time fields, drives the one-way `active -> closed` transition and
//! exposes the dashboard and history views over a `TradeRepository`.
//!
//! Every operation takes the `UserContext` it acts for. Nothing here holds
//! session state.

use analytics::{
    AnalyticsEngine, HistoryFilter, HistorySort, HistoryStats, MonthlyProfit, StatsSummary,
    TradeMetrics, history_stats, history_view, parse_price,
};
use chrono::Utc;
use configuration::{Config, JournalSettings};
use core_types::{CoreError, NewTrade, Trade, TradeId, TradeUpdate, UserContext};
use database::{Subscription, TradeQuery, TradeRepository};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

pub mod error;
pub mod form;

pub use error::JournalError;
pub use form::TradeForm;

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub stats: StatsSummary,
    pub monthly: Vec<MonthlyProfit>,
}

/// The closed-trade history as listed, with its summary line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct History {
    pub trades: Vec<Trade>,
    pub stats: HistoryStats,
}

/// An active trade marked against a live price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenPosition {
    pub trade: Trade,
    pub current_price: Option<Decimal>,
    /// 0 when no price is known for the ticker.
    pub unrealized_pnl: Decimal,
}

/// The trade journal service.
#[derive(Clone)]
pub struct Journal {
    repository: Arc<dyn TradeRepository>,
    analytics: AnalyticsEngine,
    defaults: JournalSettings,
}

impl Journal {
    pub fn new(repository: Arc<dyn TradeRepository>, config: &Config) -> Self {
        let analytics = AnalyticsEngine::new()
            .with_monthly_window(config.analytics.monthly_window)
            .with_chronological_months(config.analytics.chronological_months);
        Self {
            repository,
            analytics,
            defaults: config.journal.clone(),
        }
    }

    /// Records a new active trade.
    pub async fn create_trade(
        &self,
        ctx: &UserContext,
        form: TradeForm,
    ) -> Result<Trade, JournalError> {
        let details = form.into_details(&self.defaults, Utc::now().date_naive())?;
        let trade = self
            .repository
            .insert(NewTrade {
                user_id: ctx.user_id().clone(),
                details,
            })
            .await?;

        tracing::info!(
            user = %ctx.user_id(),
            trade = %trade.id,
            ticker = %trade.ticker,
            direction = %trade.direction,
            "Trade created."
        );
        Ok(trade)
    }

    /// Replaces the editable fields of an active trade and re-derives the
    /// save-time values. The trade date is kept when the form leaves it blank.
    pub async fn edit_trade(
        &self,
        ctx: &UserContext,
        id: TradeId,
        form: TradeForm,
    ) -> Result<Trade, JournalError> {
        let current = self.repository.get(ctx.user_id(), id).await?;
        if let Err(e) = current.ensure_active() {
            tracing::warn!(user = %ctx.user_id(), trade = %id, "Rejected edit of a closed trade.");
            return Err(e.into());
        }

        let details = form.into_details(&self.defaults, current.trade_date)?;
        let trade = self
            .repository
            .update(ctx.user_id(), id, TradeUpdate::Details(details))
            .await?;

        tracing::info!(user = %ctx.user_id(), trade = %id, "Trade updated.");
        Ok(trade)
    }

    /// Closes an active trade at `exit_price`, booking its P&L.
    ///
    /// The realized P&L is booked by the store from the record it locks for
    /// the write, exactly once. Closing an already closed trade fails with
    /// `TradeClosed` and leaves the stored result untouched. An exit price
    /// whose P&L does not fit in a `Decimal` is rejected as invalid input.
    pub async fn close_trade(
        &self,
        ctx: &UserContext,
        id: TradeId,
        exit_price: &str,
    ) -> Result<Trade, JournalError> {
        let exit_price = parse_price(exit_price).ok_or_else(|| {
            CoreError::InvalidInput(
                "exit price".to_string(),
                format!("'{}' is not a number", exit_price.trim()),
            )
        })?;

        let current = self.repository.get(ctx.user_id(), id).await?;
        if let Err(e) = current.ensure_active() {
            tracing::warn!(user = %ctx.user_id(), trade = %id, "Rejected close of a closed trade.");
            return Err(e.into());
        }

        let trade = self
            .repository
            .update(ctx.user_id(), id, TradeUpdate::Close { exit_price })
            .await?;

        tracing::info!(
            user = %ctx.user_id(),
            trade = %id,
            %exit_price,
            final_pnl = %trade.final_pnl.unwrap_or_default(),
            "Trade closed."
        );
        Ok(trade)
    }

    pub async fn trade(&self, ctx: &UserContext, id: TradeId) -> Result<Trade, JournalError> {
        Ok(self.repository.get(ctx.user_id(), id).await?)
    }

    /// Open positions, newest first.
    pub async fn active_trades(&self, ctx: &UserContext) -> Result<Vec<Trade>, JournalError> {
        Ok(self
            .repository
            .list(&TradeQuery::active(ctx.user_id().clone()))
            .await?)
    }

    /// Closed trades, most recently closed first.
    pub async fn closed_trades(&self, ctx: &UserContext) -> Result<Vec<Trade>, JournalError> {
        Ok(self
            .repository
            .list(&TradeQuery::closed(ctx.user_id().clone()))
            .await?)
    }

    /// Active trades marked against `prices`, keyed by ticker (case-insensitive).
    pub async fn open_positions(
        &self,
        ctx: &UserContext,
        prices: &HashMap<String, Decimal>,
    ) -> Result<Vec<OpenPosition>, JournalError> {
        let prices: HashMap<String, Decimal> = prices
            .iter()
            .map(|(ticker, price)| (ticker.trim().to_uppercase(), *price))
            .collect();

        let positions = self
            .active_trades(ctx)
            .await?
            .into_iter()
            .map(|trade| {
                let current_price = prices.get(&trade.ticker).copied();
                let unrealized_pnl = trade.unrealized_pnl(current_price);
                OpenPosition {
                    trade,
                    current_price,
                    unrealized_pnl,
                }
            })
            .collect();
        Ok(positions)
    }

    /// Aggregate statistics and the monthly P&L breakdown.
    pub async fn dashboard(&self, ctx: &UserContext) -> Result<Dashboard, JournalError> {
        let trades = self
            .repository
            .list(&TradeQuery::all(ctx.user_id().clone()))
            .await?;
        Ok(self.dashboard_from(&trades))
    }

    /// Computes the dashboard over a snapshot, e.g. one received from a
    /// subscription.
    pub fn dashboard_from(&self, trades: &[Trade]) -> Dashboard {
        Dashboard {
            stats: self.analytics.aggregate_stats(trades),
            monthly: self.analytics.monthly_aggregate(trades),
        }
    }

    /// The closed-trade history, filtered and sorted. The summary always
    /// covers every closed trade; the filter only narrows the rows.
    pub async fn history(
        &self,
        ctx: &UserContext,
        filter: HistoryFilter,
        sort: HistorySort,
    ) -> Result<History, JournalError> {
        let closed = self.closed_trades(ctx).await?;
        let trades: Vec<Trade> = history_view(&closed, filter, sort)
            .into_iter()
            .cloned()
            .collect();
        let stats = history_stats(&closed);
        Ok(History { trades, stats })
    }

    /// Opens a live view. The query is always scoped to the context's user,
    /// whatever user it was built for.
    pub async fn subscribe(
        &self,
        ctx: &UserContext,
        query: TradeQuery,
    ) -> Result<Subscription, JournalError> {
        let query = TradeQuery {
            user_id: ctx.user_id().clone(),
            ..query
        };
        Ok(self.repository.subscribe(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Direction, Ratio, TradeStatus, UserId};
    use database::MemoryRepository;
    use rust_decimal_macros::dec;

    fn journal() -> (Journal, MemoryRepository) {
        let repo = MemoryRepository::new();
        let journal = Journal::new(Arc::new(repo.clone()), &Config::default());
        (journal, repo)
    }

    fn ctx(user: &str) -> UserContext {
        UserContext::new(UserId::new(user))
    }

    fn form(ticker: &str, direction: &str, entries: &[&str]) -> TradeForm {
        TradeForm {
            ticker: ticker.to_string(),
            direction: direction.to_string(),
            entry_prices: entries.iter().map(|e| e.to_string()).collect(),
            stop_loss: Some("90".into()),
            take_profits: vec!["130".into()],
            quantity: Some("10".into()),
            ..TradeForm::default()
        }
    }

    #[tokio::test]
    async fn create_derives_fields_and_starts_active() {
        let (journal, _) = journal();
        let trade = journal
            .create_trade(&ctx("alice"), form("btc", "long", &["90", "110", "x"]))
            .await
            .unwrap();

        assert_eq!(trade.status, TradeStatus::Active);
        assert_eq!(trade.ticker, "BTC");
        assert_eq!(trade.average_entry, dec!(100));
        assert_eq!(trade.risk_reward, Ratio::Value(dec!(3.00)));
        assert_eq!(trade.exit_price, None);
        assert_eq!(trade.final_pnl, None);
    }

    #[tokio::test]
    async fn create_rejects_a_form_without_entries() {
        let (journal, repo) = journal();
        let err = journal
            .create_trade(&ctx("alice"), form("BTC", "long", &["", "abc"]))
            .await
            .unwrap_err();

        assert!(matches!(err, JournalError::Core(CoreError::NoValidEntryPrice)));
        let all = repo
            .list(&TradeQuery::all(UserId::new("alice")))
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn close_books_pnl_once() {
        let (journal, _) = journal();
        let alice = ctx("alice");
        let trade = journal
            .create_trade(&alice, form("ETH", "short", &["50"]))
            .await
            .unwrap();

        let closed = journal.close_trade(&alice, trade.id, "40").await.unwrap();
        assert_eq!(closed.status, TradeStatus::Closed);
        assert_eq!(closed.exit_price, Some(dec!(40)));
        assert_eq!(closed.final_pnl, Some(dec!(100)));
        assert!(closed.closed_at.is_some());

        let err = journal.close_trade(&alice, trade.id, "60").await.unwrap_err();
        assert!(matches!(err, JournalError::Core(CoreError::TradeClosed(id)) if id == trade.id));

        let stored = journal.trade(&alice, trade.id).await.unwrap();
        assert_eq!(stored.final_pnl, Some(dec!(100)));
        assert_eq!(stored.exit_price, Some(dec!(40)));
    }

    #[tokio::test]
    async fn history_summary_ignores_the_filter() {
        let (journal, _) = journal();
        let alice = ctx("alice");
        for exit in ["102", "99"] {
            let trade = journal
                .create_trade(&alice, form("ETH", "long", &["100"]))
                .await
                .unwrap();
            journal.close_trade(&alice, trade.id, exit).await.unwrap();
        }

        let winners = journal
            .history(&alice, HistoryFilter::Winning, HistorySort::Date)
            .await
            .unwrap();
        assert_eq!(winners.trades.len(), 1);
        assert_eq!(winners.stats.total_trades, 2);
        assert_eq!(winners.stats.losing_trades, 1);
        assert_eq!(winners.stats.total_pnl, dec!(10));
        assert_eq!(winners.stats.win_rate, dec!(50));
    }

    #[tokio::test]
    async fn close_rejects_an_exit_price_that_overflows() {
        let (journal, _) = journal();
        let alice = ctx("alice");
        let trade = journal
            .create_trade(&alice, form("ETH", "long", &["100"]))
            .await
            .unwrap();

        let err = journal.close_trade(&alice, trade.id, "1e28").await.unwrap_err();
        assert!(matches!(err, JournalError::Core(CoreError::InvalidInput(..))));

        let stored = journal.trade(&alice, trade.id).await.unwrap();
        assert!(stored.is_active());
        assert_eq!(stored.final_pnl, None);
        assert_eq!(journal.dashboard(&alice).await.unwrap().stats.total_trades, 1);
    }

    #[tokio::test]
    async fn close_books_pnl_from_the_stored_record() {
        let (journal, repo) = journal();
        let alice = ctx("alice");
        let trade = journal
            .create_trade(&alice, form("ETH", "long", &["100"]))
            .await
            .unwrap();

        // Another writer re-prices the entry straight through the store.
        let mut details = trade.details();
        details.average_entry = dec!(80);
        details.entry_prices = vec![dec!(80)];
        repo.update(&trade.user_id, trade.id, TradeUpdate::Details(details))
            .await
            .unwrap();

        let closed = journal.close_trade(&alice, trade.id, "90").await.unwrap();
        assert_eq!(closed.final_pnl, Some(dec!(100)));
    }

    #[tokio::test]
    async fn close_rejects_unparsable_exit_price() {
        let (journal, _) = journal();
        let alice = ctx("alice");
        let trade = journal
            .create_trade(&alice, form("ETH", "long", &["50"]))
            .await
            .unwrap();

        let err = journal.close_trade(&alice, trade.id, "soon").await.unwrap_err();
        assert!(matches!(err, JournalError::Core(CoreError::InvalidInput(..))));
        assert!(journal.trade(&alice, trade.id).await.unwrap().is_active());
    }

    #[tokio::test]
    async fn edit_recomputes_and_keeps_trade_active() {
        let (journal, _) = journal();
        let alice = ctx("alice");
        let trade = journal
            .create_trade(&alice, form("SOL", "long", &["100"]))
            .await
            .unwrap();

        let mut edited = form("SOL", "long", &["100", "120"]);
        edited.stop_loss = Some("100".into());
        let updated = journal.edit_trade(&alice, trade.id, edited).await.unwrap();

        assert!(updated.is_active());
        assert_eq!(updated.average_entry, dec!(110));
        // risk 10, reward 20
        assert_eq!(updated.risk_reward, Ratio::Value(dec!(2.00)));
        assert_eq!(updated.trade_date, trade.trade_date);
        assert_eq!(updated.created_at, trade.created_at);
    }

    #[tokio::test]
    async fn closed_trades_cannot_be_edited() {
        let (journal, _) = journal();
        let alice = ctx("alice");
        let trade = journal
            .create_trade(&alice, form("SOL", "long", &["100"]))
            .await
            .unwrap();
        journal.close_trade(&alice, trade.id, "110").await.unwrap();

        let err = journal
            .edit_trade(&alice, trade.id, form("SOL", "short", &["1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::Core(CoreError::TradeClosed(_))));

        let stored = journal.trade(&alice, trade.id).await.unwrap();
        assert_eq!(stored.direction, Direction::Long);
        assert_eq!(stored.final_pnl, Some(dec!(100)));
    }

    #[tokio::test]
    async fn users_never_see_each_other() {
        let (journal, _) = journal();
        let alice = ctx("alice");
        let bob = ctx("bob");
        let trade = journal
            .create_trade(&alice, form("AAPL", "long", &["100"]))
            .await
            .unwrap();

        assert!(journal.active_trades(&bob).await.unwrap().is_empty());
        let err = journal.close_trade(&bob, trade.id, "120").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(journal.dashboard(&bob).await.unwrap().stats.total_trades, 0);

        let subscription = journal
            .subscribe(&bob, TradeQuery::all(UserId::new("alice")))
            .await
            .unwrap();
        assert!(subscription.current().is_empty());
    }

    #[tokio::test]
    async fn dashboard_aggregates_the_snapshot() {
        let (journal, _) = journal();
        let alice = ctx("alice");
        let win = journal
            .create_trade(&alice, form("A", "long", &["100"]))
            .await
            .unwrap();
        let loss = journal
            .create_trade(&alice, form("B", "long", &["100"]))
            .await
            .unwrap();
        journal
            .create_trade(&alice, form("C", "long", &["100"]))
            .await
            .unwrap();
        journal.close_trade(&alice, win.id, "110").await.unwrap();
        journal.close_trade(&alice, loss.id, "95").await.unwrap();

        let dashboard = journal.dashboard(&alice).await.unwrap();
        assert_eq!(dashboard.stats.total_trades, 3);
        assert_eq!(dashboard.stats.active_trades, 1);
        assert_eq!(dashboard.stats.closed_trades, 2);
        assert_eq!(dashboard.stats.winning_trades, 1);
        assert_eq!(dashboard.stats.losing_trades, 1);
        assert_eq!(dashboard.stats.win_rate, dec!(50));
        assert_eq!(dashboard.stats.total_profit, dec!(50));
        assert_eq!(dashboard.monthly.len(), 1);
        assert_eq!(dashboard.monthly[0].profit, dec!(50));
    }

    #[tokio::test]
    async fn history_filters_and_summarizes() {
        let (journal, _) = journal();
        let alice = ctx("alice");
        for (ticker, exit) in [("A", "120"), ("B", "90"), ("C", "105")] {
            let trade = journal
                .create_trade(&alice, form(ticker, "long", &["100"]))
                .await
                .unwrap();
            journal.close_trade(&alice, trade.id, exit).await.unwrap();
        }

        let winners = journal
            .history(&alice, HistoryFilter::Winning, HistorySort::Pnl)
            .await
            .unwrap();
        let tickers: Vec<&str> = winners.trades.iter().map(|t| t.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["A", "C"]);
        // (120 - 100) * 10 + (90 - 100) * 10 + (105 - 100) * 10
        assert_eq!(winners.stats.total_trades, 3);
        assert_eq!(winners.stats.winning_trades, 2);
        assert_eq!(winners.stats.losing_trades, 1);
        assert_eq!(winners.stats.total_pnl, dec!(150));

        let all = journal
            .history(&alice, HistoryFilter::All, HistorySort::Ticker)
            .await
            .unwrap();
        assert_eq!(all.trades.len(), 3);
        assert_eq!(all.stats.losing_trades, 1);
    }

    #[tokio::test]
    async fn open_positions_mark_to_market() {
        let (journal, _) = journal();
        let alice = ctx("alice");
        journal
            .create_trade(&alice, form("aapl", "long", &["100"]))
            .await
            .unwrap();
        journal
            .create_trade(&alice, form("MSFT", "short", &["300"]))
            .await
            .unwrap();

        let prices = HashMap::from([("AAPL".to_string(), dec!(104))]);
        let positions = journal.open_positions(&alice, &prices).await.unwrap();

        let aapl = positions.iter().find(|p| p.trade.ticker == "AAPL").unwrap();
        assert_eq!(aapl.current_price, Some(dec!(104)));
        assert_eq!(aapl.unrealized_pnl, dec!(40));
        let msft = positions.iter().find(|p| p.trade.ticker == "MSFT").unwrap();
        assert_eq!(msft.current_price, None);
        assert_eq!(msft.unrealized_pnl, Decimal::ZERO);
    }

    #[tokio::test]
    async fn subscription_follows_the_lifecycle() {
        let (journal, repo) = journal();
        let alice = ctx("alice");
        let mut active = journal
            .subscribe(&alice, TradeQuery::active(UserId::new("alice")))
            .await
            .unwrap();
        assert!(active.next_snapshot().await.unwrap().is_empty());

        let trade = journal
            .create_trade(&alice, form("AAPL", "long", &["100"]))
            .await
            .unwrap();
        assert_eq!(active.next_snapshot().await.unwrap().len(), 1);

        journal.close_trade(&alice, trade.id, "101").await.unwrap();
        let snapshot = active.next_snapshot().await.unwrap();
        assert!(snapshot.is_empty());
        let everything = repo
            .list(&TradeQuery::all(UserId::new("alice")))
            .await
            .unwrap();
        assert_eq!(journal.dashboard_from(&everything).stats.closed_trades, 1);

        drop(active);
        assert_eq!(repo.subscriber_count(), 0);
    }
}
