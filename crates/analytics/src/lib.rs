//! # Tradebook Analytics
//!
//! The trade metrics engine: the formulas behind the journal's numbers
//! (average entry, risk/reward, realized and unrealized P&L) and the
//! aggregates built on top of them (win rate, profit factor, monthly P&L).
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O, no shared state. Depends only on `core-types`.
//!   Every function can be called concurrently without coordination.
//! - **No failures:** malformed or missing numbers are treated as absent and
//!   degrade to 0, an empty result, or `Ratio::NotAvailable`.
//!
//! ## Public API
//!
//! - `average_entry`, `risk_reward`, `realized_pnl`, `unrealized_pnl`,
//!   `trade_value`, `return_pct`: per-trade formulas.
//! - `AnalyticsEngine`: `aggregate_stats` and `monthly_aggregate` over a snapshot.
//! - `history_view` / `history_stats`: the closed-trade history.

pub mod engine;
pub mod formulas;
pub mod history;
pub mod input;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{AnalyticsEngine, DEFAULT_MONTHLY_WINDOW, aggregate_stats, monthly_aggregate};
pub use formulas::{
    TradeMetrics, average_entry, realized_pnl, return_pct, risk_reward, trade_value, unrealized_pnl,
};
pub use history::{HistoryFilter, HistorySort, history_stats, history_view};
pub use input::{PriceInput, parse_price};
pub use report::{HistoryStats, MonthlyProfit, StatsSummary};
