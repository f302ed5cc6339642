use core_types::Ratio;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate performance over a snapshot of a user's trades.
///
/// This struct is the output of `AnalyticsEngine::aggregate_stats` and feeds
/// the dashboard directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    // I. Counts
    pub total_trades: usize,
    pub active_trades: usize,
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub break_even_trades: usize,

    // II. Profitability
    pub total_profit: Decimal,
    pub win_rate: Decimal, // percent, 0 when nothing is closed
    pub avg_win: Decimal,
    pub avg_loss: Decimal, // absolute value
    pub profit_factor: Ratio,

    // III. Extremes
    pub best_trade: Decimal,
    pub worst_trade: Decimal,
}

impl StatsSummary {
    /// A zeroed summary, which is also the correct answer for an empty journal.
    pub fn new() -> Self {
        Self {
            total_trades: 0,
            active_trades: 0,
            closed_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            break_even_trades: 0,
            total_profit: Decimal::ZERO,
            win_rate: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            profit_factor: Ratio::NotAvailable,
            best_trade: Decimal::ZERO,
            worst_trade: Decimal::ZERO,
        }
    }
}

impl Default for StatsSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Realized profit of the trades closed in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyProfit {
    /// Display label, e.g. `"Mar 2024"`.
    pub month: String,
    pub year: i32,
    pub month_of_year: u32,
    pub profit: Decimal,
}

/// Summary line shown above the closed-trade history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub total_pnl: Decimal,
    pub win_rate: Decimal,
}
