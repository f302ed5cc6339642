use crate::formulas::mean;
use crate::report::{MonthlyProfit, StatsSummary};
use chrono::Datelike;
use core_types::{Ratio, Trade, TradeStatus};
use rust_decimal::Decimal;

/// How many months the monthly breakdown shows by default.
pub const DEFAULT_MONTHLY_WINDOW: usize = 6;

/// A stateless calculator for deriving aggregate metrics from a snapshot of
/// trades. It only carries presentation options for the monthly breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsEngine {
    monthly_window: usize,
    chronological_months: bool,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self {
            monthly_window: DEFAULT_MONTHLY_WINDOW,
            chronological_months: true,
        }
    }
}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of month groups returned. Values below 1 are clamped to 1.
    pub fn with_monthly_window(mut self, months: usize) -> Self {
        self.monthly_window = months.max(1);
        self
    }

    /// When false, month groups keep the order they were first seen in the
    /// input before the window is applied.
    pub fn with_chronological_months(mut self, chronological: bool) -> Self {
        self.chronological_months = chronological;
        self
    }

    pub fn monthly_window(&self) -> usize {
        self.monthly_window
    }

    /// Win rate, P&L and profit factor over every trade in the snapshot.
    ///
    /// Closed trades with a P&L of exactly zero are break-even: they count
    /// towards the totals but neither as wins nor as losses. A closed trade
    /// without a recorded P&L is treated as zero. Sums that exceed the
    /// `Decimal` range saturate, and averages that cannot be formed read as 0.
    pub fn aggregate_stats(&self, trades: &[Trade]) -> StatsSummary {
        let mut report = StatsSummary::new();
        report.total_trades = trades.len();

        let mut wins = Vec::new();
        let mut losses = Vec::new();
        let mut best: Option<Decimal> = None;
        let mut worst: Option<Decimal> = None;

        for trade in trades {
            match trade.status {
                TradeStatus::Active => report.active_trades += 1,
                TradeStatus::Closed => {
                    report.closed_trades += 1;
                    let pnl = trade.final_pnl.unwrap_or(Decimal::ZERO);
                    report.total_profit = report.total_profit.saturating_add(pnl);

                    best = Some(best.map_or(pnl, |b| b.max(pnl)));
                    worst = Some(worst.map_or(pnl, |w| w.min(pnl)));

                    if pnl > Decimal::ZERO {
                        wins.push(pnl);
                    } else if pnl < Decimal::ZERO {
                        losses.push(pnl.abs());
                    } else {
                        report.break_even_trades += 1;
                    }
                }
            }
        }

        report.winning_trades = wins.len();
        report.losing_trades = losses.len();
        report.best_trade = best.unwrap_or(Decimal::ZERO);
        report.worst_trade = worst.unwrap_or(Decimal::ZERO);

        // --- Ratios ---
        if report.closed_trades > 0 {
            report.win_rate = Decimal::from(report.winning_trades)
                / Decimal::from(report.closed_trades)
                * Decimal::ONE_HUNDRED;
        }

        report.avg_win = mean(&wins).unwrap_or(Decimal::ZERO);
        report.avg_loss = mean(&losses).unwrap_or(Decimal::ZERO);

        if report.avg_loss > Decimal::ZERO {
            report.profit_factor = Ratio::from(report.avg_win.checked_div(report.avg_loss));
        }

        tracing::debug!(
            total = report.total_trades,
            closed = report.closed_trades,
            win_rate = %report.win_rate,
            total_profit = %report.total_profit,
            "Aggregated trade statistics."
        );

        report
    }

    /// Realized profit per calendar month (UTC) of `closed_at`.
    ///
    /// Only closed trades with a close timestamp take part. At most
    /// `monthly_window` groups are returned, always the most recent ones.
    pub fn monthly_aggregate(&self, trades: &[Trade]) -> Vec<MonthlyProfit> {
        let mut groups: Vec<MonthlyProfit> = Vec::new();

        for trade in trades.iter().filter(|t| t.is_closed()) {
            let Some(closed_at) = trade.closed_at else {
                continue;
            };
            let (year, month_of_year) = (closed_at.year(), closed_at.month());
            let pnl = trade.final_pnl.unwrap_or(Decimal::ZERO);

            match groups
                .iter_mut()
                .find(|g| g.year == year && g.month_of_year == month_of_year)
            {
                Some(group) => group.profit = group.profit.saturating_add(pnl),
                None => groups.push(MonthlyProfit {
                    month: closed_at.format("%b %Y").to_string(),
                    year,
                    month_of_year,
                    profit: pnl,
                }),
            }
        }

        if self.chronological_months {
            groups.sort_by_key(|g| (g.year, g.month_of_year));
        }

        if groups.len() > self.monthly_window {
            let excess = groups.len() - self.monthly_window;
            groups.drain(..excess);
        }

        groups
    }
}

/// `AnalyticsEngine::aggregate_stats` with default options.
pub fn aggregate_stats(trades: &[Trade]) -> StatsSummary {
    AnalyticsEngine::default().aggregate_stats(trades)
}

/// `AnalyticsEngine::monthly_aggregate` with default options: chronological,
/// at most six months.
pub fn monthly_aggregate(trades: &[Trade]) -> Vec<MonthlyProfit> {
    AnalyticsEngine::default().monthly_aggregate(trades)
}
