use crate::engine::aggregate_stats;
use crate::report::HistoryStats;
use core_types::Trade;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which closed trades the history shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFilter {
    #[default]
    All,
    Winning,
    Losing,
}

impl HistoryFilter {
    fn admits(&self, trade: &Trade) -> bool {
        let pnl = trade.final_pnl.unwrap_or(Decimal::ZERO);
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Winning => pnl > Decimal::ZERO,
            HistoryFilter::Losing => pnl < Decimal::ZERO,
        }
    }
}

impl fmt::Display for HistoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HistoryFilter::All => "all",
            HistoryFilter::Winning => "winning",
            HistoryFilter::Losing => "losing",
        })
    }
}

impl FromStr for HistoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(HistoryFilter::All),
            "winning" | "wins" => Ok(HistoryFilter::Winning),
            "losing" | "losses" => Ok(HistoryFilter::Losing),
            other => Err(format!("unknown history filter '{other}'")),
        }
    }
}

/// Ordering of the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySort {
    /// Most recently closed first.
    #[default]
    Date,
    /// Largest profit first.
    Pnl,
    /// Alphabetical by ticker.
    Ticker,
}

impl fmt::Display for HistorySort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HistorySort::Date => "date",
            HistorySort::Pnl => "pnl",
            HistorySort::Ticker => "ticker",
        })
    }
}

impl FromStr for HistorySort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(HistorySort::Date),
            "pnl" => Ok(HistorySort::Pnl),
            "ticker" => Ok(HistorySort::Ticker),
            other => Err(format!("unknown history sort '{other}'")),
        }
    }
}

/// Closed trades narrowed by `filter` and ordered by `sort`.
pub fn history_view(trades: &[Trade], filter: HistoryFilter, sort: HistorySort) -> Vec<&Trade> {
    let mut view: Vec<&Trade> = trades
        .iter()
        .filter(|t| t.is_closed() && filter.admits(t))
        .collect();

    match sort {
        // `None < Some`, so trades without a close time sink to the bottom.
        HistorySort::Date => view.sort_by(|a, b| b.closed_at.cmp(&a.closed_at)),
        HistorySort::Pnl => view.sort_by(|a, b| {
            b.final_pnl
                .unwrap_or(Decimal::ZERO)
                .cmp(&a.final_pnl.unwrap_or(Decimal::ZERO))
        }),
        HistorySort::Ticker => view.sort_by(|a, b| a.ticker.cmp(&b.ticker)),
    }

    view
}

/// Totals over every closed trade in `trades`, independent of any filter.
pub fn history_stats(trades: &[Trade]) -> HistoryStats {
    let stats = aggregate_stats(trades);
    HistoryStats {
        total_trades: stats.closed_trades,
        winning_trades: stats.winning_trades,
        losing_trades: stats.losing_trades,
        total_pnl: stats.total_profit,
        win_rate: stats.win_rate,
    }
}
