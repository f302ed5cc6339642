//! Terminal tables for the command output.

use analytics::{HistoryStats, MonthlyProfit, StatsSummary, TradeMetrics};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, Table};
use core_types::Trade;
use journal::{History, OpenPosition};
use rust_decimal::Decimal;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn money(value: Decimal) -> Cell {
    let cell = Cell::new(format!("{:.2}", value)).set_alignment(CellAlignment::Right);
    if value > Decimal::ZERO {
        cell.fg(Color::Green)
    } else if value < Decimal::ZERO {
        cell.fg(Color::Red)
    } else {
        cell
    }
}

fn optional(value: Option<Decimal>) -> String {
    value.map(|v| v.normalize().to_string()).unwrap_or_else(|| "-".to_string())
}

fn percent(value: Option<Decimal>) -> String {
    value
        .map(|v| format!("{:.2}%", v))
        .unwrap_or_else(|| "-".to_string())
}

/// A single trade, as echoed after add / edit / close.
pub fn trade(trade: &Trade) -> Table {
    let mut table = table(vec!["Field", "Value"]);
    table
        .add_row(vec!["ID".to_string(), trade.id.to_string()])
        .add_row(vec!["Ticker".to_string(), trade.ticker.clone()])
        .add_row(vec!["Direction".to_string(), trade.direction.to_string()])
        .add_row(vec!["Status".to_string(), trade.status.to_string()])
        .add_row(vec!["Timeframe".to_string(), trade.timeframe.to_string()])
        .add_row(vec!["Date".to_string(), trade.trade_date.to_string()])
        .add_row(vec![
            "Entries".to_string(),
            trade
                .entry_prices
                .iter()
                .map(|p| p.normalize().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ])
        .add_row(vec![
            "Avg Entry".to_string(),
            trade.average_entry.normalize().to_string(),
        ])
        .add_row(vec!["Quantity".to_string(), optional(trade.quantity)])
        .add_row(vec!["Stop Loss".to_string(), optional(trade.stop_loss)])
        .add_row(vec![
            "Take Profits".to_string(),
            trade
                .take_profits
                .iter()
                .map(|p| p.normalize().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ])
        .add_row(vec!["Risk/Reward".to_string(), trade.risk_reward.as_odds()])
        .add_row(vec!["Cost".to_string(), optional(trade.cost)])
        .add_row(vec!["Leverage".to_string(), trade.leverage.clone()])
        .add_row(vec![
            "Trade Value".to_string(),
            format!("{:.2}", trade.trade_value),
        ]);

    let indicators = trade.indicators.enabled();
    if !indicators.is_empty() {
        table.add_row(vec![
            "Indicators".to_string(),
            indicators
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ]);
    }
    if let Some(notes) = &trade.notes {
        table.add_row(vec!["Notes".to_string(), notes.clone()]);
    }
    if trade.is_closed() {
        table
            .add_row(vec!["Exit".to_string(), optional(trade.exit_price)])
            .add_row(vec![
                Cell::new("Final P&L"),
                money(trade.final_pnl.unwrap_or(Decimal::ZERO)),
            ])
            .add_row(vec!["Return".to_string(), percent(trade.return_pct())]);
    }
    table
}

pub fn positions(positions: &[OpenPosition]) -> Table {
    let mut table = table(vec![
        "ID", "Ticker", "Dir", "Avg Entry", "Qty", "Stop", "Target", "R:R", "Price",
        "Unrealized",
    ]);
    for position in positions {
        let trade = &position.trade;
        table.add_row(vec![
            Cell::new(trade.id),
            Cell::new(&trade.ticker),
            Cell::new(trade.direction),
            Cell::new(trade.average_entry.normalize()),
            Cell::new(trade.effective_quantity().normalize()),
            Cell::new(optional(trade.stop_loss)),
            Cell::new(optional(trade.first_take_profit())),
            Cell::new(trade.risk_reward.as_odds()),
            Cell::new(optional(position.current_price)),
            money(position.unrealized_pnl),
        ]);
    }
    table
}

pub fn history(history: &History) -> Table {
    let mut table = table(vec![
        "Closed", "Ticker", "Dir", "Avg Entry", "Exit", "Qty", "P&L", "Return",
    ]);
    for trade in &history.trades {
        table.add_row(vec![
            Cell::new(
                trade
                    .closed_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
            ),
            Cell::new(&trade.ticker),
            Cell::new(trade.direction),
            Cell::new(trade.average_entry.normalize()),
            Cell::new(optional(trade.exit_price)),
            Cell::new(trade.effective_quantity().normalize()),
            money(trade.final_pnl.unwrap_or(Decimal::ZERO)),
            Cell::new(percent(trade.return_pct())),
        ]);
    }
    table
}

pub fn history_summary(stats: &HistoryStats) -> Table {
    let mut table = table(vec!["Trades", "Winning", "Losing", "Win Rate", "Total P&L"]);
    table.add_row(vec![
        Cell::new(stats.total_trades),
        Cell::new(stats.winning_trades),
        Cell::new(stats.losing_trades),
        Cell::new(format!("{:.1}%", stats.win_rate)),
        money(stats.total_pnl),
    ]);
    table
}

pub fn stats(stats: &StatsSummary) -> Table {
    let mut table = table(vec!["Metric", "Value"]);
    table
        .add_row(vec![Cell::new("Total Trades"), Cell::new(stats.total_trades)])
        .add_row(vec![Cell::new("Active"), Cell::new(stats.active_trades)])
        .add_row(vec![Cell::new("Closed"), Cell::new(stats.closed_trades)])
        .add_row(vec![Cell::new("Winning"), Cell::new(stats.winning_trades)])
        .add_row(vec![Cell::new("Losing"), Cell::new(stats.losing_trades)])
        .add_row(vec![Cell::new("Break-even"), Cell::new(stats.break_even_trades)])
        .add_row(vec![
            Cell::new("Win Rate"),
            Cell::new(format!("{:.1}%", stats.win_rate)),
        ])
        .add_row(vec![Cell::new("Total Profit"), money(stats.total_profit)])
        .add_row(vec![Cell::new("Avg Win"), money(stats.avg_win)])
        .add_row(vec![Cell::new("Avg Loss"), money(-stats.avg_loss)])
        .add_row(vec![
            Cell::new("Profit Factor"),
            Cell::new(stats.profit_factor),
        ])
        .add_row(vec![Cell::new("Best Trade"), money(stats.best_trade)])
        .add_row(vec![Cell::new("Worst Trade"), money(stats.worst_trade)]);
    table
}

pub fn monthly(months: &[MonthlyProfit]) -> Table {
    let mut table = table(vec!["Month", "Profit"]);
    for month in months {
        table.add_row(vec![Cell::new(&month.month), money(month.profit)]);
    }
    table
}
