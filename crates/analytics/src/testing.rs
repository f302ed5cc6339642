//! Trade builders shared by the unit tests of this crate.

use chrono::{NaiveDate, TimeZone, Utc};
use core_types::{
    Direction, Indicators, NewTrade, Ratio, Timeframe, Trade, TradeDetails, TradeId,
    TradeUpdate, UserId,
};
use rust_decimal::Decimal;

/// An active trade with a stop 10 below and a target 30 above the entry.
pub(crate) fn active(
    ticker: &str,
    direction: Direction,
    entry: Decimal,
    quantity: Option<Decimal>,
) -> Trade {
    let details = TradeDetails {
        ticker: ticker.to_string(),
        direction,
        timeframe: Timeframe::H1,
        trade_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        entry_prices: vec![entry],
        average_entry: entry,
        quantity,
        stop_loss: Some(entry - Decimal::TEN),
        take_profits: vec![entry + Decimal::from(30)],
        risk_reward: Ratio::NotAvailable,
        cost: None,
        leverage: "1:1".to_string(),
        trade_value: Decimal::ZERO,
        notes: None,
        indicators: Indicators::default(),
    };
    let opened_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Trade::open(
        TradeId::new_v4(),
        NewTrade {
            user_id: UserId::new("tester"),
            details,
        },
        opened_at,
    )
}

/// A long trade entered at 100 and closed on the given day with `pnl`.
pub(crate) fn closed(pnl: Decimal, year: i32, month: u32, day: u32) -> Trade {
    let mut trade = active("TEST", Direction::Long, Decimal::ONE_HUNDRED, None);
    let closed_at = Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap();
    trade
        .apply(
            TradeUpdate::Close {
                exit_price: Decimal::ONE_HUNDRED,
            },
            closed_at,
        )
        .unwrap();
    // Set the outcome directly so extreme amounts can be fed to the aggregates.
    trade.exit_price = Some(Decimal::ONE_HUNDRED.saturating_add(pnl));
    trade.final_pnl = Some(pnl);
    trade
}
