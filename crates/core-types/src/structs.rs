use crate::enums::{Direction, Indicator, Timeframe, TradeStatus};
use crate::error::CoreError;
use crate::ratio::Ratio;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier of an authenticated user, supplied by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a stored trade, assigned by the storage collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(pub Uuid);

impl TradeId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TradeId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(TradeId)
            .map_err(|e| CoreError::InvalidInput("trade id".to_string(), e.to_string()))
    }
}

/// The authenticated session every query and write is scoped to.
///
/// Passed explicitly into each journal operation instead of living in a global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    user_id: UserId,
}

impl UserContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

/// The confluence checklist ticked on a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Indicators {
    pub support_resistance: bool,
    pub fib: bool,
    pub moving_average: bool,
    pub trendline: bool,
    pub stoch_rsi: bool,
    pub volume: bool,
    pub fvg: bool,
}

impl Indicators {
    fn slot(&mut self, indicator: Indicator) -> &mut bool {
        match indicator {
            Indicator::SupportResistance => &mut self.support_resistance,
            Indicator::Fib => &mut self.fib,
            Indicator::MovingAverage => &mut self.moving_average,
            Indicator::Trendline => &mut self.trendline,
            Indicator::StochRsi => &mut self.stoch_rsi,
            Indicator::Volume => &mut self.volume,
            Indicator::Fvg => &mut self.fvg,
        }
    }

    pub fn set(&mut self, indicator: Indicator, enabled: bool) {
        *self.slot(indicator) = enabled;
    }

    pub fn is_set(&self, indicator: Indicator) -> bool {
        let mut copy = *self;
        *copy.slot(indicator)
    }

    pub fn enabled(&self) -> Vec<Indicator> {
        Indicator::ALL
            .into_iter()
            .filter(|i| self.is_set(*i))
            .collect()
    }
}

impl FromIterator<Indicator> for Indicators {
    fn from_iter<T: IntoIterator<Item = Indicator>>(iter: T) -> Self {
        let mut indicators = Indicators::default();
        for indicator in iter {
            indicators.set(indicator, true);
        }
        indicators
    }
}

/// The user-editable part of a trade together with the values derived from it
/// at save time (`average_entry`, `risk_reward`, `trade_value`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDetails {
    pub ticker: String,
    pub direction: Direction,
    pub timeframe: Timeframe,
    pub trade_date: NaiveDate,
    pub entry_prices: Vec<Decimal>,
    pub average_entry: Decimal,
    pub quantity: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profits: Vec<Decimal>,
    pub risk_reward: Ratio,
    pub cost: Option<Decimal>,
    pub leverage: String,
    pub trade_value: Decimal,
    pub notes: Option<String>,
    pub indicators: Indicators,
}

/// A validated trade ready to be handed to the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    pub user_id: UserId,
    pub details: TradeDetails,
}

/// A merge applied to an existing record by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TradeUpdate {
    /// Replace the editable fields; the trade stays active.
    Details(TradeDetails),
    /// The one-way `active -> closed` transition. The P&L is booked from the
    /// record as it stands when the transition is applied.
    Close { exit_price: Decimal },
}

/// A journal entry as persisted by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub user_id: UserId,
    pub ticker: String,
    pub direction: Direction,
    pub timeframe: Timeframe,
    pub trade_date: NaiveDate,
    pub entry_prices: Vec<Decimal>,
    pub average_entry: Decimal,
    pub quantity: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profits: Vec<Decimal>,
    pub risk_reward: Ratio,
    pub cost: Option<Decimal>,
    pub leverage: String,
    pub trade_value: Decimal,
    pub notes: Option<String>,
    pub indicators: Indicators,
    pub status: TradeStatus,
    pub exit_price: Option<Decimal>,
    pub final_pnl: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Absent or zero quantity means one unit.
pub fn effective_quantity(quantity: Option<Decimal>) -> Decimal {
    match quantity {
        Some(q) if !q.is_zero() => q,
        _ => Decimal::ONE,
    }
}

impl Trade {
    /// Materializes a freshly created, active trade.
    pub fn open(id: TradeId, new_trade: NewTrade, now: DateTime<Utc>) -> Self {
        let NewTrade { user_id, details } = new_trade;
        Self {
            id,
            user_id,
            ticker: details.ticker,
            direction: details.direction,
            timeframe: details.timeframe,
            trade_date: details.trade_date,
            entry_prices: details.entry_prices,
            average_entry: details.average_entry,
            quantity: details.quantity,
            stop_loss: details.stop_loss,
            take_profits: details.take_profits,
            risk_reward: details.risk_reward,
            cost: details.cost,
            leverage: details.leverage,
            trade_value: details.trade_value,
            notes: details.notes,
            indicators: details.indicators,
            status: TradeStatus::Active,
            exit_price: None,
            final_pnl: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TradeStatus::Active
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    /// Quantity used by the P&L formulas: absent or zero means one unit.
    pub fn effective_quantity(&self) -> Decimal {
        effective_quantity(self.quantity)
    }

    /// The P&L booked if the trade were closed at `exit_price`. `None` when
    /// the amount overflows.
    pub fn pnl_at(&self, exit_price: Decimal) -> Option<Decimal> {
        self.direction
            .realized_pnl(self.average_entry, exit_price, self.effective_quantity())
    }

    pub fn first_take_profit(&self) -> Option<Decimal> {
        self.take_profits.first().copied()
    }

    /// Fails with `TradeClosed` unless the trade can still be modified.
    pub fn ensure_active(&self) -> Result<(), CoreError> {
        if self.is_closed() {
            return Err(CoreError::TradeClosed(self.id));
        }
        Ok(())
    }

    /// Current editable fields, e.g. to prefill an edit.
    pub fn details(&self) -> TradeDetails {
        TradeDetails {
            ticker: self.ticker.clone(),
            direction: self.direction,
            timeframe: self.timeframe,
            trade_date: self.trade_date,
            entry_prices: self.entry_prices.clone(),
            average_entry: self.average_entry,
            quantity: self.quantity,
            stop_loss: self.stop_loss,
            take_profits: self.take_profits.clone(),
            risk_reward: self.risk_reward,
            cost: self.cost,
            leverage: self.leverage.clone(),
            trade_value: self.trade_value,
            notes: self.notes.clone(),
            indicators: self.indicators,
        }
    }

    /// Applies a merge. Closed trades reject every update and stay untouched.
    pub fn apply(&mut self, update: TradeUpdate, now: DateTime<Utc>) -> Result<(), CoreError> {
        self.ensure_active()?;

        match update {
            TradeUpdate::Details(details) => {
                self.ticker = details.ticker;
                self.direction = details.direction;
                self.timeframe = details.timeframe;
                self.trade_date = details.trade_date;
                self.entry_prices = details.entry_prices;
                self.average_entry = details.average_entry;
                self.quantity = details.quantity;
                self.stop_loss = details.stop_loss;
                self.take_profits = details.take_profits;
                self.risk_reward = details.risk_reward;
                self.cost = details.cost;
                self.leverage = details.leverage;
                self.trade_value = details.trade_value;
                self.notes = details.notes;
                self.indicators = details.indicators;
            }
            TradeUpdate::Close { exit_price } => {
                let final_pnl = self.pnl_at(exit_price).ok_or_else(|| {
                    CoreError::InvalidInput(
                        "exit price".to_string(),
                        format!("P&L at {exit_price} is out of range"),
                    )
                })?;
                self.status = TradeStatus::Closed;
                self.exit_price = Some(exit_price);
                self.final_pnl = Some(final_pnl);
                self.closed_at = Some(now);
            }
        }

        self.updated_at = now;
        Ok(())
    }
}
