use analytics::{average_entry, parse_price, risk_reward, trade_value};
use chrono::NaiveDate;
use configuration::JournalSettings;
use core_types::{CoreError, Direction, Indicator, Indicators, Timeframe, TradeDetails};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A trade entry form exactly as the user filled it in.
///
/// Numbers stay as text until `into_details`: blank or malformed entry prices
/// are dropped, blank optional fields fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeForm {
    pub ticker: String,
    pub direction: String,
    pub timeframe: Option<String>,
    /// `YYYY-MM-DD`; today when absent.
    pub trade_date: Option<String>,
    pub entry_prices: Vec<String>,
    pub stop_loss: Option<String>,
    pub take_profits: Vec<String>,
    pub quantity: Option<String>,
    pub cost: Option<String>,
    pub leverage: Option<String>,
    pub notes: Option<String>,
    pub indicators: Vec<String>,
}

impl TradeForm {
    /// Validates the form and derives the save-time fields (`average_entry`,
    /// `risk_reward`, `trade_value`).
    pub fn into_details(
        self,
        defaults: &JournalSettings,
        today: NaiveDate,
    ) -> Result<TradeDetails, CoreError> {
        let ticker = self.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(CoreError::InvalidInput(
                "ticker".to_string(),
                "must not be blank".to_string(),
            ));
        }

        let direction: Direction = self.direction.parse()?;
        let timeframe = match non_blank(self.timeframe.as_deref()) {
            Some(tf) => tf.parse::<Timeframe>()?,
            None => defaults.default_timeframe,
        };
        let trade_date = match non_blank(self.trade_date.as_deref()) {
            Some(date) => NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|e| {
                CoreError::InvalidInput("trade date".to_string(), e.to_string())
            })?,
            None => today,
        };

        let entry_prices: Vec<Decimal> = self
            .entry_prices
            .iter()
            .filter_map(|p| parse_price(p))
            .collect();
        if entry_prices.is_empty() {
            return Err(CoreError::NoValidEntryPrice);
        }
        let average_entry = average_entry(&entry_prices);

        let stop_loss = non_zero_price(self.stop_loss.as_deref());
        let take_profits: Vec<Decimal> = self
            .take_profits
            .iter()
            .filter_map(|p| parse_price(p))
            .collect();
        let risk_reward = risk_reward(average_entry, stop_loss, take_profits.first().copied());

        let quantity = non_zero_price(self.quantity.as_deref());
        let cost = non_zero_price(self.cost.as_deref());
        let leverage = non_blank(self.leverage.as_deref())
            .unwrap_or(defaults.default_leverage.as_str())
            .to_string();
        let trade_value = trade_value(cost, &leverage);

        let indicators = self
            .indicators
            .iter()
            .filter(|i| !i.trim().is_empty())
            .map(|i| i.parse::<Indicator>())
            .collect::<Result<Indicators, CoreError>>()?;

        let notes = non_blank(self.notes.as_deref()).map(str::to_string);

        tracing::debug!(
            %ticker,
            %average_entry,
            %risk_reward,
            %trade_value,
            "Derived trade fields."
        );

        Ok(TradeDetails {
            ticker,
            direction,
            timeframe,
            trade_date,
            entry_prices,
            average_entry,
            quantity,
            stop_loss,
            take_profits,
            risk_reward,
            cost,
            leverage,
            trade_value,
            notes,
            indicators,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Zero is how an untouched numeric field arrives; store it as absent.
fn non_zero_price(value: Option<&str>) -> Option<Decimal> {
    value.and_then(parse_price).filter(|d| !d.is_zero())
}
