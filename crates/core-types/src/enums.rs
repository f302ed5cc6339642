use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The side of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Profits when the price rises.
    Long,
    /// Profits when the price falls.
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }

    /// P&L of `quantity` units moved from `average_entry` to `exit_price`.
    /// Positive is profit for either side. `None` when the result does not
    /// fit in a `Decimal`.
    pub fn realized_pnl(
        &self,
        average_entry: Decimal,
        exit_price: Decimal,
        quantity: Decimal,
    ) -> Option<Decimal> {
        let per_unit = match self {
            Direction::Long => exit_price.checked_sub(average_entry),
            Direction::Short => average_entry.checked_sub(exit_price),
        }?;
        per_unit.checked_mul(quantity)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(Direction::Long),
            "short" => Ok(Direction::Short),
            other => Err(CoreError::InvalidInput(
                "direction".to_string(),
                format!("expected 'long' or 'short', got '{other}'"),
            )),
        }
    }
}

/// Lifecycle state of a trade. The only transition is `Active -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Active,
    Closed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Active => "active",
            TradeStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(TradeStatus::Active),
            "closed" => Ok(TradeStatus::Closed),
            other => Err(CoreError::InvalidInput(
                "status".to_string(),
                format!("unknown trade status '{other}'"),
            )),
        }
    }
}

/// Chart timeframe the setup was taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[default]
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 8] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::W1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.as_str() == wanted)
            .ok_or_else(|| {
                CoreError::InvalidInput("timeframe".to_string(), format!("unknown timeframe '{s}'"))
            })
    }
}

/// A confluence factor that can be ticked on a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Indicator {
    SupportResistance,
    Fib,
    MovingAverage,
    Trendline,
    StochRsi,
    Volume,
    Fvg,
}

impl Indicator {
    pub const ALL: [Indicator; 7] = [
        Indicator::SupportResistance,
        Indicator::Fib,
        Indicator::MovingAverage,
        Indicator::Trendline,
        Indicator::StochRsi,
        Indicator::Volume,
        Indicator::Fvg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::SupportResistance => "support-resistance",
            Indicator::Fib => "fib",
            Indicator::MovingAverage => "moving-average",
            Indicator::Trendline => "trendline",
            Indicator::StochRsi => "stoch-rsi",
            Indicator::Volume => "volume",
            Indicator::Fvg => "fvg",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Indicator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Indicator::ALL
            .into_iter()
            .find(|i| i.as_str() == wanted)
            .ok_or_else(|| {
                CoreError::InvalidInput("indicator".to_string(), format!("unknown indicator '{s}'"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("LONG".parse::<Direction>().unwrap(), Direction::Long);
        assert_eq!(" short ".parse::<Direction>().unwrap(), Direction::Short);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn timeframe_round_trips_through_its_label() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), tf);
        }
        assert_eq!(Timeframe::default(), Timeframe::H1);
    }

    #[test]
    fn indicator_accepts_underscores() {
        assert_eq!(
            "stoch_rsi".parse::<Indicator>().unwrap(),
            Indicator::StochRsi
        );
    }
}
