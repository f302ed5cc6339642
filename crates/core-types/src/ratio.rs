use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const NOT_AVAILABLE: &str = "N/A";

/// A ratio that may be undefined, such as risk/reward or profit factor.
///
/// Undefined ratios render as `"N/A"` both in `Display` and on the wire, so a
/// stored record reads the same way the journal shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ratio {
    Value(Decimal),
    #[default]
    NotAvailable,
}

impl Ratio {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Ratio::Value(v) => Some(*v),
            Ratio::NotAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Ratio::Value(_))
    }

    /// Renders the ratio the way traders quote it, e.g. `3.00:1`.
    pub fn as_odds(&self) -> String {
        match self {
            Ratio::Value(v) => format!("{v:.2}:1"),
            Ratio::NotAvailable => NOT_AVAILABLE.to_string(),
        }
    }
}

impl From<Option<Decimal>> for Ratio {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Ratio::NotAvailable, Ratio::Value)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Value(v) => write!(f, "{v:.2}"),
            Ratio::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct RatioVisitor;

impl<'de> Visitor<'de> for RatioVisitor {
    type Value = Ratio;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal ratio or \"N/A\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Ratio, E> {
        if v.trim().eq_ignore_ascii_case(NOT_AVAILABLE) {
            return Ok(Ratio::NotAvailable);
        }
        Decimal::from_str(v.trim())
            .map(Ratio::Value)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Ratio, E> {
        Decimal::try_from(v)
            .map(Ratio::Value)
            .map_err(|_| E::invalid_value(de::Unexpected::Float(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Ratio, E> {
        Ok(Ratio::Value(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Ratio, E> {
        Ok(Ratio::Value(Decimal::from(v)))
    }

    fn visit_none<E: de::Error>(self) -> Result<Ratio, E> {
        Ok(Ratio::NotAvailable)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Ratio, E> {
        Ok(Ratio::NotAvailable)
    }
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RatioVisitor)
    }
}
