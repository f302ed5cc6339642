use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::str::FromStr;

/// Anything a price can be read from: user-entered text, a stored decimal, or
/// a float from an external feed.
///
/// Values that are blank, malformed or not finite read as `None`; the
/// formulas treat them as absent rather than failing.
pub trait PriceInput {
    fn to_price(&self) -> Option<Decimal>;
}

/// Parses a user-entered decimal string. Blank and malformed text yields `None`.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

impl PriceInput for str {
    fn to_price(&self) -> Option<Decimal> {
        parse_price(self)
    }
}

impl PriceInput for String {
    fn to_price(&self) -> Option<Decimal> {
        parse_price(self)
    }
}

impl PriceInput for Decimal {
    fn to_price(&self) -> Option<Decimal> {
        Some(*self)
    }
}

impl PriceInput for f64 {
    fn to_price(&self) -> Option<Decimal> {
        if self.is_finite() {
            Decimal::from_f64(*self)
        } else {
            None
        }
    }
}

impl<T: PriceInput> PriceInput for Option<T> {
    fn to_price(&self) -> Option<Decimal> {
        self.as_ref().and_then(PriceInput::to_price)
    }
}

impl<T: PriceInput + ?Sized> PriceInput for &T {
    fn to_price(&self) -> Option<Decimal> {
        (**self).to_price()
    }
}

/// Reads a price and treats zero as absent, the way form fields do.
pub(crate) fn non_zero(input: impl PriceInput) -> Option<Decimal> {
    input.to_price().filter(|v| !v.is_zero())
}
