//! The per-trade formulas. Every function here is pure: no I/O, no state, and
//! missing or malformed input degrades to a neutral value instead of an error.

use crate::input::{PriceInput, non_zero, parse_price};
use core_types::{Direction, Ratio, Trade, effective_quantity};
use rust_decimal::{Decimal, RoundingStrategy};

/// Arithmetic mean of the entries that parse as numbers. Returns 0 when none do.
pub fn average_entry<P: PriceInput>(prices: &[P]) -> Decimal {
    let valid: Vec<Decimal> = prices.iter().filter_map(PriceInput::to_price).collect();
    mean(&valid).unwrap_or(Decimal::ZERO)
}

/// Planned reward divided by planned risk, rounded to 2 decimal places.
///
/// `N/A` when any input is absent or zero, or when the stop sits exactly on
/// the entry. Only the first take-profit target is considered.
pub fn risk_reward(
    average_entry: impl PriceInput,
    stop_loss: impl PriceInput,
    first_take_profit: impl PriceInput,
) -> Ratio {
    let (Some(entry), Some(stop), Some(target)) = (
        non_zero(average_entry),
        non_zero(stop_loss),
        non_zero(first_take_profit),
    ) else {
        return Ratio::NotAvailable;
    };

    let Some(risk) = entry.checked_sub(stop).map(|d| d.abs()) else {
        return Ratio::NotAvailable;
    };
    if risk.is_zero() {
        return Ratio::NotAvailable;
    }
    let Some(reward) = target.checked_sub(entry).map(|d| d.abs()) else {
        return Ratio::NotAvailable;
    };

    match reward.checked_div(risk) {
        Some(ratio) => {
            let mut ratio = ratio.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            ratio.rescale(2);
            Ratio::Value(ratio)
        }
        None => Ratio::NotAvailable,
    }
}

/// Profit booked when a position is closed at `exit_price`. Positive is profit
/// for either direction. An amount too large for a `Decimal` reads as 0.
pub fn realized_pnl(
    direction: Direction,
    average_entry: Decimal,
    exit_price: Decimal,
    quantity: Option<Decimal>,
) -> Decimal {
    direction
        .realized_pnl(average_entry, exit_price, effective_quantity(quantity))
        .unwrap_or(Decimal::ZERO)
}

/// Mark-to-market P&L of an open position. Returns 0 without a current price.
pub fn unrealized_pnl(
    direction: Direction,
    average_entry: Decimal,
    current_price: impl PriceInput,
    quantity: Option<Decimal>,
) -> Decimal {
    match non_zero(current_price) {
        Some(price) => realized_pnl(direction, average_entry, price, quantity),
        None => Decimal::ZERO,
    }
}

/// Notional exposure of `cost` under a leverage written as `"a:b"`.
///
/// No cost or no leverage gives 0. A leverage string that is not two
/// `:`-separated parts leaves the cost unscaled. Parts that are not numbers,
/// or a zero left-hand side, give 0.
pub fn trade_value(cost: impl PriceInput, leverage: &str) -> Decimal {
    let Some(cost) = non_zero(cost) else {
        return Decimal::ZERO;
    };
    let leverage = leverage.trim();
    if leverage.is_empty() {
        return Decimal::ZERO;
    }

    let parts: Vec<&str> = leverage.split(':').collect();
    let [base, multiple] = parts.as_slice() else {
        return cost;
    };

    match (parse_price(base), parse_price(multiple)) {
        (Some(base), Some(multiple)) => multiple
            .checked_div(base)
            .and_then(|m| cost.checked_mul(m))
            .unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Percentage return on the capital the position tied up.
pub fn return_pct(
    final_pnl: Decimal,
    average_entry: Decimal,
    quantity: Option<Decimal>,
) -> Option<Decimal> {
    let invested = average_entry.checked_mul(effective_quantity(quantity))?;
    final_pnl
        .checked_div(invested)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
}

/// Formulas applied directly to a stored trade.
pub trait TradeMetrics {
    /// The P&L the trade would book if closed at `exit_price`.
    fn pnl_at_exit(&self, exit_price: Decimal) -> Decimal;

    fn unrealized_pnl(&self, current_price: Option<Decimal>) -> Decimal;

    /// Return on invested capital of a closed trade. `None` while active.
    fn return_pct(&self) -> Option<Decimal>;

    /// Planned risk/reward recomputed from the stored fields.
    fn planned_risk_reward(&self) -> Ratio;
}

impl TradeMetrics for Trade {
    fn pnl_at_exit(&self, exit_price: Decimal) -> Decimal {
        realized_pnl(self.direction, self.average_entry, exit_price, self.quantity)
    }

    fn unrealized_pnl(&self, current_price: Option<Decimal>) -> Decimal {
        unrealized_pnl(self.direction, self.average_entry, current_price, self.quantity)
    }

    fn return_pct(&self) -> Option<Decimal> {
        let pnl = self.final_pnl.filter(|_| self.is_closed())?;
        return_pct(pnl, self.average_entry, self.quantity)
    }

    fn planned_risk_reward(&self) -> Ratio {
        risk_reward(self.average_entry, self.stop_loss, self.first_take_profit())
    }
}

pub(crate) fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))?;
    sum.checked_div(Decimal::from(values.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{active, closed};
    use rust_decimal_macros::dec;

    #[test]
    fn average_entry_drops_unparsable_entries() {
        assert_eq!(average_entry(&["100", "abc", "200", ""]), dec!(150));
        assert_eq!(average_entry(&[dec!(10), dec!(11), dec!(12)]), dec!(11));
    }

    #[test]
    fn average_entry_of_nothing_is_zero() {
        let empty: [&str; 0] = [];
        assert_eq!(average_entry(&empty), Decimal::ZERO);
        assert_eq!(average_entry(&["abc"]), Decimal::ZERO);
        assert_eq!(average_entry(&[f64::NAN]), Decimal::ZERO);
    }

    #[test]
    fn average_entry_accepts_owned_strings() {
        let prices = vec!["1.5".to_string(), " 2.5 ".to_string()];
        assert_eq!(average_entry(&prices), dec!(2));
    }

    #[test]
    fn risk_reward_divides_reward_by_risk() {
        let rr = risk_reward(dec!(100), dec!(90), dec!(130));
        assert_eq!(rr, Ratio::Value(dec!(3.00)));
        assert_eq!(rr.to_string(), "3.00");
    }

    #[test]
    fn risk_reward_is_direction_agnostic() {
        // A short: stop above, target below.
        assert_eq!(
            risk_reward(dec!(100), dec!(105), dec!(90)),
            Ratio::Value(dec!(2))
        );
    }

    #[test]
    fn risk_reward_rounds_to_two_places() {
        // 10 / 3 = 3.333...
        assert_eq!(
            risk_reward(dec!(100), dec!(97), dec!(110)).to_string(),
            "3.33"
        );
        // 5 / 8 = 0.625 rounds away from zero
        assert_eq!(
            risk_reward(dec!(100), dec!(92), dec!(105)),
            Ratio::Value(dec!(0.63))
        );
    }

    #[test]
    fn risk_reward_is_not_available_without_inputs() {
        assert_eq!(risk_reward(dec!(100), dec!(100), dec!(130)), Ratio::NotAvailable);
        assert_eq!(risk_reward(dec!(100), dec!(0), dec!(130)), Ratio::NotAvailable);
        assert_eq!(risk_reward(dec!(0), dec!(90), dec!(130)), Ratio::NotAvailable);
        assert_eq!(
            risk_reward(dec!(100), dec!(90), None::<Decimal>),
            Ratio::NotAvailable
        );
        assert_eq!(risk_reward("100", "abc", "130"), Ratio::NotAvailable);
        assert_eq!(risk_reward(100.0, f64::NAN, 130.0), Ratio::NotAvailable);
    }

    #[test]
    fn realized_pnl_follows_direction() {
        assert_eq!(
            realized_pnl(Direction::Long, dec!(50), dec!(60), Some(dec!(10))),
            dec!(100)
        );
        assert_eq!(
            realized_pnl(Direction::Short, dec!(50), dec!(40), Some(dec!(10))),
            dec!(100)
        );
        assert_eq!(
            realized_pnl(Direction::Long, dec!(50), dec!(40), Some(dec!(2))),
            dec!(-20)
        );
        assert_eq!(
            realized_pnl(Direction::Short, dec!(50), dec!(55), None),
            dec!(-5)
        );
    }

    #[test]
    fn unrealized_pnl_needs_a_price() {
        assert_eq!(
            unrealized_pnl(Direction::Long, dec!(50), None::<Decimal>, Some(dec!(3))),
            Decimal::ZERO
        );
        assert_eq!(
            unrealized_pnl(Direction::Long, dec!(50), dec!(0), Some(dec!(3))),
            Decimal::ZERO
        );
        assert_eq!(
            unrealized_pnl(Direction::Short, dec!(50), dec!(45), Some(dec!(3))),
            dec!(15)
        );
    }

    #[test]
    fn trade_value_scales_cost_by_leverage() {
        assert_eq!(trade_value(dec!(100), "1:10"), dec!(1000));
        assert_eq!(trade_value("250", "2:5"), dec!(625));
        assert_eq!(trade_value(dec!(100), "10"), dec!(100));
        assert_eq!(trade_value(dec!(100), ""), Decimal::ZERO);
        assert_eq!(trade_value(None::<Decimal>, "1:10"), Decimal::ZERO);
        assert_eq!(trade_value(dec!(100), "0:10"), Decimal::ZERO);
        assert_eq!(trade_value(dec!(100), "x:10"), Decimal::ZERO);
    }

    #[test]
    fn return_pct_relates_pnl_to_invested_capital() {
        assert_eq!(return_pct(dec!(20), dec!(100), Some(dec!(2))), Some(dec!(10)));
        assert_eq!(return_pct(dec!(-5), dec!(50), None), Some(dec!(-10)));
        assert_eq!(return_pct(dec!(5), Decimal::ZERO, None), None);
    }

    #[test]
    fn trade_metrics_use_stored_fields() {
        let trade = active("NVDA", Direction::Long, dec!(100), Some(dec!(4)));
        assert_eq!(trade.pnl_at_exit(dec!(110)), dec!(40));
        assert_eq!(trade.unrealized_pnl(Some(dec!(95))), dec!(-20));
        assert_eq!(trade.return_pct(), None);
        assert_eq!(trade.planned_risk_reward(), Ratio::Value(dec!(3.00)));

        let done = closed(dec!(25), 2024, 5, 3);
        assert_eq!(done.return_pct(), Some(dec!(25)));
    }

    #[test]
    fn oversized_amounts_degrade_to_zero() {
        let max = "79228162514264337593543950335";
        assert_eq!(average_entry(&[max, max]), Decimal::ZERO);
        assert_eq!(
            realized_pnl(Direction::Long, Decimal::MAX, Decimal::MIN, Some(Decimal::ONE)),
            Decimal::ZERO
        );
        assert_eq!(
            unrealized_pnl(Direction::Short, Decimal::MIN, Decimal::MAX, None),
            Decimal::ZERO
        );
        assert_eq!(
            realized_pnl(Direction::Long, dec!(100), "1e28".to_price().unwrap(), Some(dec!(10))),
            Decimal::ZERO
        );
        assert_eq!(mean(&[Decimal::MAX, Decimal::MAX]), None);
    }

    #[test]
    fn formulas_are_deterministic() {
        let a = risk_reward(dec!(101.7), dec!(99.2), dec!(108.35));
        let b = risk_reward(dec!(101.7), dec!(99.2), dec!(108.35));
        assert_eq!(a, b);
        assert_eq!(average_entry(&["3", "4"]), average_entry(&["3", "4"]));
    }
}
