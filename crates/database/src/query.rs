use core_types::{Trade, TradeStatus, UserId};

/// Ordering of a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradeOrder {
    /// Newest first by creation time.
    #[default]
    CreatedDesc,
    /// Most recently closed first; still-open trades last.
    ClosedDesc,
}

/// A per-user selection of trades. Every query is scoped to exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeQuery {
    pub user_id: UserId,
    pub status: Option<TradeStatus>,
    pub order: TradeOrder,
}

impl TradeQuery {
    /// Every trade of the user, newest first.
    pub fn all(user_id: UserId) -> Self {
        Self {
            user_id,
            status: None,
            order: TradeOrder::CreatedDesc,
        }
    }

    /// Open positions, newest first.
    pub fn active(user_id: UserId) -> Self {
        Self {
            user_id,
            status: Some(TradeStatus::Active),
            order: TradeOrder::CreatedDesc,
        }
    }

    /// Closed trades, most recently closed first.
    pub fn closed(user_id: UserId) -> Self {
        Self {
            user_id,
            status: Some(TradeStatus::Closed),
            order: TradeOrder::ClosedDesc,
        }
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        trade.user_id == self.user_id && self.status.is_none_or(|s| s == trade.status)
    }

    /// Sorts an already filtered result into this query's order.
    pub fn arrange(&self, trades: &mut [Trade]) {
        match self.order {
            TradeOrder::CreatedDesc => trades.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            TradeOrder::ClosedDesc => trades.sort_by(|a, b| {
                b.closed_at
                    .cmp(&a.closed_at)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
        }
    }

    /// The `ORDER BY` clause matching `arrange`.
    pub(crate) fn order_clause(&self) -> &'static str {
        match self.order {
            TradeOrder::CreatedDesc => "created_at DESC",
            TradeOrder::ClosedDesc => "closed_at DESC NULLS LAST, created_at DESC",
        }
    }
}
