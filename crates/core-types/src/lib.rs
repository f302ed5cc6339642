//! # Tradebook Core Types
//!
//! The shared vocabulary of the workspace: the `Trade` record, its lifecycle,
//! and the small value types (`Direction`, `Ratio`, `UserContext`) every other
//! crate speaks. This crate has no knowledge of storage or presentation.

pub mod enums;
pub mod error;
pub mod ratio;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Direction, Indicator, Timeframe, TradeStatus};
pub use error::CoreError;
pub use ratio::Ratio;
pub use structs::{
    Indicators, NewTrade, Trade, TradeDetails, TradeId, TradeUpdate, UserContext, UserId,
    effective_quantity,
};
