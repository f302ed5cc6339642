use crate::structs::TradeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("A trade needs at least one valid entry price")]
    NoValidEntryPrice,

    #[error("Trade {0} is closed and can no longer be modified")]
    TradeClosed(TradeId),
}
