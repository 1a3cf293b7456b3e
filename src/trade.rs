use crate::orders::{OrderId, Price, Quantity};
use serde::{Deserialize, Serialize};

/// One side's view of a fill: which order traded and at which price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSide {
    pub order_id: OrderId,
    pub price: Price,
}

/// A trade represents a matched transaction between two orders.
///
/// Each side keeps its own execution price: the bid level the buy traded at
/// and the ask level the sell traded at. The two coincide whenever both
/// orders sat at the same price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub quantity: Quantity,
    pub buy: TradeSide,
    pub sell: TradeSide,
}

impl Trade {
    pub fn new(quantity: Quantity, buy: TradeSide, sell: TradeSide) -> Self {
        Self {
            quantity,
            buy,
            sell,
        }
    }
}
