use crate::orders::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Aggregate of all resting quantity at one price on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub price: Price,
    pub quantity: Quantity,
}

/// Per-level view of both sides of the book, best price first: bids
/// descending, asks ascending.
///
/// A snapshot is derived on demand and never mutates the book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub bids: Vec<LevelInfo>,
    pub asks: Vec<LevelInfo>,
}

impl BookSnapshot {
    pub fn best_bid(&self) -> Option<&LevelInfo> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&LevelInfo> {
        self.asks.first()
    }
}
