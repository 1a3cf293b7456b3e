use crate::levels::{BookSnapshot, LevelInfo};
use crate::orders::{Amendment, INVALID_PRICE, Order, OrderId, OrderType, Price, Quantity, Side};
use crate::trade::{Trade, TradeSide};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{debug, trace};

/// An [`OrderBook`] stores active buy and sell orders in two [`BTreeMap`]s:
/// - `bids` (buy orders)
/// - `asks` (sell orders)
///
/// Each price level (key) holds a FIFO queue of order ids in arrival order,
/// giving **price-time** priority. The orders themselves live in the id
/// index, so a cancel resolves an id to its level in O(log P) without
/// walking the book.
#[derive(Clone)]
pub struct OrderBook {
    /// Buy levels, keyed by price in ascending order.
    ///
    /// For matching, we iterate **in reverse** to find the highest bid first.
    bids: BTreeMap<Price, VecDeque<OrderId>>,

    /// Sell levels, keyed by price in ascending order.
    ///
    /// For matching, we iterate **forwards** to find the lowest ask first.
    asks: BTreeMap<Price, VecDeque<OrderId>>,

    /// Owning index from id to order. Every id queued in `bids`/`asks` has
    /// an entry here, and vice versa.
    orders: HashMap<OrderId, Order>,
}

impl OrderBook {
    /// Creates a new, empty [`OrderBook`], with no active bids or asks.
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: HashMap::new(),
        }
    }

    /// Number of resting orders, both sides combined.
    pub fn size(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Read-only view of a resting order.
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Highest resting buy price.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.last_key_value().map(|(&price, _)| price)
    }

    /// Lowest resting sell price.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first_key_value().map(|(&price, _)| price)
    }

    /// Ids of all resting day orders, for the end-of-day sweep.
    pub fn day_order_ids(&self) -> Vec<OrderId> {
        self.orders
            .values()
            .filter(|order| order.order_type == OrderType::Day)
            .map(|order| order.id)
            .collect()
    }

    /// Submit an order and return the trades it produced.
    ///
    /// Rejections are silent: a duplicate id, a market order with no
    /// opposite liquidity, a FOK that cannot fill in full, and an IOC with
    /// no crossing level all leave the book untouched and return no trades.
    pub fn place_order(&mut self, mut order: Order) -> Vec<Trade> {
        if self.orders.contains_key(&order.id) {
            debug!(id = order.id, "order rejected: id already resident");
            return Vec::new();
        }
        if order.initial_quantity == 0 {
            debug!(id = order.id, "order rejected: zero quantity");
            return Vec::new();
        }
        if order.order_type == OrderType::Market {
            // Convert at the worst opposite level so the order crosses
            // everything resting on the other side.
            let Some(worst) = self.worst_opposite(order.side) else {
                debug!(id = order.id, side = ?order.side, "market order rejected: no opposite liquidity");
                return Vec::new();
            };
            order.to_ioc(worst);
        } else if order.price == INVALID_PRICE {
            debug!(id = order.id, "order rejected: invalid price");
            return Vec::new();
        }

        match order.order_type {
            OrderType::Fok => {
                if self.available_up_to(order.side, order.price) < order.initial_quantity {
                    debug!(id = order.id, "FOK rejected: cannot fill in full");
                    return Vec::new();
                }
            }
            OrderType::Ioc => {
                if !self.can_match(order.side, order.price) {
                    debug!(id = order.id, "IOC rejected: no crossing level");
                    return Vec::new();
                }
            }
            _ => {}
        }
        // A FOK that passed the precheck always fills in full, so only an
        // IOC (market orders included, post-conversion) can leave a residual.
        let cancel_residual = order.order_type == OrderType::Ioc;

        let id = order.id;
        self.insert(order);
        let trades = self.match_orders();
        if cancel_residual {
            self.cancel_order(id);
        }
        trades
    }

    /// Remove a resting order. Cancelling an unknown id is a no-op, so a
    /// racing fill or expiry sweep is harmless.
    pub fn cancel_order(&mut self, id: OrderId) {
        if let Some(order) = self.remove(id) {
            debug!(id, price = order.price, side = ?order.side, "order cancelled");
        }
    }

    /// Cancel-replace: the amended order keeps its side and type, takes the
    /// amendment's price and quantity, and joins the back of its new
    /// level's queue. Time priority is deliberately lost.
    ///
    /// Returns the trades produced by the replacement's placement; amending
    /// an unknown id is a no-op.
    pub fn update_order(&mut self, amendment: Amendment) -> Vec<Trade> {
        let Some(existing) = self.orders.get(&amendment.id) else {
            debug!(id = amendment.id, "amend ignored: unknown order id");
            return Vec::new();
        };
        let (side, order_type) = (existing.side, existing.order_type);
        self.cancel_order(amendment.id);
        self.place_order(amendment.to_order(side, order_type))
    }

    /// Per-level snapshot of both sides, best price first.
    pub fn levels_info(&self) -> BookSnapshot {
        let mut bids = Vec::with_capacity(self.bids.len());
        for (&price, queue) in self.bids.iter().rev() {
            bids.push(self.level_info(price, queue));
        }
        let mut asks = Vec::with_capacity(self.asks.len());
        for (&price, queue) in self.asks.iter() {
            asks.push(self.level_info(price, queue));
        }
        BookSnapshot { bids, asks }
    }

    /// Repeatedly trade the front orders of the best bid and best ask
    /// levels while the two cross, removing filled orders and emptied
    /// levels as it goes.
    ///
    /// Trades come out best-price-first, FIFO within a level, each side
    /// priced at its own resting limit.
    fn match_orders(&mut self) -> Vec<Trade> {
        let mut trades = Vec::new();
        loop {
            let (Some(bid_price), Some(ask_price)) = (self.best_bid(), self.best_ask()) else {
                break;
            };
            if bid_price < ask_price {
                break;
            }

            let heads = self.front_order(Side::Buy, bid_price).zip(self.front_order(Side::Sell, ask_price));
            let Some((buy_id, sell_id)) = heads else {
                break;
            };
            let quantity = match (self.orders.get(&buy_id), self.orders.get(&sell_id)) {
                (Some(buy), Some(sell)) => buy.remaining_quantity.min(sell.remaining_quantity),
                _ => break,
            };

            trace!(
                quantity,
                buy = buy_id,
                sell = sell_id,
                bid = bid_price,
                ask = ask_price,
                "orders matched"
            );
            trades.push(Trade::new(
                quantity,
                TradeSide {
                    order_id: buy_id,
                    price: bid_price,
                },
                TradeSide {
                    order_id: sell_id,
                    price: ask_price,
                },
            ));
            self.apply_fill(buy_id, quantity);
            self.apply_fill(sell_id, quantity);
        }
        trades
    }

    /// Fill `quantity` of the indexed order, dropping it from the book if
    /// that completed it.
    fn apply_fill(&mut self, id: OrderId, quantity: Quantity) {
        let Some(order) = self.orders.get_mut(&id) else {
            return;
        };
        order.fill(quantity);
        if order.is_filled() {
            self.remove(id);
        }
    }

    /// Detach `id` from its level queue and the index. Emptied levels are
    /// pruned so no empty queue is ever left behind a price key.
    fn remove(&mut self, id: OrderId) -> Option<Order> {
        let order = self.orders.remove(&id)?;
        let book_side = match order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(queue) = book_side.get_mut(&order.price) {
            if let Some(pos) = queue.iter().position(|&queued| queued == id) {
                queue.remove(pos);
            }
            if queue.is_empty() {
                book_side.remove(&order.price);
            }
        }
        Some(order)
    }

    /// Append to the tail of the side's queue at the order's price and
    /// register the order in the index.
    fn insert(&mut self, order: Order) {
        let book_side = match order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        book_side.entry(order.price).or_default().push_back(order.id);
        self.orders.insert(order.id, order);
    }

    /// Front of the FIFO queue at `price` on `side`.
    fn front_order(&self, side: Side, price: Price) -> Option<OrderId> {
        let book_side = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        book_side.get(&price).and_then(|queue| queue.front()).copied()
    }

    /// Largest ask for a buy, smallest bid for a sell: the price that lets
    /// a converted market order cross every opposite level.
    fn worst_opposite(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.asks.last_key_value().map(|(&price, _)| price),
            Side::Sell => self.bids.first_key_value().map(|(&price, _)| price),
        }
    }

    /// Whether an order on `side` at `price` would cross the best opposite
    /// level right now.
    fn can_match(&self, side: Side, price: Price) -> bool {
        match side {
            Side::Buy => self.best_ask().is_some_and(|ask| ask <= price),
            Side::Sell => self.best_bid().is_some_and(|bid| bid >= price),
        }
    }

    /// Opposite-side quantity reachable by an order at `price`, walking
    /// levels in match order and stopping at the first that would not
    /// cross. This is the FOK precheck.
    fn available_up_to(&self, side: Side, price: Price) -> Quantity {
        let mut available = 0;
        match side {
            Side::Buy => {
                for (&level, queue) in self.asks.iter() {
                    if level > price {
                        break;
                    }
                    available += self.level_info(level, queue).quantity;
                }
            }
            Side::Sell => {
                for (&level, queue) in self.bids.iter().rev() {
                    if level < price {
                        break;
                    }
                    available += self.level_info(level, queue).quantity;
                }
            }
        }
        available
    }

    fn level_info(&self, price: Price, queue: &VecDeque<OrderId>) -> LevelInfo {
        let quantity = queue
            .iter()
            .filter_map(|id| self.orders.get(id))
            .map(|order| order.remaining_quantity)
            .sum();
        LevelInfo { price, quantity }
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
