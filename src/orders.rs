use serde::{Deserialize, Serialize};

/// Price in currency minor units. Zero is reserved as [`INVALID_PRICE`].
pub type Price = u64;

/// Quantity in whole units.
pub type Quantity = u64;

/// Caller-assigned order identifier, unique within the lifetime of a book.
pub type OrderId = u64;

/// Sentinel price carried by a market order before conversion. It never
/// rests in the book and never appears in any output.
pub const INVALID_PRICE: Price = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,  //Bid,
    Sell, //Ask,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Fill-or-kill: filled in full on arrival or rejected; never rests.
    Fok,
    /// Good-till-cancel: rests until filled or cancelled.
    Gtc,
    /// Immediate-or-cancel: fills what it can, the residual is cancelled.
    Ioc,
    /// No limit price; converted to an IOC on arrival.
    Market,
    /// Good-till-cancel, but auto-cancelled at the next market close.
    Day,
}

impl OrderType {
    /// Whether an order of this type may rest on the book after matching.
    pub fn rests(self) -> bool {
        matches!(self, OrderType::Gtc | OrderType::Day)
    }
}

/// A single order. Identity, type and side are fixed at construction; the
/// remaining quantity decreases as the order fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub order_type: OrderType,
    pub side: Side,
    pub price: Price,
    pub initial_quantity: Quantity,
    pub remaining_quantity: Quantity,
}

impl Order {
    pub fn new(
        id: OrderId,
        order_type: OrderType,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            id,
            order_type,
            side,
            price,
            initial_quantity: quantity,
            remaining_quantity: quantity,
        }
    }

    /// A market order carries no limit price; it stays at
    /// [`INVALID_PRICE`] until the book converts it on arrival.
    pub fn market(id: OrderId, side: Side, quantity: Quantity) -> Self {
        Self::new(id, OrderType::Market, side, INVALID_PRICE, quantity)
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.initial_quantity - self.remaining_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// Reduce the remaining quantity by `quantity`.
    ///
    /// # Panics
    ///
    /// Panics if `quantity` exceeds the remainder. Correct matching never
    /// over-fills, so hitting this is a logic bug, not a market state.
    pub fn fill(&mut self, quantity: Quantity) {
        assert!(
            quantity <= self.remaining_quantity,
            "cannot fill more than remaining order quantity"
        );
        self.remaining_quantity -= quantity;
    }

    /// Convert a market order into an IOC limited at `worst_price`, the
    /// least favorable level currently resting on the opposite side.
    ///
    /// # Panics
    ///
    /// Panics when called on anything other than a market order.
    pub fn to_ioc(&mut self, worst_price: Price) {
        assert_eq!(
            self.order_type,
            OrderType::Market,
            "only market orders convert to IOC"
        );
        self.order_type = OrderType::Ioc;
        self.price = worst_price;
    }
}

/// Cancel-replace request: the target order keeps its side and type, the
/// replacement takes this price and quantity and joins the back of its new
/// level's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amendment {
    pub id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
}

impl Amendment {
    pub fn new(id: OrderId, price: Price, quantity: Quantity) -> Self {
        Self {
            id,
            price,
            quantity,
        }
    }

    /// Build the replacement order, inheriting `side` and `order_type`
    /// from the order being amended.
    pub fn to_order(&self, side: Side, order_type: OrderType) -> Order {
        Order::new(self.id, order_type, side, self.price, self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_order() {
        let mut order = Order::new(1, OrderType::Gtc, Side::Buy, 99, 200);
        assert_eq!(order.remaining_quantity, 200);

        order.fill(50);
        assert_eq!(order.remaining_quantity, 150);
        assert_eq!(order.filled_quantity(), 50);
        assert!(!order.is_filled());

        order.fill(150);
        assert_eq!(order.remaining_quantity, 0);
        assert!(order.is_filled());
        assert_eq!(order.initial_quantity, 200);
    }

    #[test]
    #[should_panic(expected = "cannot fill more than remaining")]
    fn overfill_panics() {
        let mut order = Order::new(1, OrderType::Gtc, Side::Buy, 99, 10);
        order.fill(10);
        order.fill(1);
    }

    #[test]
    fn market_order_converts_to_ioc() {
        let mut order = Order::market(1, Side::Sell, 150);
        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.price, INVALID_PRICE);

        order.to_ioc(75);
        assert_eq!(order.order_type, OrderType::Ioc);
        assert_eq!(order.price, 75);
        assert_eq!(order.remaining_quantity, 150);
    }

    #[test]
    #[should_panic(expected = "only market orders convert")]
    fn to_ioc_rejects_non_market() {
        let mut order = Order::new(2, OrderType::Fok, Side::Buy, 80, 100);
        order.to_ioc(50);
    }

    #[test]
    fn amendment_inherits_side_and_type() {
        let replacement = Amendment::new(7, 105, 40).to_order(Side::Sell, OrderType::Day);
        assert_eq!(replacement.id, 7);
        assert_eq!(replacement.side, Side::Sell);
        assert_eq!(replacement.order_type, OrderType::Day);
        assert_eq!(replacement.price, 105);
        assert_eq!(replacement.initial_quantity, 40);
        assert_eq!(replacement.remaining_quantity, 40);
    }

    #[test]
    fn only_gtc_and_day_rest() {
        assert!(OrderType::Gtc.rests());
        assert!(OrderType::Day.rests());
        assert!(!OrderType::Fok.rests());
        assert!(!OrderType::Ioc.rests());
        assert!(!OrderType::Market.rests());
    }
}
