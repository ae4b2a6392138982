use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type OrderId = u64;
pub type OwnerId = u64;
pub type TradeId = u64;

#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// Whether a resting order at `resting` can trade against an incoming order of
    /// this side limited at `limit`.
    pub fn crosses(self, limit: Decimal, resting: Decimal) -> bool {
        match self {
            OrderSide::Buy => resting <= limit,
            OrderSide::Sell => resting >= limit,
        }
    }
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            other => Err(format!("side must be 'buy' or 'sell', got '{other}'")),
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("buy"),
            OrderSide::Sell => f.write_str("sell"),
        }
    }
}

/// Lifecycle of an order. `Filled` and `Canceled` are terminal.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Filled,
    Canceled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        match self {
            OrderStatus::Open => false,
            OrderStatus::Filled | OrderStatus::Canceled => true,
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        match (self, next) {
            (OrderStatus::Open, OrderStatus::Filled) => true,
            (OrderStatus::Open, OrderStatus::Canceled) => true,
            (OrderStatus::Open, OrderStatus::Open) => false,
            (OrderStatus::Filled, _) | (OrderStatus::Canceled, _) => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Open => f.write_str("open"),
            OrderStatus::Filled => f.write_str("filled"),
            OrderStatus::Canceled => f.write_str("canceled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: OwnerId,
    pub side: OrderSide,
    pub price: Decimal,
    /// Quantity originally submitted.
    pub quantity: Decimal,
    pub remaining: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn is_resting(&self) -> bool {
        self.status == OrderStatus::Open && self.remaining > Decimal::ZERO
    }

    /// Takes `quantity` off the remaining amount, marking the order filled once
    /// nothing is left. Returns true if this fill completed the order.
    pub(crate) fn fill(&mut self, quantity: Decimal) -> bool {
        self.remaining -= quantity;
        if self.remaining <= Decimal::ZERO {
            self.remaining = Decimal::ZERO;
            self.status = OrderStatus::Filled;
            return true;
        }
        false
    }
}

/// Largest price or quantity a single order may carry.
pub const MAX_ORDER_AMOUNT: u64 = 1_000_000_000_000;

/// Validated order request, not yet persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub owner: OwnerId,
    pub side: OrderSide,
    pub price: Decimal,
    pub quantity: Decimal,
}

impl NewOrder {
    /// Price and quantity must both lie in `(0, MAX_ORDER_AMOUNT]`.
    pub fn check_amounts(&self) -> Result<(), String> {
        let limit = Decimal::from(MAX_ORDER_AMOUNT);
        for (name, value) in [("price", self.price), ("quantity", self.quantity)] {
            if value <= Decimal::ZERO {
                return Err(format!("{name} must be positive"));
            }
            if value > limit {
                return Err(format!("{name} must not exceed {limit}"));
            }
        }
        Ok(())
    }
}

/// A crossing produced by the matching engine before it has been persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct Fill {
    pub maker_id: OrderId,
    pub taker_id: OrderId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Decimal,
    pub quantity: Decimal,
}

impl Fill {
    pub fn new(maker: &Order, taker: &Order, quantity: Decimal) -> Self {
        let (buy_order_id, sell_order_id) = match taker.side {
            OrderSide::Buy => (taker.id, maker.id),
            OrderSide::Sell => (maker.id, taker.id),
        };
        Fill {
            maker_id: maker.id,
            taker_id: taker.id,
            buy_order_id,
            sell_order_id,
            price: maker.price,
            quantity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trade {
    pub id: TradeId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Decimal,
    pub quantity: Decimal,
    pub executed_at: DateTime<Utc>,
}

/// Both sides of a book in priority order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BookSnapshot {
    pub bids: Vec<Order>,
    pub asks: Vec<Order>,
}

/// Aggregated quantity resting at one price.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub quantity: Decimal,
    pub orders: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BookLevels {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BestOrder {
    pub price: Decimal,
    pub total_quantity: Decimal,
}
