use crate::order_book::{
    BestOrder, BookLevels, BookSnapshot, Order, OrderId, OrderSide, PriceLevel,
};
use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Sort key giving price-time priority inside one side of the book.
///
/// `rank` is the negated price for bids and the price itself for asks, so the
/// natural ascending order of the map is always best-first. The order id only
/// breaks ties between orders created at the same instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct PriorityKey {
    rank: Decimal,
    created_at: DateTime<Utc>,
    id: OrderId,
}

impl PriorityKey {
    fn of(order: &Order) -> Self {
        let rank = match order.side {
            OrderSide::Buy => -order.price,
            OrderSide::Sell => order.price,
        };
        PriorityKey {
            rank,
            created_at: order.created_at,
            id: order.id,
        }
    }
}

/// In-memory limit order book for a single instrument.
///
/// This is a derived cache of the persisted open orders: it is rebuilt from the
/// store on startup and is never the source of truth. It is not synchronized on
/// its own; the owning exchange guards it with a single lock.
#[derive(Clone, Debug, Default)]
pub struct LimitOrderBook {
    bids: BTreeMap<PriorityKey, Order>,
    asks: BTreeMap<PriorityKey, Order>,
    index: HashMap<OrderId, (OrderSide, PriorityKey)>,
}

impl LimitOrderBook {
    pub fn new() -> Self {
        LimitOrderBook::default()
    }

    /// Rebuilds a book by inserting `orders` one at a time, in the order given.
    pub fn from_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let mut book = LimitOrderBook::new();
        for order in orders {
            book.insert(order);
        }
        book
    }

    /// Adds an open order to its side. Re-inserting an id replaces the old entry.
    pub fn insert(&mut self, order: Order) {
        if self.index.contains_key(&order.id) {
            self.remove(order.id);
        }
        let key = PriorityKey::of(&order);
        debug!(
            "Resting order {} {} {} @ {}",
            order.id, order.side, order.remaining, order.price
        );
        self.index.insert(order.id, (order.side, key));
        self.side_mut(order.side).insert(key, order);
    }

    /// Removes an order from whichever side holds it. `None` means the book did
    /// not know the order, which callers should report but not treat as fatal.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let (side, key) = self.index.remove(&order_id)?;
        self.side_mut(side).remove(&key)
    }

    #[cfg(test)]
    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        let (side, key) = self.index.get(&order_id)?;
        self.side(*side).get(key)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            bids: self.bids.values().cloned().collect(),
            asks: self.asks.values().cloned().collect(),
        }
    }

    /// Depth per price, best price first.
    pub fn levels(&self) -> BookLevels {
        BookLevels {
            bids: aggregate(self.bids.values()),
            asks: aggregate(self.asks.values()),
        }
    }

    pub fn best_buy(&self) -> Option<BestOrder> {
        best_order(self.bids.values())
    }

    pub fn best_sell(&self) -> Option<BestOrder> {
        best_order(self.asks.values())
    }

    #[cfg(test)]
    fn side(&self, side: OrderSide) -> &BTreeMap<PriorityKey, Order> {
        match side {
            OrderSide::Buy => &self.bids,
            OrderSide::Sell => &self.asks,
        }
    }

    pub(crate) fn side_mut(&mut self, side: OrderSide) -> &mut BTreeMap<PriorityKey, Order> {
        match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        }
    }
}

fn aggregate<'a>(orders: impl Iterator<Item = &'a Order>) -> Vec<PriceLevel> {
    let mut levels: Vec<PriceLevel> = vec![];
    for order in orders {
        match levels.last_mut() {
            Some(level) if level.price == order.price => {
                level.quantity = level.quantity.saturating_add(order.remaining);
                level.orders += 1;
            }
            _ => levels.push(PriceLevel {
                price: order.price,
                quantity: order.remaining,
                orders: 1,
            }),
        }
    }
    levels
}

/// Collects the best price of a side, summing every order resting at that price.
fn best_order<'a>(mut orders: impl Iterator<Item = &'a Order>) -> Option<BestOrder> {
    let first = orders.next()?;
    let mut best_order = BestOrder {
        price: first.price,
        total_quantity: first.remaining,
    };
    let price = first.price;
    for order in orders.take_while(|order| order.price == price) {
        best_order.total_quantity = best_order.total_quantity.saturating_add(order.remaining);
    }
    Some(best_order)
}
