pub mod memory;

use crate::error::ExchangeError;
use crate::order_book::{Fill, NewOrder, Order, OrderId, OrderStatus, OwnerId, Trade};
use rust_decimal::Decimal;

pub use memory::InMemoryStore;

/// New remaining quantity and status of one order after a match.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderUpdate {
    pub order_id: OrderId,
    pub remaining: Decimal,
    pub status: OrderStatus,
}

impl From<&Order> for OrderUpdate {
    fn from(order: &Order) -> Self {
        OrderUpdate {
            order_id: order.id,
            remaining: order.remaining,
            status: order.status,
        }
    }
}

/// Authoritative store of orders and trades.
///
/// Every method is a single atomic unit: implementations must never leave part
/// of a call applied when they return an error.
#[async_trait::async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Stores a new `open` order, assigning its id and creation timestamp.
    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError>;

    /// Moves an order to `status`, rejecting transitions out of a terminal state.
    async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), ExchangeError>;

    /// Stores the trades of one match together with the new state of every
    /// order that took part in it.
    async fn record_match(
        &self,
        fills: &[Fill],
        updates: &[OrderUpdate],
    ) -> Result<Vec<Trade>, ExchangeError>;

    /// All open orders, oldest first.
    async fn get_open_orders(&self) -> Result<Vec<Order>, ExchangeError>;

    /// Checks existence, ownership and `open` status, then flips the order to
    /// `canceled`, all under one lock. Returns the canceled order.
    async fn cancel_order(&self, order_id: OrderId, owner: OwnerId)
    -> Result<Order, ExchangeError>;

    async fn get_user_orders(&self, owner: OwnerId) -> Result<Vec<Order>, ExchangeError>;

    /// Trades where either side belongs to `owner`, in execution order.
    async fn get_user_trades(&self, owner: OwnerId) -> Result<Vec<Trade>, ExchangeError>;

    async fn get_all_trades(&self) -> Result<Vec<Trade>, ExchangeError>;
}
