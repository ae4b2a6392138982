use crate::error::ExchangeError;
use crate::order_book::{
    Fill, NewOrder, Order, OrderId, OrderStatus, OwnerId, Trade, TradeId,
};
use crate::persistence::{OrderUpdate, PersistenceGateway};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct StoreState {
    orders: BTreeMap<OrderId, Order>,
    trades: Vec<Trade>,
    last_order_id: OrderId,
    last_trade_id: TradeId,
    last_timestamp: Option<DateTime<Utc>>,
}

impl StoreState {
    /// Wall clock time, nudged forward so that no two records share a timestamp.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::nanoseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }

    fn order(&self, order_id: OrderId) -> Result<&Order, ExchangeError> {
        self.orders
            .get(&order_id)
            .ok_or(ExchangeError::NotFound { order_id })
    }
}

/// Process-local implementation of [`PersistenceGateway`].
///
/// A single mutex around the whole state makes every call serializable, which
/// is what the cancel check-and-flip and the per-match commit rely on.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }
}

#[async_trait::async_trait]
impl PersistenceGateway for InMemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order, ExchangeError> {
        order.check_amounts().map_err(ExchangeError::Validation)?;

        let mut state = self.state.lock().await;
        state.last_order_id += 1;
        let created = Order {
            id: state.last_order_id,
            owner: order.owner,
            side: order.side,
            price: order.price,
            quantity: order.quantity,
            remaining: order.quantity,
            status: OrderStatus::Open,
            created_at: state.tick(),
        };
        state.orders.insert(created.id, created.clone());
        debug!("Stored order {}", created.id);
        Ok(created)
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), ExchangeError> {
        let mut state = self.state.lock().await;
        let current = state.order(order_id)?.status;
        if !current.can_transition_to(status) {
            return Err(ExchangeError::AlreadyTerminal {
                order_id,
                status: current,
            });
        }
        if let Some(order) = state.orders.get_mut(&order_id) {
            order.status = status;
        }
        Ok(())
    }

    async fn record_match(
        &self,
        fills: &[Fill],
        updates: &[OrderUpdate],
    ) -> Result<Vec<Trade>, ExchangeError> {
        let mut state = self.state.lock().await;

        // validate everything before touching anything
        for fill in fills {
            state.order(fill.buy_order_id)?;
            state.order(fill.sell_order_id)?;
        }
        for update in updates {
            let current = state.order(update.order_id)?.status;
            if current != update.status && !current.can_transition_to(update.status) {
                return Err(ExchangeError::AlreadyTerminal {
                    order_id: update.order_id,
                    status: current,
                });
            }
        }

        for update in updates {
            if let Some(order) = state.orders.get_mut(&update.order_id) {
                order.remaining = update.remaining;
                order.status = update.status;
            }
        }

        let executed_at = state.tick();
        let mut trades = Vec::with_capacity(fills.len());
        for fill in fills {
            state.last_trade_id += 1;
            debug!(
                "Stored trade {}: maker {} taker {} {} @ {}",
                state.last_trade_id, fill.maker_id, fill.taker_id, fill.quantity, fill.price
            );
            trades.push(Trade {
                id: state.last_trade_id,
                buy_order_id: fill.buy_order_id,
                sell_order_id: fill.sell_order_id,
                price: fill.price,
                quantity: fill.quantity,
                executed_at,
            });
        }
        state.trades.extend(trades.iter().cloned());
        Ok(trades)
    }

    async fn get_open_orders(&self) -> Result<Vec<Order>, ExchangeError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| order.status == OrderStatus::Open)
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    async fn cancel_order(
        &self,
        order_id: OrderId,
        owner: OwnerId,
    ) -> Result<Order, ExchangeError> {
        let mut state = self.state.lock().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(ExchangeError::NotFound { order_id })?;
        if order.owner != owner {
            return Err(ExchangeError::NotOwner { order_id });
        }
        if order.status.is_terminal() {
            return Err(ExchangeError::AlreadyTerminal {
                order_id,
                status: order.status,
            });
        }
        order.status = OrderStatus::Canceled;
        Ok(order.clone())
    }

    async fn get_user_orders(&self, owner: OwnerId) -> Result<Vec<Order>, ExchangeError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .filter(|order| order.owner == owner)
            .cloned()
            .collect())
    }

    async fn get_user_trades(&self, owner: OwnerId) -> Result<Vec<Trade>, ExchangeError> {
        let state = self.state.lock().await;
        let owns = |order_id: OrderId| {
            state
                .orders
                .get(&order_id)
                .is_some_and(|order| order.owner == owner)
        };
        Ok(state
            .trades
            .iter()
            .filter(|trade| owns(trade.buy_order_id) || owns(trade.sell_order_id))
            .cloned()
            .collect())
    }

    async fn get_all_trades(&self) -> Result<Vec<Trade>, ExchangeError> {
        Ok(self.state.lock().await.trades.clone())
    }
}
