use crate::error::ExchangeError;
use crate::exchange::{Exchange, OrderRequest, PlacedOrder};
use crate::order_book::{
    BestOrder, BookLevels, BookSnapshot, LimitOrderBook, MatchOutcome, NewOrder, Order, OrderId,
    OrderSide, OrderStatus, OwnerId, Trade,
};
use crate::persistence::{OrderUpdate, PersistenceGateway};
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Single instrument exchange backed by a [`PersistenceGateway`].
///
/// The book is guarded by one lock that every submission and cancellation holds
/// in write mode for its whole duration, so no two of them ever interleave.
/// The store stays the source of truth; the book only mirrors its open orders.
pub struct MatchingExchange<G: PersistenceGateway> {
    gateway: Arc<G>,
    book: RwLock<LimitOrderBook>,
}

impl<G: PersistenceGateway> MatchingExchange<G> {
    /// Rebuilds the book from the persisted open orders, oldest first.
    pub async fn restore(gateway: Arc<G>) -> Result<Self, ExchangeError> {
        let open_orders = gateway.get_open_orders().await?;
        let book = LimitOrderBook::from_orders(open_orders);
        if book.is_empty() {
            info!("No open orders found, starting with an empty book");
        } else {
            info!("Loaded {} open orders into the book", book.len());
        }

        Ok(MatchingExchange {
            gateway,
            book: RwLock::new(book),
        })
    }

    /// Placing an order internal handler.
    async fn place_order_internal(&self, new_order: NewOrder) -> Result<PlacedOrder, ExchangeError> {
        let mut book = self.book.write().await;

        let mut order = self.gateway.create_order(new_order).await?;
        let outcome = book.match_order(&mut order);
        if outcome.fills.is_empty() {
            info!("Order {} resting without trades", order.id);
            return Ok(PlacedOrder {
                order,
                trades: vec![],
            });
        }

        let updates = participant_updates(&order, &outcome);
        match self.gateway.record_match(&outcome.fills, &updates).await {
            Ok(trades) => {
                info!(
                    "Order {} produced {} trades, {} orders filled{}",
                    order.id,
                    trades.len(),
                    outcome.filled_order_ids.len(),
                    if outcome.is_filled(order.id) { ", taker complete" } else { "" }
                );
                Ok(PlacedOrder { order, trades })
            }
            Err(err) => {
                error!("Failed to persist match for order {}: {err}", order.id);
                book.rollback(order.id, &outcome);
                // nothing of this submission may stay live, the client resubmits
                if let Err(cancel_err) = self
                    .gateway
                    .update_order_status(order.id, OrderStatus::Canceled)
                    .await
                {
                    error!("Failed to withdraw order {}: {cancel_err}", order.id);
                }
                Err(err)
            }
        }
    }

    async fn cancel_order_internal(
        &self,
        owner: OwnerId,
        order_id: OrderId,
    ) -> Result<Order, ExchangeError> {
        let mut book = self.book.write().await;

        let order = self.gateway.cancel_order(order_id, owner).await?;
        if book.remove(order_id).is_none() {
            // non-fatal, the store is the source of truth
            warn!("Order {order_id} not found in order book");
        }
        info!("Canceled order {order_id} with {} remaining", order.remaining);
        Ok(order)
    }
}

/// State every participant of a match must be persisted with: the taker as it
/// is now, and each maker as its pre-match image minus the quantity it traded.
fn participant_updates(taker: &Order, outcome: &MatchOutcome) -> Vec<OrderUpdate> {
    let mut updates = Vec::with_capacity(outcome.touched.len() + 1);
    updates.push(OrderUpdate::from(taker));
    for (maker, fill) in outcome.touched.iter().zip(&outcome.fills) {
        let mut maker = maker.clone();
        maker.fill(fill.quantity);
        updates.push(OrderUpdate::from(&maker));
    }
    updates
}

#[async_trait::async_trait]
impl<G: PersistenceGateway + 'static> Exchange for MatchingExchange<G> {
    async fn place_order(
        &self,
        owner: OwnerId,
        request: OrderRequest,
    ) -> Result<PlacedOrder, ExchangeError> {
        let new_order = request.validate(owner)?;
        self.place_order_internal(new_order).await
    }

    async fn cancel_order(
        &self,
        owner: OwnerId,
        order_id: OrderId,
    ) -> Result<Order, ExchangeError> {
        self.cancel_order_internal(owner, order_id).await
    }

    async fn order_book(&self) -> Result<BookSnapshot, ExchangeError> {
        let open_orders = self.gateway.get_open_orders().await?;
        Ok(LimitOrderBook::from_orders(open_orders).snapshot())
    }

    async fn live_book(&self) -> BookSnapshot {
        self.book.read().await.snapshot()
    }

    async fn live_levels(&self) -> BookLevels {
        self.book.read().await.levels()
    }

    async fn best_order(&self, side: OrderSide) -> Option<BestOrder> {
        let book = self.book.read().await;
        match side {
            OrderSide::Buy => book.best_buy(),
            OrderSide::Sell => book.best_sell(),
        }
    }

    async fn user_orders(&self, owner: OwnerId) -> Result<Vec<Order>, ExchangeError> {
        self.gateway.get_user_orders(owner).await
    }

    async fn user_trades(&self, owner: OwnerId) -> Result<Vec<Trade>, ExchangeError> {
        self.gateway.get_user_trades(owner).await
    }

    async fn all_trades(&self) -> Result<Vec<Trade>, ExchangeError> {
        self.gateway.get_all_trades().await
    }
}
