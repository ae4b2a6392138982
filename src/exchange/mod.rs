pub mod matching_exchange;

use crate::error::ExchangeError;
use crate::order_book::{
    BestOrder, BookLevels, BookSnapshot, NewOrder, Order, OrderId, OrderSide, OwnerId, Trade,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use matching_exchange::MatchingExchange;

/// Order submission as received from a client.
#[derive(Clone, Debug, Deserialize)]
pub struct OrderRequest {
    pub side: String,
    pub price: Decimal,
    pub quantity: Decimal,
}

impl OrderRequest {
    pub fn validate(self, owner: OwnerId) -> Result<NewOrder, ExchangeError> {
        let side: OrderSide = self.side.parse().map_err(ExchangeError::Validation)?;
        let new_order = NewOrder {
            owner,
            side,
            price: self.price,
            quantity: self.quantity,
        };
        new_order.check_amounts().map_err(ExchangeError::Validation)?;
        Ok(new_order)
    }
}

/// A persisted order together with the trades it produced on arrival.
#[derive(Clone, Debug, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub trades: Vec<Trade>,
}

#[async_trait::async_trait]
pub trait Exchange: Send + Sync {
    /// Persists and matches a new order for `owner`.
    async fn place_order(
        &self,
        owner: OwnerId,
        request: OrderRequest,
    ) -> Result<PlacedOrder, ExchangeError>;

    /// Cancels an open order owned by `owner`.
    async fn cancel_order(&self, owner: OwnerId, order_id: OrderId)
    -> Result<Order, ExchangeError>;

    /// Book rebuilt from the store, consistent with everything committed so far.
    async fn order_book(&self) -> Result<BookSnapshot, ExchangeError>;

    /// Current in-memory book. Best-effort, may trail the store briefly.
    async fn live_book(&self) -> BookSnapshot;

    /// Aggregated depth of the in-memory book.
    async fn live_levels(&self) -> BookLevels;

    /// Best price on `side` of the in-memory book, with every order resting at
    /// that price summed into the quantity.
    async fn best_order(&self, side: OrderSide) -> Option<BestOrder>;

    async fn user_orders(&self, owner: OwnerId) -> Result<Vec<Order>, ExchangeError>;

    /// Trades involving `owner` on either side, in execution order.
    async fn user_trades(&self, owner: OwnerId) -> Result<Vec<Trade>, ExchangeError>;

    async fn all_trades(&self) -> Result<Vec<Trade>, ExchangeError>;
}

#[cfg(test)]
mod tests {
    use super::OrderRequest;
    use crate::error::ExchangeError;
    use crate::order_book::OrderSide;
    use rust_decimal_macros::dec;

    fn request(side: &str, price: rust_decimal::Decimal, quantity: rust_decimal::Decimal) -> OrderRequest {
        OrderRequest {
            side: side.to_string(),
            price,
            quantity,
        }
    }

    #[test]
    fn amounts_up_to_the_limit_are_accepted() {
        let order = request("buy", dec!(1000000000000), dec!(1000000000000))
            .validate(1)
            .unwrap();
        assert_eq!(order.quantity, dec!(1000000000000));
    }

    #[test]
    fn valid_request_carries_owner() {
        let order = request("sell", dec!(50000.5), dec!(0.25)).validate(9).unwrap();
        assert_eq!(order.owner, 9);
        assert_eq!(order.side, OrderSide::Sell);
        assert_eq!(order.price, dec!(50000.5));
    }

    #[test]
    fn malformed_requests_are_rejected() {
        for bad in [
            request("hold", dec!(1), dec!(1)),
            request("BUY", dec!(1), dec!(1)),
            request("buy", dec!(0), dec!(1)),
            request("buy", dec!(1), dec!(-1)),
            request("buy", dec!(1), dec!(1000000000000.5)),
            request("sell", dec!(1000000000001), dec!(1)),
        ] {
            assert!(matches!(bad.validate(1), Err(ExchangeError::Validation(_))));
        }
    }

    #[test]
    fn decimal_strings_and_numbers_deserialize() {
        let parsed: OrderRequest =
            serde_json::from_str(r#"{"side":"buy","price":"50000.10","quantity":0.5}"#).unwrap();
        assert_eq!(parsed.price, dec!(50000.10));
        assert_eq!(parsed.quantity, dec!(0.5));
    }
}
