use crate::order_book::limit_order_book::LimitOrderBook;
use crate::order_book::{Fill, Order, OrderId};
use log::{debug, warn};
use std::collections::BTreeSet;

/// Everything a single call to [`LimitOrderBook::match_order`] changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchOutcome {
    /// One fill per resting counterparty, in the order they were consumed.
    pub fills: Vec<Fill>,
    /// Orders (resting or incoming) whose remaining quantity reached zero.
    pub filled_order_ids: BTreeSet<OrderId>,
    /// Resting orders as they were before this match touched them.
    pub touched: Vec<Order>,
    /// Whether the incoming order was left resting in the book.
    pub rested: bool,
}

impl MatchOutcome {
    pub fn is_filled(&self, order_id: OrderId) -> bool {
        self.filled_order_ids.contains(&order_id)
    }
}

impl LimitOrderBook {
    /// Crosses `incoming` against the opposite side of the book.
    ///
    /// Resting orders are consumed in priority order while their price crosses the
    /// incoming limit; every fill executes at the resting (maker) price. Filled
    /// resting orders leave the book and any open remainder of `incoming` is
    /// rested on its own side. `incoming` is updated in place.
    pub fn match_order(&mut self, incoming: &mut Order) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        let mut exhausted = vec![];

        for resting in self.side_mut(incoming.side.opposite()).values_mut() {
            if !incoming.is_resting() {
                break;
            }
            if !resting.is_resting() {
                warn!("Skipping stale order {} ({}) in book", resting.id, resting.status);
                exhausted.push(resting.id);
                continue;
            }
            // sides are price sorted, nothing behind a non-crossing order crosses
            if !incoming.side.crosses(incoming.price, resting.price) {
                break;
            }

            let quantity = incoming.remaining.min(resting.remaining);
            outcome.touched.push(resting.clone());
            outcome.fills.push(Fill::new(resting, incoming, quantity));
            debug!(
                "Matched taker {} against maker {}: {} @ {}",
                incoming.id, resting.id, quantity, resting.price
            );

            if resting.fill(quantity) {
                outcome.filled_order_ids.insert(resting.id);
                exhausted.push(resting.id);
            }
            if incoming.fill(quantity) {
                outcome.filled_order_ids.insert(incoming.id);
            }
        }

        for order_id in exhausted {
            self.remove(order_id);
        }

        if incoming.is_resting() {
            self.insert(incoming.clone());
            outcome.rested = true;
        }

        outcome
    }

    /// Undoes `outcome`, putting every touched resting order back exactly where it
    /// was and pulling the incoming order out again if it had rested.
    pub fn rollback(&mut self, incoming_id: OrderId, outcome: &MatchOutcome) {
        if outcome.rested {
            self.remove(incoming_id);
        }
        for order in &outcome.touched {
            self.insert(order.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::order_book::limit_order_book::LimitOrderBook;
    use crate::order_book::limit_order_book::tests::order;
    use crate::order_book::{Fill, OrderSide, OrderStatus};
    use rust_decimal_macros::dec;

    fn scenario_book() -> LimitOrderBook {
        let mut book = LimitOrderBook::new();
        book.insert(order(1, OrderSide::Sell, dec!(50000), dec!(0.1), 1));
        book.insert(order(2, OrderSide::Sell, dec!(50000), dec!(0.05), 2));
        book
    }

    #[test]
    fn earlier_order_wins_at_equal_price() {
        let mut book = scenario_book();
        let mut buy = order(3, OrderSide::Buy, dec!(51000), dec!(0.1), 3);

        let outcome = book.match_order(&mut buy);

        assert_eq!(outcome.fills.len(), 1);
        let fill = &outcome.fills[0];
        assert_eq!(fill.sell_order_id, 1);
        assert_eq!(fill.buy_order_id, 3);
        assert_eq!(fill.price, dec!(50000));
        assert_eq!(fill.quantity, dec!(0.1));
        assert!(outcome.is_filled(1) && outcome.is_filled(3));
        assert_eq!(buy.status, OrderStatus::Filled);
        assert!(!outcome.rested);

        let asks = book.snapshot().asks;
        assert_eq!(asks.len(), 1);
        assert_eq!(asks[0].id, 2);
        assert_eq!(asks[0].remaining, dec!(0.05));
        assert!(book.snapshot().bids.is_empty());
    }

    #[test]
    fn partial_fill_leaves_maker_resting() {
        let mut book = scenario_book();
        let mut buy = order(3, OrderSide::Buy, dec!(50000), dec!(0.02), 3);

        let outcome = book.match_order(&mut buy);

        assert_eq!(outcome.fills.len(), 1);
        assert_eq!(outcome.fills[0].quantity, dec!(0.02));
        assert_eq!(outcome.fills[0].price, dec!(50000));
        assert_eq!(outcome.filled_order_ids.iter().copied().collect::<Vec<_>>(), vec![3]);

        let maker = book.get(1).expect("maker stays in book");
        assert_eq!(maker.remaining, dec!(0.08));
        assert_eq!(maker.status, OrderStatus::Open);
        assert!(book.get(3).is_none(), "filled taker never rests");
    }

    #[test]
    fn non_crossing_order_rests_unchanged() {
        let mut book = scenario_book();
        let mut buy = order(3, OrderSide::Buy, dec!(49000), dec!(0.1), 3);

        let outcome = book.match_order(&mut buy);

        assert!(outcome.fills.is_empty());
        assert!(outcome.filled_order_ids.is_empty());
        assert!(outcome.rested);
        let bids = book.snapshot().bids;
        assert_eq!(bids.len(), 1);
        assert_eq!(bids[0].remaining, dec!(0.1));
        assert_eq!(book.snapshot().asks.len(), 2);
    }

    #[test]
    fn sell_sweeps_bid_levels_best_first() {
        let mut book = LimitOrderBook::new();
        book.insert(order(1, OrderSide::Buy, dec!(100), dec!(4), 1));
        book.insert(order(2, OrderSide::Buy, dec!(100), dec!(5), 2));
        book.insert(order(3, OrderSide::Buy, dec!(101), dec!(1), 3));

        let mut sell = order(4, OrderSide::Sell, dec!(100), dec!(6), 4);
        let outcome = book.match_order(&mut sell);

        let summary: Vec<_> = outcome
            .fills
            .iter()
            .map(|fill: &Fill| (fill.maker_id, fill.taker_id, fill.price, fill.quantity))
            .collect();
        assert_eq!(
            summary,
            vec![
                (3, 4, dec!(101), dec!(1)),
                (1, 4, dec!(100), dec!(4)),
                (2, 4, dec!(100), dec!(1)),
            ]
        );

        let best_buy = book.best_buy().expect("remainder on 100 price level");
        assert_eq!(best_buy.price, dec!(100));
        assert_eq!(best_buy.total_quantity, dec!(4));
        assert!(book.best_sell().is_none(), "no resting sells expected");
    }

    #[test]
    fn remainder_after_sweeping_rests_at_limit() {
        let mut book = LimitOrderBook::new();
        book.insert(order(1, OrderSide::Sell, dec!(100), dec!(5), 1));

        let mut buy = order(2, OrderSide::Buy, dec!(101), dec!(8), 2);
        let outcome = book.match_order(&mut buy);

        assert_eq!(outcome.fills.len(), 1);
        assert!(outcome.rested);
        assert!(book.best_sell().is_none());
        let best_buy = book.best_buy().expect("remainder buy should rest");
        assert_eq!(best_buy.price, dec!(101));
        assert_eq!(best_buy.total_quantity, dec!(3));
        assert_eq!(book.get(2).map(|o| o.side), Some(OrderSide::Buy));
    }

    #[test]
    fn stale_entries_are_skipped_and_dropped() {
        let mut book = LimitOrderBook::new();
        let mut stale = order(1, OrderSide::Sell, dec!(90), dec!(1), 1);
        stale.status = OrderStatus::Canceled;
        book.insert(stale);
        book.insert(order(2, OrderSide::Sell, dec!(95), dec!(1), 2));

        let mut buy = order(3, OrderSide::Buy, dec!(100), dec!(1), 3);
        let outcome = book.match_order(&mut buy);

        assert_eq!(outcome.fills.len(), 1);
        assert_eq!(outcome.fills[0].maker_id, 2);
        assert!(book.is_empty());
    }

    #[test]
    fn repeated_fractional_fills_do_not_drift() {
        let mut book = LimitOrderBook::new();
        book.insert(order(1, OrderSide::Sell, dec!(0.1), dec!(1), 0));

        for id in 2..12 {
            let mut buy = order(id, OrderSide::Buy, dec!(0.3), dec!(0.1), id as i64);
            book.match_order(&mut buy);
        }

        assert!(book.is_empty(), "ten fills of 0.1 consume exactly 1");
    }

    #[test]
    fn rollback_restores_book() {
        let mut book = scenario_book();
        book.insert(order(5, OrderSide::Buy, dec!(40000), dec!(1), 0));
        let before = book.snapshot();

        let mut buy = order(3, OrderSide::Buy, dec!(50000), dec!(0.2), 3);
        let outcome = book.match_order(&mut buy);
        assert!(outcome.rested);
        assert!(book.snapshot().asks.is_empty());

        book.rollback(buy.id, &outcome);
        assert_eq!(book.snapshot(), before);
    }
}
