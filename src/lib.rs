// ============================================================================
// Orderbook Engine Library
// Single-instrument limit order book with price-time priority matching
// ============================================================================

//! # Orderbook Engine
//!
//! A single-instrument limit order book: it accepts buy/sell order
//! submissions, maintains resting orders ranked by price-time priority,
//! executes crossing trades, and answers point-in-time book snapshots.
//!
//! ## Features
//!
//! - **Price-time priority**: FIFO within each price level
//! - **Order types**: good-till-cancel, fill-and-kill, fill-or-kill, market
//! - **O(1) feasibility checks** via a per-level aggregate cache
//! - **Explicit admission results** distinguishing rejection from a
//!   zero-trade accept
//! - **Linearizable operations**: one guard serializes every public call
//!
//! Callers hand the book already-validated typed order records; network
//! protocols, persistence and risk checks live outside this crate.
//!
//! ## Example
//!
//! ```rust
//! use orderbook_engine::prelude::*;
//! use std::sync::Arc;
//!
//! let book = Orderbook::new("ACME".to_string(), Arc::new(NoOpEventHandler));
//!
//! // Rest a bid, then cross it with a smaller ask
//! book.add_order(Order::new(OrderType::GoodTillCancel, Side::Buy, 100, 10, 1))
//!     .unwrap();
//! let submission = book
//!     .add_order(Order::new(OrderType::GoodTillCancel, Side::Sell, 100, 4, 2))
//!     .unwrap();
//!
//! assert!(submission.is_accepted());
//! assert_eq!(submission.trades.len(), 1);
//! assert_eq!(submission.trades[0].quantity(), 4);
//!
//! let snapshot = book.level_infos();
//! assert_eq!(snapshot.best_bid(), Some(100));
//! assert_eq!(snapshot.bids[0].quantity, 6);
//! ```

pub mod domain;
pub mod engine;
pub mod interfaces;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        LevelData, LevelInfo, Order, OrderBookError, OrderBookResult, OrderBookSnapshot, OrderId,
        OrderType, Price, Quantity, Side, Trade, TradeLeg,
    };
    pub use crate::engine::{AdmissionStatus, Orderbook, RejectReason, Submission};
    pub use crate::interfaces::{EventHandler, LoggingEventHandler, NoOpEventHandler, OrderEvent};
}


#[cfg(test)]
mod property_tests {
    use super::prelude::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    enum Op {
        Submit {
            order_type: OrderType,
            side: Side,
            price: Price,
            quantity: Quantity,
        },
        SubmitMarket {
            side: Side,
            quantity: Quantity,
        },
        Cancel {
            id: OrderId,
        },
    }

    fn side_strategy() -> impl Strategy<Value = Side> {
        prop_oneof![Just(Side::Buy), Just(Side::Sell)]
    }

    fn limit_type_strategy() -> impl Strategy<Value = OrderType> {
        prop_oneof![
            Just(OrderType::GoodTillCancel),
            Just(OrderType::FillAndKill),
            Just(OrderType::FillOrKill),
        ]
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (limit_type_strategy(), side_strategy(), 95i64..=105, 1u64..=20).prop_map(
                |(order_type, side, price, quantity)| Op::Submit {
                    order_type,
                    side,
                    price,
                    quantity,
                }
            ),
            1 => (side_strategy(), 1u64..=20)
                .prop_map(|(side, quantity)| Op::SubmitMarket { side, quantity }),
            1 => (1u64..=80).prop_map(|id| Op::Cancel { id }),
        ]
    }

    proptest! {
        /// After every operation the queues, the aggregate cache and the
        /// order store agree, and the book is never left crossed.
        #[test]
        fn prop_book_invariants_hold(ops in proptest::collection::vec(op_strategy(), 1..80)) {
            let book = Orderbook::new("PROP".to_string(), Arc::new(NoOpEventHandler));

            for (sequence, op) in ops.into_iter().enumerate() {
                let id = sequence as OrderId + 1;
                match op {
                    Op::Submit { order_type, side, price, quantity } => {
                        book.add_order(Order::new(order_type, side, price, quantity, id)).unwrap();
                    },
                    Op::SubmitMarket { side, quantity } => {
                        book.add_order(Order::market(side, quantity, id)).unwrap();
                    },
                    Op::Cancel { id } => book.cancel_order(id),
                }
                book.check_invariants();
            }
        }

        /// A rejected fill-or-kill submission leaves the book byte-for-byte
        /// unchanged; an accepted one fills completely.
        #[test]
        fn prop_fill_or_kill_all_or_nothing(
            resting in proptest::collection::vec(
                (side_strategy(), 95i64..=105, 1u64..=20), 0..25),
            side in side_strategy(),
            price in 95i64..=105,
            quantity in 1u64..=120,
        ) {
            let book = Orderbook::new("PROP".to_string(), Arc::new(NoOpEventHandler));
            for (i, (side, price, quantity)) in resting.into_iter().enumerate() {
                book.add_order(Order::new(
                    OrderType::GoodTillCancel, side, price, quantity, i as OrderId + 1,
                )).unwrap();
            }

            let before = book.level_infos();
            let before_size = book.size();

            let submission = book
                .add_order(Order::new(OrderType::FillOrKill, side, price, quantity, 1000))
                .unwrap();

            match submission.status {
                AdmissionStatus::Accepted => {
                    let matched: Quantity =
                        submission.trades.iter().map(Trade::quantity).sum();
                    prop_assert_eq!(matched, quantity);
                },
                AdmissionStatus::Rejected(_) => {
                    prop_assert!(submission.trades.is_empty());
                    let after = book.level_infos();
                    prop_assert_eq!(before.bids, after.bids);
                    prop_assert_eq!(before.asks, after.asks);
                    prop_assert_eq!(before_size, book.size());
                },
            }
            book.check_invariants();
        }

        /// Both legs of every trade carry the same quantity, and no order is
        /// ever matched for more than it was submitted with.
        #[test]
        fn prop_quantity_conserved(
            resting in proptest::collection::vec((95i64..=105, 1u64..=20), 1..25),
            price in 95i64..=105,
            quantity in 1u64..=200,
        ) {
            let book = Orderbook::new("PROP".to_string(), Arc::new(NoOpEventHandler));
            for (i, (level, resting_quantity)) in resting.iter().enumerate() {
                book.add_order(Order::new(
                    OrderType::GoodTillCancel, Side::Sell, *level, *resting_quantity,
                    i as OrderId + 1,
                )).unwrap();
            }

            let submission = book
                .add_order(Order::new(OrderType::GoodTillCancel, Side::Buy, price, quantity, 1000))
                .unwrap();

            let mut taker_total = 0u64;
            for trade in &submission.trades {
                prop_assert_eq!(trade.bid.quantity, trade.ask.quantity);
                taker_total += trade.quantity();
            }
            prop_assert!(taker_total <= quantity);
            book.check_invariants();
        }
    }
}
