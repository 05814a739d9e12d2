// ============================================================================
// Orderbook
// Admission, crossing loop and cancellation for a single instrument
// ============================================================================

use crate::domain::{
    BookSide, Order, OrderBookError, OrderBookResult, OrderBookSnapshot, OrderId, OrderType,
    Price, Quantity, Side, Trade, TradeLeg,
};
use crate::interfaces::{EventHandler, OrderEvent};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Admission Result
// ============================================================================

/// Why an order was turned away without touching the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RejectReason {
    /// An order with the same id is already live
    DuplicateId,
    /// Market order with nothing resting on the opposite side
    NoLiquidity,
    /// Fill-or-kill order that the opposite side cannot fully fill
    CannotFullyFill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AdmissionStatus {
    Accepted,
    Rejected(RejectReason),
}

/// Outcome of one submission: whether the order was admitted, and the trades
/// the crossing loop produced. A rejected submission never carries trades,
/// but an accepted one may carry none (the order rested without crossing).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Submission {
    pub status: AdmissionStatus,
    pub trades: Vec<Trade>,
}

impl Submission {
    fn accepted(trades: Vec<Trade>) -> Self {
        Self {
            status: AdmissionStatus::Accepted,
            trades,
        }
    }

    fn rejected(reason: RejectReason) -> Self {
        Self {
            status: AdmissionStatus::Rejected(reason),
            trades: Vec::new(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == AdmissionStatus::Accepted
    }
}

// ============================================================================
// Book Interior
// ============================================================================

/// Everything behind the guard. Orders are owned by the `orders` store; the
/// side queues hold ids only, and an order's price locates its level, so the
/// store doubles as the id index. All three views are updated in the same
/// critical section on every insert, fill and cancel.
struct BookInner {
    bids: BookSide,
    asks: BookSide,
    orders: HashMap<OrderId, Order>,
}

impl BookInner {
    fn new() -> Self {
        Self {
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            orders: HashMap::new(),
        }
    }

    fn book_side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// True iff `price` crosses the opposite side's best price.
    fn can_match(&self, side: Side, price: Price) -> bool {
        match side {
            Side::Buy => self.asks.best_price().is_some_and(|ask| price >= ask),
            Side::Sell => self.bids.best_price().is_some_and(|bid| price <= bid),
        }
    }

    /// Fill-or-kill feasibility from the aggregate cache alone. Exact, never
    /// optimistic: the cache equals the true resting quantities at all times.
    fn can_fully_fill(&self, side: Side, price: Price, quantity: Quantity) -> bool {
        if !self.can_match(side, price) {
            return false;
        }

        match side {
            Side::Buy => self.asks.can_supply(price, quantity),
            Side::Sell => self.bids.can_supply(price, quantity),
        }
    }

    /// The crossing loop: the sole producer of trades. Matches queue-front
    /// makers at the best bid and ask while the market is crossed or locked,
    /// then removes any level a fill drained. Empty-level removal is deferred
    /// to after the per-level scan, and a no-cross invocation returns an
    /// empty list without mutating anything.
    fn match_orders(&mut self) -> OrderBookResult<Vec<Trade>> {
        let mut trades = Vec::new();

        loop {
            let (Some(bid_price), Some(ask_price)) =
                (self.bids.best_price(), self.asks.best_price())
            else {
                break;
            };
            if bid_price < ask_price {
                break;
            }

            while let (Some(bid_id), Some(ask_id)) =
                (self.bids.front(bid_price), self.asks.front(ask_price))
            {
                let bid_remaining = self.remaining(bid_id)?;
                let ask_remaining = self.remaining(ask_id)?;
                let quantity = bid_remaining.min(ask_remaining);

                let bid_filled = self.fill_order(bid_id, quantity)?;
                let ask_filled = self.fill_order(ask_id, quantity)?;

                if bid_filled {
                    self.bids.pop_front(bid_price);
                    self.orders.remove(&bid_id);
                }
                self.bids.record_matched(bid_price, quantity, bid_filled);

                if ask_filled {
                    self.asks.pop_front(ask_price);
                    self.orders.remove(&ask_id);
                }
                self.asks.record_matched(ask_price, quantity, ask_filled);

                trades.push(Trade::new(
                    TradeLeg {
                        order_id: bid_id,
                        price: bid_price,
                        quantity,
                    },
                    TradeLeg {
                        order_id: ask_id,
                        price: ask_price,
                        quantity,
                    },
                ));
            }

            self.bids.drop_level_if_empty(bid_price);
            self.asks.drop_level_if_empty(ask_price);
        }

        Ok(trades)
    }

    fn remaining(&self, id: OrderId) -> OrderBookResult<Quantity> {
        self.orders
            .get(&id)
            .map(Order::remaining_quantity)
            .ok_or(OrderBookError::UnknownOrder { order_id: id })
    }

    /// Fill `quantity` against the stored order; returns whether it is now
    /// fully filled.
    fn fill_order(&mut self, id: OrderId, quantity: Quantity) -> OrderBookResult<bool> {
        let order = self
            .orders
            .get_mut(&id)
            .ok_or(OrderBookError::UnknownOrder { order_id: id })?;
        order.fill(quantity)?;
        Ok(order.is_filled())
    }

    /// Drop a resting order from its queue, the aggregate cache and the
    /// order store in one step. No-op when the id is not live.
    fn remove_resting(&mut self, id: OrderId) -> Option<Order> {
        let order = self.orders.remove(&id)?;
        self.book_side_mut(order.side())
            .remove(order.price(), id, order.remaining_quantity());
        Some(order)
    }
}

// ============================================================================
// Orderbook
// ============================================================================

/// A single-instrument limit order book with price-time priority matching.
///
/// One mutex serializes every public operation; critical sections are
/// synchronous and bounded by the number of price levels crossed, and the
/// guard is non-reentrant, so event handlers must not call back into the
/// book.
pub struct Orderbook {
    instrument: Arc<String>,
    inner: Mutex<BookInner>,
    event_handler: Arc<dyn EventHandler>,
}

impl Orderbook {
    pub fn new(instrument: String, event_handler: Arc<dyn EventHandler>) -> Self {
        Self {
            instrument: Arc::new(instrument),
            inner: Mutex::new(BookInner::new()),
            event_handler,
        }
    }

    /// Submit an order.
    ///
    /// Admission runs in one critical section: duplicate suppression, market
    /// price resolution, fill-or-kill feasibility, book insertion, then the
    /// crossing loop. A fill-and-kill order with residual quantity after
    /// crossing is removed before returning; it never rests. A rejected
    /// order leaves the book untouched.
    ///
    /// # Errors
    /// Only fatal invariant violations ([`OrderBookError`]) are errors;
    /// routine rejections come back as
    /// [`AdmissionStatus::Rejected`] inside an `Ok` submission.
    pub fn add_order(&self, mut order: Order) -> OrderBookResult<Submission> {
        let mut events = Vec::new();
        let mut inner = self.inner.lock();

        let id = order.id();
        if inner.orders.contains_key(&id) {
            drop(inner);
            return Ok(self.reject(id, RejectReason::DuplicateId));
        }

        if order.order_type() == OrderType::Market {
            let worst = match order.side() {
                Side::Buy => inner.asks.worst_price(),
                Side::Sell => inner.bids.worst_price(),
            };
            match worst {
                Some(price) => order.to_good_till_cancel(price)?,
                None => {
                    drop(inner);
                    return Ok(self.reject(id, RejectReason::NoLiquidity));
                },
            }
        }

        if order.order_type() == OrderType::FillOrKill
            && !inner.can_fully_fill(order.side(), order.price(), order.remaining_quantity())
        {
            drop(inner);
            return Ok(self.reject(id, RejectReason::CannotFullyFill));
        }

        let side = order.side();
        let price = order.price();
        let order_type = order.order_type();
        inner
            .book_side_mut(side)
            .enqueue(price, id, order.initial_quantity());
        inner.orders.insert(id, order);

        events.push(OrderEvent::OrderAccepted {
            order_id: id,
            timestamp: Utc::now(),
        });

        let trades = inner.match_orders()?;
        for trade in &trades {
            events.push(OrderEvent::OrderMatched {
                trade: trade.clone(),
                timestamp: Utc::now(),
            });
        }

        // Fill-and-kill never rests: whatever the crossing loop left is cut
        if order_type == OrderType::FillAndKill && inner.orders.contains_key(&id) {
            inner.remove_resting(id);
            events.push(OrderEvent::OrderCancelled {
                order_id: id,
                timestamp: Utc::now(),
            });
        }

        drop(inner);
        self.event_handler.on_events(events);

        Ok(Submission::accepted(trades))
    }

    /// Cancel a resting order by id. No-op when the id is not live; never
    /// produces trades.
    pub fn cancel_order(&self, id: OrderId) {
        let mut inner = self.inner.lock();
        if inner.remove_resting(id).is_none() {
            return;
        }
        drop(inner);

        self.event_handler.on_event(OrderEvent::OrderCancelled {
            order_id: id,
            timestamp: Utc::now(),
        });
    }

    /// Point-in-time view of both sides, best-first, taken under the guard.
    pub fn level_infos(&self) -> OrderBookSnapshot {
        let inner = self.inner.lock();
        OrderBookSnapshot::with_depth(
            (*self.instrument).clone(),
            inner.bids.depth_levels(),
            inner.asks.depth_levels(),
        )
    }

    /// Count of live orders.
    pub fn size(&self) -> usize {
        self.inner.lock().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Best ask minus best bid, when both sides are populated.
    pub fn spread(&self) -> Option<Price> {
        let inner = self.inner.lock();
        match (inner.bids.best_price(), inner.asks.best_price()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    fn reject(&self, order_id: OrderId, reason: RejectReason) -> Submission {
        self.event_handler.on_event(OrderEvent::OrderRejected {
            order_id,
            reason,
            timestamp: Utc::now(),
        });
        Submission::rejected(reason)
    }
}

// ============================================================================
// Test Introspection
// ============================================================================

#[cfg(test)]
impl Orderbook {
    /// Assert the three redundant views agree: every queue entry resolves in
    /// the order store, every cache entry equals its queue's aggregate, no
    /// level is empty, and the best bid sits strictly below the best ask.
    pub(crate) fn check_invariants(&self) {
        let inner = self.inner.lock();
        let mut queued_total = 0usize;

        for side in [&inner.bids, &inner.asks] {
            for (price, queue) in side.iter_levels() {
                assert!(!queue.is_empty(), "empty level left at {price}");

                let mut count = 0u64;
                let mut quantity = 0u64;
                for id in queue {
                    let order = inner
                        .orders
                        .get(id)
                        .unwrap_or_else(|| panic!("order {id} queued but not stored"));
                    assert_eq!(order.price(), *price);
                    assert_eq!(order.side(), side.side());
                    assert!(!order.is_filled(), "filled order {id} left resting");
                    count += 1;
                    quantity += order.remaining_quantity();
                }

                let data = side
                    .depth_at(*price)
                    .unwrap_or_else(|| panic!("no depth entry for level {price}"));
                assert_eq!(data.count, count, "depth count diverged at {price}");
                assert_eq!(data.quantity, quantity, "depth quantity diverged at {price}");

                queued_total += count as usize;
            }
        }

        assert_eq!(queued_total, inner.orders.len());

        if let (Some(bid), Some(ask)) = (inner.bids.best_price(), inner.asks.best_price()) {
            assert!(bid < ask, "crossed book left behind: bid {bid} >= ask {ask}");
        }
    }
}
