// ============================================================================
// Book Side
// Ordered price levels plus the per-level aggregate cache for one side
// ============================================================================

use std::collections::{BTreeMap, HashMap, VecDeque};

use super::order::{OrderId, Price, Quantity, Side};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Level Aggregate Cache
// ============================================================================

/// Aggregate over one price level: live order count and summed remaining
/// quantity. Kept exactly equal to the level's queue on every mutation so
/// fill-or-kill feasibility is O(levels) instead of O(orders).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelData {
    pub count: u64,
    pub quantity: Quantity,
}

// ============================================================================
// Book Side
// ============================================================================

/// One side of the order book: a price-ordered map of FIFO queues plus the
/// aggregate cache over those queues.
///
/// Queues hold order ids only; the orders themselves live in the engine's
/// order store. Bids iterate best-first by descending price, asks ascending.
/// A price key is removed the instant its queue empties, and the cache entry
/// is removed the instant its count reaches zero.
#[derive(Debug)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, VecDeque<OrderId>>,
    depth: HashMap<Price, LevelData>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            depth: HashMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Best (most aggressive) price: highest bid, lowest ask.
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// Worst (least aggressive) price: lowest bid, highest ask. A market
    /// order is repriced to the opposite side's worst price so it is
    /// guaranteed to cross everything it can.
    pub fn worst_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next().copied(),
            Side::Sell => self.levels.keys().next_back().copied(),
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Append an order id at the tail of its price's queue (time priority)
    /// and record it in the aggregate cache.
    pub fn enqueue(&mut self, price: Price, id: OrderId, quantity: Quantity) {
        self.levels.entry(price).or_default().push_back(id);
        let data = self.depth.entry(price).or_default();
        data.count += 1;
        data.quantity += quantity;
    }

    /// Oldest resting order at `price`.
    pub fn front(&self, price: Price) -> Option<OrderId> {
        self.levels.get(&price).and_then(|queue| queue.front().copied())
    }

    /// Pop the oldest resting order at `price`. Leaves the level key in
    /// place even when the queue empties; the crossing loop defers level
    /// removal until its per-level scan is done.
    pub fn pop_front(&mut self, price: Price) -> Option<OrderId> {
        self.levels.get_mut(&price).and_then(VecDeque::pop_front)
    }

    /// Record a match against this side's level at `price` in the cache:
    /// quantity down by the fill, count down by one when the order completed.
    pub fn record_matched(&mut self, price: Price, quantity: Quantity, fully_filled: bool) {
        self.update_depth(price, quantity, u64::from(fully_filled));
    }

    /// Remove a resting order by id for cancellation, dropping the level if
    /// its queue empties and updating the cache by the order's remaining
    /// quantity. Returns false if the order was not at that price.
    pub fn remove(&mut self, price: Price, id: OrderId, remaining: Quantity) -> bool {
        let Some(queue) = self.levels.get_mut(&price) else {
            return false;
        };
        let Some(position) = queue.iter().position(|&queued| queued == id) else {
            return false;
        };

        queue.remove(position);
        if queue.is_empty() {
            self.levels.remove(&price);
        }
        self.update_depth(price, remaining, 1);
        true
    }

    /// Drop the level key at `price` if its queue is empty. Called by the
    /// crossing loop after the per-level scan so removal never invalidates a
    /// scan in progress.
    pub fn drop_level_if_empty(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(VecDeque::is_empty) {
            self.levels.remove(&price);
        }
    }

    fn update_depth(&mut self, price: Price, quantity_delta: Quantity, count_delta: u64) {
        if let Some(data) = self.depth.get_mut(&price) {
            data.quantity = data.quantity.saturating_sub(quantity_delta);
            data.count = data.count.saturating_sub(count_delta);
            if data.count == 0 {
                self.depth.remove(&price);
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether this side can supply `required` quantity to an order limited
    /// at `limit`, reading only the aggregate cache. Walks levels best to
    /// worst and stops at the first price beyond the limit.
    pub fn can_supply(&self, limit: Price, required: Quantity) -> bool {
        let mut outstanding = required;

        for (price, _) in self.iter_priority() {
            let crosses = match self.side {
                Side::Buy => *price >= limit,
                Side::Sell => *price <= limit,
            };
            if !crosses {
                break;
            }

            let Some(data) = self.depth.get(price) else {
                continue;
            };
            if outstanding <= data.quantity {
                return true;
            }
            outstanding -= data.quantity;
        }

        false
    }

    /// Per-level `(price, quantity)` rows in this side's priority order,
    /// read from the aggregate cache.
    pub fn depth_levels(&self) -> Vec<LevelInfo> {
        self.iter_priority()
            .map(|(price, _)| LevelInfo {
                price: *price,
                quantity: self.depth.get(price).map_or(0, |data| data.quantity),
            })
            .collect()
    }

    /// Iterate levels best-first.
    fn iter_priority(&self) -> Box<dyn Iterator<Item = (&Price, &VecDeque<OrderId>)> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.iter().rev()),
            Side::Sell => Box::new(self.levels.iter()),
        }
    }

    // ========================================================================
    // Test Introspection
    // ========================================================================

    #[cfg(test)]
    pub(crate) fn iter_levels(&self) -> impl Iterator<Item = (&Price, &VecDeque<OrderId>)> {
        self.levels.iter()
    }

    #[cfg(test)]
    pub(crate) fn depth_at(&self, price: Price) -> Option<LevelData> {
        self.depth.get(&price).copied()
    }
}

// ============================================================================
// Order Book Snapshot
// ============================================================================

/// One row of a snapshot: a price level and its total remaining quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LevelInfo {
    pub price: Price,
    pub quantity: Quantity,
}

/// Immutable point-in-time view of both sides of the book, best-first.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderBookSnapshot {
    pub instrument: String,
    /// Bid levels, best (highest) first
    pub bids: Vec<LevelInfo>,
    /// Ask levels, best (lowest) first
    pub asks: Vec<LevelInfo>,
    /// Current spread (best ask - best bid)
    pub spread: Option<Price>,
}

impl OrderBookSnapshot {
    pub fn with_depth(instrument: String, bids: Vec<LevelInfo>, asks: Vec<LevelInfo>) -> Self {
        let spread = match (bids.first(), asks.first()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        };

        Self {
            instrument,
            bids,
            asks,
            spread,
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|level| level.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|level| level.price)
    }

    pub fn total_bid_quantity(&self) -> Quantity {
        self.bids.iter().map(|level| level.quantity).sum()
    }

    pub fn total_ask_quantity(&self) -> Quantity {
        self.asks.iter().map(|level| level.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_best_price() {
        let mut bids = BookSide::new(Side::Buy);
        bids.enqueue(100, 1, 10);
        bids.enqueue(101, 2, 5);

        assert_eq!(bids.best_price(), Some(101));
        assert_eq!(bids.worst_price(), Some(100));

        let mut asks = BookSide::new(Side::Sell);
        asks.enqueue(100, 3, 10);
        asks.enqueue(101, 4, 5);

        assert_eq!(asks.best_price(), Some(100));
        assert_eq!(asks.worst_price(), Some(101));
    }

    #[test]
    fn test_fifo_within_level() {
        let mut asks = BookSide::new(Side::Sell);
        asks.enqueue(100, 1, 10);
        asks.enqueue(100, 2, 10);
        asks.enqueue(100, 3, 10);

        assert_eq!(asks.front(100), Some(1));
        assert_eq!(asks.pop_front(100), Some(1));
        assert_eq!(asks.front(100), Some(2));
    }

    #[test]
    fn test_depth_tracks_enqueue_and_match() {
        let mut asks = BookSide::new(Side::Sell);
        asks.enqueue(100, 1, 10);
        asks.enqueue(100, 2, 5);

        assert_eq!(
            asks.depth_at(100),
            Some(LevelData {
                count: 2,
                quantity: 15,
            })
        );

        // Partial fill: quantity shrinks, count unchanged
        asks.record_matched(100, 4, false);
        assert_eq!(
            asks.depth_at(100),
            Some(LevelData {
                count: 2,
                quantity: 11,
            })
        );

        // Completing fills drop the count, and the entry goes with the level
        asks.record_matched(100, 6, true);
        asks.record_matched(100, 5, true);
        assert_eq!(asks.depth_at(100), None);
    }

    #[test]
    fn test_remove_drops_empty_level() {
        let mut bids = BookSide::new(Side::Buy);
        bids.enqueue(100, 1, 10);
        bids.enqueue(100, 2, 5);

        assert!(bids.remove(100, 1, 10));
        assert_eq!(bids.front(100), Some(2));

        assert!(bids.remove(100, 2, 5));
        assert!(bids.is_empty());
        assert_eq!(bids.depth_at(100), None);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut bids = BookSide::new(Side::Buy);
        bids.enqueue(100, 1, 10);

        assert!(!bids.remove(100, 99, 10));
        assert!(!bids.remove(101, 1, 10));
        assert_eq!(
            bids.depth_at(100),
            Some(LevelData {
                count: 1,
                quantity: 10,
            })
        );
    }

    #[test]
    fn test_can_supply_respects_limit() {
        let mut asks = BookSide::new(Side::Sell);
        asks.enqueue(100, 1, 5);
        asks.enqueue(101, 2, 5);
        asks.enqueue(110, 3, 100);

        // Limit 101 reaches only the first two levels
        assert!(asks.can_supply(101, 10));
        assert!(!asks.can_supply(101, 11));
        // Raising the limit unlocks the deep level
        assert!(asks.can_supply(110, 50));
    }

    #[test]
    fn test_depth_levels_priority_order() {
        let mut bids = BookSide::new(Side::Buy);
        bids.enqueue(99, 1, 1);
        bids.enqueue(101, 2, 2);
        bids.enqueue(100, 3, 3);

        let levels = bids.depth_levels();
        let prices: Vec<Price> = levels.iter().map(|level| level.price).collect();
        assert_eq!(prices, vec![101, 100, 99]);
    }

    #[test]
    fn test_snapshot_spread() {
        let snapshot = OrderBookSnapshot::with_depth(
            "ACME".to_string(),
            vec![LevelInfo {
                price: 100,
                quantity: 6,
            }],
            vec![LevelInfo {
                price: 105,
                quantity: 3,
            }],
        );

        assert_eq!(snapshot.best_bid(), Some(100));
        assert_eq!(snapshot.best_ask(), Some(105));
        assert_eq!(snapshot.spread, Some(5));
        assert_eq!(snapshot.total_bid_quantity(), 6);
        assert_eq!(snapshot.total_ask_quantity(), 3);
    }
}
