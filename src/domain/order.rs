// ============================================================================
// Order Domain Model
// ============================================================================

use super::errors::{OrderBookError, OrderBookResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

/// Caller-assigned order identifier, unique among currently-live orders.
pub type OrderId = u64;

/// Price in integer ticks. Signed so bids and asks share one key space.
pub type Price = i64;

/// Quantity in integer lots.
pub type Quantity = u64;

/// Placeholder price carried by market orders until admission resolves them.
pub const INVALID_PRICE: Price = Price::MIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderType {
    /// Rests in the book until filled or cancelled
    GoodTillCancel,
    /// Immediate-or-cancel: executes what it can, never rests
    FillAndKill,
    /// Fills entirely and immediately, or is rejected with no effect
    FillOrKill,
    /// Priced at admission to cross everything on the opposite side
    Market,
}

// ============================================================================
// Order Entity
// ============================================================================

/// A single resting or transient order.
///
/// Identity and terms are immutable; the engine is the only mutator of the
/// remaining quantity (monotonically decreasing via [`Order::fill`]) and of
/// the one-time market-order reprice ([`Order::to_good_till_cancel`]).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Order {
    id: OrderId,
    side: Side,
    order_type: OrderType,
    price: Price,
    initial_quantity: Quantity,
    remaining_quantity: Quantity,
}

impl Order {
    pub fn new(
        order_type: OrderType,
        side: Side,
        price: Price,
        quantity: Quantity,
        id: OrderId,
    ) -> Self {
        Self {
            id,
            side,
            order_type,
            price,
            initial_quantity: quantity,
            remaining_quantity: quantity,
        }
    }

    /// Create a market order. Its price is a placeholder until the engine
    /// reprices it during admission.
    pub fn market(side: Side, quantity: Quantity, id: OrderId) -> Self {
        Self::new(OrderType::Market, side, INVALID_PRICE, quantity, id)
    }

    // ========================================================================
    // Getters
    // ========================================================================

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn initial_quantity(&self) -> Quantity {
        self.initial_quantity
    }

    pub fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.initial_quantity - self.remaining_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    // ========================================================================
    // Engine Operations
    // ========================================================================

    /// Decrement the remaining quantity by `quantity`.
    ///
    /// # Errors
    /// Returns [`OrderBookError::Overfill`] if `quantity` exceeds the
    /// remaining quantity. The crossing loop always fills at
    /// `min(bid.remaining, ask.remaining)`, so this firing indicates a broken
    /// engine invariant rather than bad caller input.
    pub fn fill(&mut self, quantity: Quantity) -> OrderBookResult<()> {
        if quantity > self.remaining_quantity {
            return Err(OrderBookError::Overfill {
                order_id: self.id,
                requested: quantity,
                remaining: self.remaining_quantity,
            });
        }

        self.remaining_quantity -= quantity;
        Ok(())
    }

    /// Convert a market order into a good-till-cancel order pinned at `price`.
    ///
    /// Used exactly once, during admission, so the order crosses the spread
    /// as if it were a marketable limit order.
    ///
    /// # Errors
    /// Returns [`OrderBookError::RepriceNonMarket`] if the order is not a
    /// market order.
    pub fn to_good_till_cancel(&mut self, price: Price) -> OrderBookResult<()> {
        if self.order_type != OrderType::Market {
            return Err(OrderBookError::RepriceNonMarket { order_id: self.id });
        }

        self.order_type = OrderType::GoodTillCancel;
        self.price = price;
        Ok(())
    }
}
