// ============================================================================
// Trade Domain Model
// ============================================================================

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::order::{OrderId, Price, Quantity};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One side of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TradeLeg {
    pub order_id: OrderId,
    /// The resting price of this leg's order. The two legs of a trade may
    /// execute at different prices: each rests at its own level, and the
    /// standing order keeps any price improvement over the aggressor.
    pub price: Price,
    pub quantity: Quantity,
}

/// Immutable record of one match between a bid and an ask.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trade {
    /// Unique trade identifier
    pub id: Uuid,

    /// Bid-side leg
    pub bid: TradeLeg,

    /// Ask-side leg
    pub ask: TradeLeg,

    /// Execution timestamp
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    pub fn new(bid: TradeLeg, ask: TradeLeg) -> Self {
        debug_assert_eq!(bid.quantity, ask.quantity);

        Self {
            id: Uuid::new_v4(),
            bid,
            ask,
            executed_at: Utc::now(),
        }
    }

    /// Matched quantity, identical on both legs.
    pub fn quantity(&self) -> Quantity {
        self.bid.quantity
    }
}
