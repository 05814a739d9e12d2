// ============================================================================
// Order Book Errors
// Fatal invariant violations raised by the engine
// ============================================================================

use super::order::{OrderId, Quantity};
use std::fmt;

/// Errors that indicate a broken engine/caller contract.
///
/// These are never produced by routine rejections (duplicate id, infeasible
/// fill-or-kill, market order without liquidity); those surface as
/// [`AdmissionStatus::Rejected`](crate::engine::AdmissionStatus) values.
/// An `OrderBookError` means the book's internal structures would diverge if
/// the operation continued, so it aborts and propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderBookError {
    /// Attempted to fill an order beyond its remaining quantity
    Overfill {
        order_id: OrderId,
        requested: Quantity,
        remaining: Quantity,
    },
    /// Attempted to reprice an order that is not a market order
    RepriceNonMarket { order_id: OrderId },
    /// A queued order id was not found in the order store
    UnknownOrder { order_id: OrderId },
}

impl fmt::Display for OrderBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderBookError::Overfill {
                order_id,
                requested,
                remaining,
            } => write!(
                f,
                "order {} cannot be filled for {} with only {} remaining",
                order_id, requested, remaining
            ),
            OrderBookError::RepriceNonMarket { order_id } => {
                write!(f, "order {} is not a market order and cannot be repriced", order_id)
            },
            OrderBookError::UnknownOrder { order_id } => {
                write!(f, "order {} is queued but missing from the order store", order_id)
            },
        }
    }
}

impl std::error::Error for OrderBookError {}

/// Result type alias for order book operations
pub type OrderBookResult<T> = Result<T, OrderBookError>;
