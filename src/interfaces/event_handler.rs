// ============================================================================
// Event Handler Interface
// Defines the contract for observing order and trade events
// ============================================================================

use crate::domain::{OrderId, Trade};
use crate::engine::RejectReason;
use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events emitted by the order book
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderEvent {
    /// Order passed admission and entered the book
    OrderAccepted {
        order_id: OrderId,
        timestamp: DateTime<Utc>,
    },

    /// Order turned away without touching the book
    OrderRejected {
        order_id: OrderId,
        reason: RejectReason,
        timestamp: DateTime<Utc>,
    },

    /// Crossing loop produced a trade
    OrderMatched {
        trade: Trade,
        timestamp: DateTime<Utc>,
    },

    /// Order removed from the book (caller cancel, or fill-and-kill residual)
    OrderCancelled {
        order_id: OrderId,
        timestamp: DateTime<Utc>,
    },
}

/// Event handler trait for processing order book events
/// Implementations can handle logging, metrics, notifications, etc.
///
/// Handlers are invoked after the book's guard is released and must not call
/// back into the book from the same thread synchronously expecting a nested
/// critical section; the guard is non-reentrant.
pub trait EventHandler: Send + Sync {
    /// Handle a single event
    fn on_event(&self, event: OrderEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<OrderEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler for testing
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: OrderEvent) {
        // Do nothing
    }
}

/// Logging event handler
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: OrderEvent) {
        tracing::debug!("order book event: {:?}", event);
    }
}
