// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod book_side;
pub mod errors;
pub mod order;
pub mod trade;

pub use book_side::{BookSide, LevelData, LevelInfo, OrderBookSnapshot};
pub use errors::{OrderBookError, OrderBookResult};
pub use order::{Order, OrderId, OrderType, Price, Quantity, Side, INVALID_PRICE};
pub use trade::{Trade, TradeLeg};
