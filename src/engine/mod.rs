// ============================================================================
// Engine Module
// Contains the order book and its matching logic
// ============================================================================

mod orderbook;

pub use orderbook::{AdmissionStatus, Orderbook, RejectReason, Submission};
