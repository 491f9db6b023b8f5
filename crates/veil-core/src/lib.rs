//! Core domain types for the veil batch-auction exchange.
//!
//! This crate provides the fundamental types shared by the enclave-side
//! auction logic and the keeper:
//! - `Address`, `OrderId`: byte-exact chain identifiers
//! - `Price`, `Amount`: precision-safe numeric types
//! - `Order`, `OrderKind`, `OrderStatus`: the order lifecycle model
//! - `TradingPair`, `PairSide`: canonical pair identification
//! - `Batch`, `BatchId`, `ClearingResult`: batch-auction records

pub mod address;
pub mod batch;
pub mod decimal;
pub mod error;
pub mod order;
pub mod pair;

pub use address::{Address, OrderId};
pub use batch::{Batch, BatchId, ClearingResult};
pub use decimal::{Amount, Price};
pub use error::{CoreError, Result};
pub use order::{Order, OrderKind, OrderStatus};
pub use pair::{PairSide, TradingPair};
