//! Enclave-side auction logic: order intake, validation, and batch matching.
//!
//! Everything here is pure and deterministic. The confidential runtime hands
//! this crate decrypted payload bytes; it hands back a [`BatchReport`] with
//! accepted orders, per-order rejection reasons, and the uniform clearing
//! results for the batch. Rejections are values; a malformed order never
//! aborts processing of the rest of the batch.

pub mod error;
pub mod intake;
pub mod matcher;
pub mod report;
pub mod validator;

pub use error::RejectReason;
pub use intake::{decode_batch, decode_order, RawOrder};
pub use matcher::match_batch;
pub use report::{process_batch, rejection_report, BatchReport, RejectedOrder};
pub use validator::validate;
