//! Rejection reasons for submitted orders.

use thiserror::Error;

/// Why an order was refused at intake or validation.
///
/// These are reported back in the batch output, not raised; one bad order
/// must never take down the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("Payload could not be read: {0}")]
    UnreadablePayload(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unknown order kind: {0}")]
    UnknownKind(String),

    #[error("Malformed {field} address: {detail}")]
    MalformedAddress {
        field: &'static str,
        detail: String,
    },

    #[error("tokenIn and tokenOut are the same asset")]
    IdenticalTokens,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid limit price: {0}")]
    InvalidLimitPrice(String),

    #[error("Order has expired")]
    Expired,
}
