//! Decrypt-boundary intake.
//!
//! The trusted runtime decrypts protected order data before this crate ever
//! sees it; what arrives here is plaintext JSON bytes. Parsing failures are
//! ordinary rejections, since a submitter controls the payload content.

use crate::error::RejectReason;
use serde::{Deserialize, Serialize};

/// An order exactly as the submitting client shaped it.
///
/// Every field is optional: presence is a validation concern, not a parsing
/// concern. Numeric fields travel as strings to survive JSON number
/// precision limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOrder {
    /// "market" or "limit".
    pub kind: Option<String>,
    pub token_in: Option<String>,
    pub token_out: Option<String>,
    pub amount_in: Option<String>,
    pub limit_price: Option<String>,
    /// Unix seconds; zero or absent means no expiry.
    pub expiry: Option<u64>,
    pub owner: Option<String>,
    /// Submission-assigned id, if the client carried one through.
    pub id: Option<String>,
    /// Unix seconds at submission.
    pub timestamp: Option<u64>,
}

/// Envelope for a batch of orders handed to the enclave in one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchEnvelope {
    pub orders: Vec<RawOrder>,
}

/// Decode a single decrypted order payload.
pub fn decode_order(bytes: &[u8]) -> Result<RawOrder, RejectReason> {
    serde_json::from_slice(bytes).map_err(|e| RejectReason::UnreadablePayload(e.to_string()))
}

/// Decode a batch envelope (`{"orders": [...]}`).
pub fn decode_batch(bytes: &[u8]) -> Result<Vec<RawOrder>, RejectReason> {
    let envelope: BatchEnvelope =
        serde_json::from_slice(bytes).map_err(|e| RejectReason::UnreadablePayload(e.to_string()))?;
    Ok(envelope.orders)
}
