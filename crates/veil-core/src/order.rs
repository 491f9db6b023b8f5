//! Order model and lifecycle states.

use crate::address::{Address, OrderId};
use crate::batch::BatchId;
use crate::decimal::{Amount, Price};
use crate::error::CoreError;
use crate::pair::TradingPair;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order kind, tagged with the data that kind requires.
///
/// Limit orders carry their target price; market orders carry nothing and
/// ignore any price the submitter may have attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OrderKind {
    Market,
    Limit { price: Price },
}

impl OrderKind {
    pub fn is_limit(&self) -> bool {
        matches!(self, Self::Limit { .. })
    }

    pub fn limit_price(&self) -> Option<Price> {
        match self {
            Self::Market => None,
            Self::Limit { price } => Some(*price),
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "market"),
            Self::Limit { .. } => write!(f, "limit"),
        }
    }
}

/// Order lifecycle state as recorded on the ledger.
///
/// `Pending` is the only non-terminal state. The core never mutates status
/// locally; transitions happen on the ledger and are re-read each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Executed,
    Cancelled,
    Expired,
}

impl OrderStatus {
    /// Decode the ledger's u8 representation.
    pub fn from_u8(code: u8) -> Result<Self, CoreError> {
        match code {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Executed),
            2 => Ok(Self::Cancelled),
            3 => Ok(Self::Expired),
            other => Err(CoreError::UnknownStatus(other)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Executed => 1,
            Self::Cancelled => 2,
            Self::Expired => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Executed => write!(f, "executed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// A validated, normalized order.
///
/// Invariants established by the validator: `token_in != token_out`,
/// `amount_in > 0`, and a limit price is present iff the kind is limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: Amount,
    #[serde(flatten)]
    pub kind: OrderKind,
    /// Absent means the order never expires.
    pub expiry: Option<DateTime<Utc>>,
    pub batch_id: Option<BatchId>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Canonical pair this order trades.
    ///
    /// Always present: the validator rejects `token_in == token_out`.
    pub fn pair(&self) -> TradingPair {
        TradingPair::canonical(self.token_in, self.token_out)
            .expect("validated order has distinct tokens")
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= now,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::new(bytes)
    }

    fn sample_order(expiry: Option<DateTime<Utc>>) -> Order {
        Order {
            id: OrderId::random(),
            owner: addr(9),
            token_in: addr(1),
            token_out: addr(2),
            amount_in: Amount::new(dec!(100)),
            kind: OrderKind::Limit {
                price: Price::new(dec!(2000)),
            },
            expiry,
            batch_id: None,
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Executed,
            OrderStatus::Cancelled,
            OrderStatus::Expired,
        ] {
            assert_eq!(OrderStatus::from_u8(status.as_u8()).unwrap(), status);
        }
        assert!(OrderStatus::from_u8(4).is_err());
    }

    #[test]
    fn test_only_pending_is_non_terminal() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Executed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
    }

    #[test]
    fn test_kind_limit_price() {
        let limit = OrderKind::Limit {
            price: Price::new(dec!(1.5)),
        };
        assert!(limit.is_limit());
        assert_eq!(limit.limit_price(), Some(Price::new(dec!(1.5))));
        assert_eq!(OrderKind::Market.limit_price(), None);
    }

    #[test]
    fn test_expiry_check() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let later = Utc.timestamp_opt(1_700_000_100, 0).unwrap();

        let never = sample_order(None);
        assert!(!never.is_expired_at(later));

        let expiring = sample_order(Some(later));
        assert!(!expiring.is_expired_at(t0));
        assert!(expiring.is_expired_at(later)); // boundary is inclusive
    }

    #[test]
    fn test_pair_is_canonical_regardless_of_direction() {
        let forward = sample_order(None);
        let mut reverse = sample_order(None);
        std::mem::swap(&mut reverse.token_in, &mut reverse.token_out);

        assert_eq!(forward.pair(), reverse.pair());
    }
}
