//! Order validation and normalization.

use crate::error::RejectReason;
use crate::intake::RawOrder;
use chrono::{DateTime, TimeZone, Utc};
use veil_core::{Address, Amount, Order, OrderId, OrderKind, Price};

/// Validate a decrypted order and normalize it into core form.
///
/// Checks run in a fixed sequence and stop at the first failure:
/// field presence, token well-formedness and distinctness, amount
/// positivity, limit-price positivity (limit orders only), expiry still in
/// the future. Pure: `now` is passed in, nothing is read from the
/// environment.
pub fn validate(raw: &RawOrder, now: DateTime<Utc>) -> Result<Order, RejectReason> {
    // 1. Field presence.
    let kind = raw.kind.as_deref().ok_or(RejectReason::MissingField("kind"))?;
    let token_in_raw = raw
        .token_in
        .as_deref()
        .ok_or(RejectReason::MissingField("tokenIn"))?;
    let token_out_raw = raw
        .token_out
        .as_deref()
        .ok_or(RejectReason::MissingField("tokenOut"))?;
    let amount_raw = raw
        .amount_in
        .as_deref()
        .ok_or(RejectReason::MissingField("amountIn"))?;

    // 2. Token identifiers.
    let token_in: Address = token_in_raw.parse().map_err(|e| RejectReason::MalformedAddress {
        field: "tokenIn",
        detail: format!("{e}"),
    })?;
    let token_out: Address = token_out_raw
        .parse()
        .map_err(|e| RejectReason::MalformedAddress {
            field: "tokenOut",
            detail: format!("{e}"),
        })?;
    if token_in == token_out {
        return Err(RejectReason::IdenticalTokens);
    }

    // 3. Amount.
    let amount_in: Amount = amount_raw
        .parse()
        .map_err(|_| RejectReason::InvalidAmount(amount_raw.to_string()))?;
    if !amount_in.is_positive() {
        return Err(RejectReason::InvalidAmount(amount_raw.to_string()));
    }

    // 4. Kind. Market orders ignore any supplied limit price.
    let kind = match kind {
        "market" => OrderKind::Market,
        "limit" => {
            let price_raw = raw
                .limit_price
                .as_deref()
                .ok_or(RejectReason::MissingField("limitPrice"))?;
            let price: Price = price_raw
                .parse()
                .map_err(|_| RejectReason::InvalidLimitPrice(price_raw.to_string()))?;
            if !price.is_positive() {
                return Err(RejectReason::InvalidLimitPrice(price_raw.to_string()));
            }
            OrderKind::Limit { price }
        }
        other => return Err(RejectReason::UnknownKind(other.to_string())),
    };

    // 5. Expiry: zero means none; a set expiry must still be in the future.
    let expiry = match raw.expiry {
        None | Some(0) => None,
        Some(ts) => {
            let expiry = unix_to_datetime(ts);
            if expiry <= now {
                return Err(RejectReason::Expired);
            }
            Some(expiry)
        }
    };

    // Normalization: defaults mirror what the submission path guarantees
    // elsewhere. A missing owner becomes the zero address, a missing id is
    // assigned here, and an unusable timestamp falls back to `now`.
    let owner = match raw.owner.as_deref() {
        Some(s) => s.parse().map_err(|e| RejectReason::MalformedAddress {
            field: "owner",
            detail: format!("{e}"),
        })?,
        None => Address::ZERO,
    };
    let id = match raw.id.as_deref() {
        Some(s) => s.parse().unwrap_or_else(|_| OrderId::random()),
        None => OrderId::random(),
    };
    let created_at = raw.timestamp.map(unix_to_datetime).unwrap_or(now);

    Ok(Order {
        id,
        owner,
        token_in,
        token_out,
        amount_in,
        kind,
        expiry,
        batch_id: None,
        created_at,
    })
}

fn unix_to_datetime(ts: u64) -> DateTime<Utc> {
    // Out-of-range timestamps (beyond year ~262000) clamp to the epoch,
    // which reads as "expired" and gets rejected upstream.
    Utc.timestamp_opt(ts as i64, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN_A: &str = "0x62b64cc9b1aa2f2c9d612f0b4a58cfba0eec9be2";
    const TOKEN_B: &str = "0xcc5f8fc3ccab02157f82afb7e19fc65f4808849e";

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_800_000_000, 0).unwrap()
    }

    fn market_order() -> RawOrder {
        RawOrder {
            kind: Some("market".into()),
            token_in: Some(TOKEN_A.into()),
            token_out: Some(TOKEN_B.into()),
            amount_in: Some("100".into()),
            ..Default::default()
        }
    }

    fn limit_order() -> RawOrder {
        RawOrder {
            kind: Some("limit".into()),
            limit_price: Some("2000".into()),
            ..market_order()
        }
    }

    #[test]
    fn test_accepts_market_order() {
        let order = validate(&market_order(), now()).unwrap();
        assert_eq!(order.kind, OrderKind::Market);
        assert_eq!(order.amount_in.to_string(), "100");
        assert_eq!(order.owner, Address::ZERO);
        assert!(order.expiry.is_none());
    }

    #[test]
    fn test_accepts_limit_order() {
        let order = validate(&limit_order(), now()).unwrap();
        assert!(order.kind.is_limit());
        assert_eq!(order.kind.limit_price().unwrap().to_string(), "2000");
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let err = validate(&RawOrder::default(), now()).unwrap_err();
        assert_eq!(err, RejectReason::MissingField("kind"));

        let mut raw = market_order();
        raw.token_in = None;
        assert_eq!(
            validate(&raw, now()).unwrap_err(),
            RejectReason::MissingField("tokenIn")
        );

        let mut raw = market_order();
        raw.amount_in = None;
        assert_eq!(
            validate(&raw, now()).unwrap_err(),
            RejectReason::MissingField("amountIn")
        );
    }

    #[test]
    fn test_rejects_identical_tokens() {
        let mut raw = market_order();
        raw.token_out = Some(TOKEN_A.into());
        assert_eq!(
            validate(&raw, now()).unwrap_err(),
            RejectReason::IdenticalTokens
        );
    }

    #[test]
    fn test_rejects_malformed_token() {
        let mut raw = market_order();
        raw.token_in = Some("0x1234".into());
        assert!(matches!(
            validate(&raw, now()).unwrap_err(),
            RejectReason::MalformedAddress { field: "tokenIn", .. }
        ));
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        for bad in ["0", "-5", "abc", ""] {
            let mut raw = market_order();
            raw.amount_in = Some(bad.into());
            assert!(
                matches!(validate(&raw, now()).unwrap_err(), RejectReason::InvalidAmount(_)),
                "amount {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_non_positive_limit_price() {
        for bad in ["0", "-1", "xyz"] {
            let mut raw = limit_order();
            raw.limit_price = Some(bad.into());
            assert!(matches!(
                validate(&raw, now()).unwrap_err(),
                RejectReason::InvalidLimitPrice(_)
            ));
        }

        let mut raw = limit_order();
        raw.limit_price = None;
        assert_eq!(
            validate(&raw, now()).unwrap_err(),
            RejectReason::MissingField("limitPrice")
        );
    }

    #[test]
    fn test_market_order_ignores_limit_price() {
        let mut raw = market_order();
        raw.limit_price = Some("-999".into());
        let order = validate(&raw, now()).unwrap();
        assert_eq!(order.kind, OrderKind::Market);
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let mut raw = market_order();
        raw.kind = Some("stop-loss".into());
        assert_eq!(
            validate(&raw, now()).unwrap_err(),
            RejectReason::UnknownKind("stop-loss".into())
        );
    }

    #[test]
    fn test_expiry_handling() {
        // Zero expiry means no expiry.
        let mut raw = market_order();
        raw.expiry = Some(0);
        assert!(validate(&raw, now()).unwrap().expiry.is_none());

        // Past expiry rejected.
        raw.expiry = Some(1_700_000_000);
        assert_eq!(validate(&raw, now()).unwrap_err(), RejectReason::Expired);

        // Expiry exactly at validation time is not "in the future".
        raw.expiry = Some(1_800_000_000);
        assert_eq!(validate(&raw, now()).unwrap_err(), RejectReason::Expired);

        // Future expiry accepted and carried through.
        raw.expiry = Some(1_900_000_000);
        let order = validate(&raw, now()).unwrap();
        assert_eq!(order.expiry.unwrap().timestamp(), 1_900_000_000);
    }

    #[test]
    fn test_carries_owner_and_id_when_present() {
        let mut raw = market_order();
        raw.owner = Some(TOKEN_B.into());
        raw.id = Some(format!("0x{}", "ab".repeat(32)));

        let order = validate(&raw, now()).unwrap();
        assert_eq!(order.owner.to_string(), TOKEN_B);
        assert_eq!(order.id, OrderId::new([0xab; 32]));
    }

    #[test]
    fn test_rejects_malformed_owner() {
        let mut raw = market_order();
        raw.owner = Some("nobody".into());
        assert!(matches!(
            validate(&raw, now()).unwrap_err(),
            RejectReason::MalformedAddress { field: "owner", .. }
        ));
    }
}
