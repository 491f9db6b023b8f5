//! Uniform-clearing-price batch matching.

use std::collections::BTreeMap;

use tracing::debug;
use veil_core::{Amount, ClearingResult, Order, PairSide, TradingPair};

/// Per-pair volume aggregate accumulated over one batch.
#[derive(Debug, Default, Clone, Copy)]
struct PairBook {
    buy_volume: Amount,
    sell_volume: Amount,
    buy_count: u32,
    sell_count: u32,
}

/// Match a batch of validated orders at one uniform price per pair.
///
/// Orders are bucketed by canonical pair; an order selling the pair's base
/// is a sell, its mirror a buy. Each order lands in exactly one bucket
/// side, so it settles at most once per batch. A pair clears only when both
/// sides are present, at
/// `clearing_price = total_buy_volume / total_sell_volume`: one rate for
/// every participant, with no order-level priority to front-run.
///
/// Output is deterministic for a given order set and independent of input
/// ordering: prices come from commutative sums and results are emitted in
/// canonical pair order. Orders on pairs that do not clear stay pending and
/// roll into the next batch.
pub fn match_batch(orders: &[Order]) -> Vec<ClearingResult> {
    let mut books: BTreeMap<TradingPair, PairBook> = BTreeMap::new();

    for order in orders {
        let pair = order.pair();
        let book = books.entry(pair).or_default();
        match pair.side_of(order.token_in) {
            PairSide::Sell => {
                book.sell_volume = book.sell_volume + order.amount_in;
                book.sell_count += 1;
            }
            PairSide::Buy => {
                book.buy_volume = book.buy_volume + order.amount_in;
                book.buy_count += 1;
            }
        }
    }

    books
        .into_iter()
        .filter_map(|(pair, book)| {
            if book.buy_count == 0 || book.sell_count == 0 {
                debug!(%pair, "pair is one-sided, rolling orders to next batch");
                return None;
            }
            // ratio() guards the zero-volume divisor; unreachable for
            // validated orders but a one-sided skip either way.
            let clearing_price = book.buy_volume.ratio(book.sell_volume)?;
            debug!(
                %pair,
                price = %clearing_price,
                buys = book.buy_count,
                sells = book.sell_count,
                "pair cleared"
            );
            Some(ClearingResult {
                pair,
                clearing_price,
                matched_buy_count: book.buy_count,
                matched_sell_count: book.sell_count,
                total_volume: book.buy_volume + book.sell_volume,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use veil_core::{Address, OrderId, OrderKind};

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::new(bytes)
    }

    fn order(token_in: Address, token_out: Address, amount: Decimal) -> Order {
        Order {
            id: OrderId::random(),
            owner: addr(0xee),
            token_in,
            token_out,
            amount_in: Amount::new(amount),
            kind: OrderKind::Market,
            expiry: None,
            batch_id: None,
            created_at: Utc.timestamp_opt(1_800_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_cow_match_at_volume_ratio() {
        // 100 of X sold for Y against 50 of Y sold for X:
        // pair (X,Y) clears at 50/100 = 0.5.
        let x = addr(1);
        let y = addr(2);
        let results = match_batch(&[order(x, y, dec!(100)), order(y, x, dec!(50))]);

        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.pair, TradingPair::canonical(x, y).unwrap());
        assert_eq!(r.clearing_price.inner(), dec!(0.5));
        assert_eq!(r.matched_buy_count, 1);
        assert_eq!(r.matched_sell_count, 1);
        assert_eq!(r.total_volume, Amount::new(dec!(150)));
    }

    #[test]
    fn test_one_sided_pair_does_not_clear() {
        let x = addr(1);
        let y = addr(2);
        let results = match_batch(&[order(x, y, dec!(100)), order(x, y, dec!(25))]);
        assert!(results.is_empty());
    }

    #[test]
    fn test_empty_batch() {
        assert!(match_batch(&[]).is_empty());
    }

    #[test]
    fn test_aggregates_many_orders_per_side() {
        let x = addr(1);
        let y = addr(2);
        let results = match_batch(&[
            order(x, y, dec!(60)),
            order(x, y, dec!(40)),
            order(y, x, dec!(30)),
            order(y, x, dec!(20)),
        ]);

        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.clearing_price.inner(), dec!(0.5));
        assert_eq!(r.matched_buy_count, 2);
        assert_eq!(r.matched_sell_count, 2);
    }

    #[test]
    fn test_independent_pairs_clear_independently() {
        let x = addr(1);
        let y = addr(2);
        let z = addr(3);
        let results = match_batch(&[
            order(x, y, dec!(100)),
            order(y, x, dec!(50)),
            order(x, z, dec!(10)), // one-sided, no clear
        ]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].pair, TradingPair::canonical(x, y).unwrap());
    }

    #[test]
    fn test_order_settles_at_most_once() {
        // Both directions present: every order contributes to exactly one
        // side of exactly one result.
        let x = addr(1);
        let y = addr(2);
        let results = match_batch(&[order(x, y, dec!(100)), order(y, x, dec!(50))]);

        let total_matched: u32 = results
            .iter()
            .map(|r| r.matched_buy_count + r.matched_sell_count)
            .sum();
        assert_eq!(total_matched, 2);
    }

    fn amounts_strategy() -> impl Strategy<Value = Vec<(bool, Decimal)>> {
        // (is_buy, positive volume in hundredths)
        prop::collection::vec((any::<bool>(), 1u64..1_000_000), 2..40).prop_map(|v| {
            v.into_iter()
                .map(|(buy, cents)| (buy, Decimal::new(cents as i64, 2)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_clearing_price_is_exact_volume_ratio(entries in amounts_strategy()) {
            let x = addr(1);
            let y = addr(2);
            let orders: Vec<Order> = entries
                .iter()
                .map(|(buy, amount)| {
                    if *buy {
                        order(y, x, *amount)
                    } else {
                        order(x, y, *amount)
                    }
                })
                .collect();

            let buy_total: Decimal = entries.iter().filter(|(b, _)| *b).map(|(_, a)| *a).sum();
            let sell_total: Decimal = entries.iter().filter(|(b, _)| !*b).map(|(_, a)| *a).sum();

            let results = match_batch(&orders);
            if buy_total.is_zero() || sell_total.is_zero() {
                prop_assert!(results.is_empty());
            } else {
                prop_assert_eq!(results.len(), 1);
                prop_assert_eq!(results[0].clearing_price.inner(), buy_total / sell_total);
                prop_assert_eq!(results[0].total_volume.inner(), buy_total + sell_total);
            }
        }

        #[test]
        fn prop_matching_is_input_order_independent(entries in amounts_strategy(), seed in any::<u64>()) {
            let x = addr(1);
            let y = addr(2);
            let mut orders: Vec<Order> = entries
                .iter()
                .map(|(buy, amount)| {
                    if *buy {
                        order(y, x, *amount)
                    } else {
                        order(x, y, *amount)
                    }
                })
                .collect();

            let baseline = match_batch(&orders);

            // Deterministic pseudo-shuffle driven by the seed.
            let len = orders.len();
            for i in (1..len).rev() {
                let j = (seed.wrapping_mul(i as u64 + 1) % (i as u64 + 1)) as usize;
                orders.swap(i, j);
            }

            prop_assert_eq!(match_batch(&orders), baseline);
        }
    }
}
