//! Fixed-point hashprice arithmetic.
//!
//! Three decimal systems meet here: Bitcoin's native 8 decimals, the upstream
//! BTC feed's own decimals, and the payment token's decimals. All quantities
//! are explicit wide unsigned integers; every multiplication happens in
//! 256-bit space before the single division, and every division truncates
//! toward zero.

use primitive_types::U256;
use terahash_types::{BTC_DECIMALS, HASHES_PER_100_THS_PER_DAY};

use crate::{OracleError, Result};

fn pow10(exp: u32) -> Result<U256> {
    U256::from(10u8)
        .checked_pow(U256::from(exp))
        .ok_or(OracleError::Overflow)
}

/// Expected token revenue for 100 TH/s sustained over one day.
///
/// ```text
/// answer = (HASHES_PER_100_THS_PER_DAY * btc_price * 10^token_decimals)
///        / (hashes_for_btc * 10^(8 + feed_decimals))
/// ```
///
/// The result carries `token_decimals` implied decimals and truncates toward
/// zero.
///
/// # Errors
///
/// - [`OracleError::InvalidUpstreamPrice`] if `btc_price` is not positive
/// - [`OracleError::Uninitialized`] if `hashes_for_btc` is zero
/// - [`OracleError::Overflow`] if an intermediate exceeds 256 bits or the
///   quotient exceeds `i128`
pub fn hashprice(
    btc_price: i128,
    feed_decimals: u8,
    token_decimals: u8,
    hashes_for_btc: u128,
) -> Result<i128> {
    if btc_price <= 0 {
        return Err(OracleError::InvalidUpstreamPrice(btc_price));
    }
    if hashes_for_btc == 0 {
        return Err(OracleError::Uninitialized);
    }

    let numerator = U256::from(HASHES_PER_100_THS_PER_DAY)
        .checked_mul(U256::from(btc_price.unsigned_abs()))
        .and_then(|n| n.checked_mul(pow10(u32::from(token_decimals)).ok()?))
        .ok_or(OracleError::Overflow)?;
    let denominator = U256::from(hashes_for_btc)
        .checked_mul(pow10(BTC_DECIMALS + u32::from(feed_decimals))?)
        .ok_or(OracleError::Overflow)?;

    // denominator is nonzero: hashes_for_btc > 0 and pow10 never returns 0
    let quotient = numerator / denominator;
    let raw = u128::try_from(quotient).map_err(|_| OracleError::Overflow)?;
    i128::try_from(raw).map_err(|_| OracleError::Overflow)
}

/// Convert a hashes-for-BTC count into hashes-for-token units.
///
/// ```text
/// hashes_for_token = hashes_for_btc * 10^(8 - token_decimals + feed_decimals)
///                  / btc_price
/// ```
///
/// When the exponent is negative the rescaling divides instead, still with a
/// single truncating division at the end.
pub fn hashes_for_token(
    hashes_for_btc: u128,
    btc_price: i128,
    feed_decimals: u8,
    token_decimals: u8,
) -> Result<u128> {
    if btc_price <= 0 {
        return Err(OracleError::InvalidUpstreamPrice(btc_price));
    }
    if hashes_for_btc == 0 {
        return Err(OracleError::Uninitialized);
    }

    let exp = BTC_DECIMALS as i64 - i64::from(token_decimals) + i64::from(feed_decimals);
    let price = U256::from(btc_price.unsigned_abs());
    let hashes = U256::from(hashes_for_btc);

    let quotient = if exp >= 0 {
        let numerator = hashes
            .checked_mul(pow10(exp as u32)?)
            .ok_or(OracleError::Overflow)?;
        numerator / price
    } else {
        let denominator = price
            .checked_mul(pow10(exp.unsigned_abs() as u32)?)
            .ok_or(OracleError::Overflow)?;
        hashes / denominator
    };

    u128::try_from(quotient).map_err(|_| OracleError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use terahash_types::DIFFICULTY_TO_HASHRATE_FACTOR;

    /// Fixture values: difficulty 121 T, block reward 3.125 BTC (in sats),
    /// BTC at $84,524.20 on a 6-decimal feed, USDC-style 6-decimal token.
    const HASHES_FOR_BTC: u128 = 1_663_011_337_011_200;
    const BTC_PRICE: i128 = 84_524_200_000;
    const FEED_DECIMALS: u8 = 6;
    const TOKEN_DECIMALS: u8 = 6;

    #[test]
    fn test_fixture_hashes_derivation() {
        // floor(121e12 * 2^32 / 3.125e8)
        let derived = 121 * 10u128.pow(12) * DIFFICULTY_TO_HASHRATE_FACTOR / 312_500_000;
        assert_eq!(derived, HASHES_FOR_BTC);
    }

    #[test]
    fn test_hashprice_matches_reference_formula() {
        // Everything fits in u128 for this fixture, so the reference value
        // can be computed independently of the U256 path.
        let expected = HASHES_PER_100_THS_PER_DAY * BTC_PRICE as u128 * 10u128.pow(6)
            / (HASHES_FOR_BTC * 10u128.pow(8 + 6));
        let answer = hashprice(BTC_PRICE, FEED_DECIMALS, TOKEN_DECIMALS, HASHES_FOR_BTC)
            .expect("hashprice");
        assert_eq!(answer, expected as i128);
        assert!(answer > 0);
    }

    #[test]
    fn test_doubling_price_doubles_answer() {
        let base = hashprice(BTC_PRICE, FEED_DECIMALS, TOKEN_DECIMALS, HASHES_FOR_BTC)
            .expect("base");
        let doubled = hashprice(BTC_PRICE * 2, FEED_DECIMALS, TOKEN_DECIMALS, HASHES_FOR_BTC)
            .expect("doubled");
        assert_eq!(doubled, base * 2);
    }

    #[test]
    fn test_doubling_hashes_halves_answer() {
        let base = hashprice(BTC_PRICE, FEED_DECIMALS, TOKEN_DECIMALS, HASHES_FOR_BTC)
            .expect("base");
        let halved = hashprice(BTC_PRICE, FEED_DECIMALS, TOKEN_DECIMALS, HASHES_FOR_BTC * 2)
            .expect("halved");
        assert_eq!(halved, base / 2);
    }

    #[test]
    fn test_tripling_hashes_thirds_answer() {
        let base = hashprice(BTC_PRICE, FEED_DECIMALS, TOKEN_DECIMALS, HASHES_FOR_BTC)
            .expect("base");
        let third = hashprice(BTC_PRICE, FEED_DECIMALS, TOKEN_DECIMALS, HASHES_FOR_BTC * 3)
            .expect("third");
        assert_eq!(third, base / 3);
    }

    #[test]
    fn test_large_hash_count_still_positive_domain() {
        // 10^24 hashes per BTC: answer is tiny but the math must not overflow.
        let answer = hashprice(BTC_PRICE, FEED_DECIMALS, TOKEN_DECIMALS, 10u128.pow(24))
            .expect("large hashes");
        assert!(answer >= 0);
    }

    #[test]
    fn test_small_hash_count_large_answer() {
        let answer =
            hashprice(BTC_PRICE, FEED_DECIMALS, TOKEN_DECIMALS, 1).expect("small hashes");
        assert!(answer > 0);
    }

    #[test]
    fn test_large_price_no_overflow() {
        // Prices up to 10^12 raw units are in the supported domain.
        let answer = hashprice(10i128.pow(12), FEED_DECIMALS, TOKEN_DECIMALS, HASHES_FOR_BTC)
            .expect("large price");
        assert!(answer > 0);
    }

    #[test]
    fn test_non_positive_price_rejected() {
        assert!(matches!(
            hashprice(0, FEED_DECIMALS, TOKEN_DECIMALS, HASHES_FOR_BTC),
            Err(OracleError::InvalidUpstreamPrice(0))
        ));
        assert!(matches!(
            hashprice(-1, FEED_DECIMALS, TOKEN_DECIMALS, HASHES_FOR_BTC),
            Err(OracleError::InvalidUpstreamPrice(-1))
        ));
    }

    #[test]
    fn test_zero_hashes_rejected() {
        assert!(matches!(
            hashprice(BTC_PRICE, FEED_DECIMALS, TOKEN_DECIMALS, 0),
            Err(OracleError::Uninitialized)
        ));
    }

    #[test]
    fn test_hashes_for_token_matches_reference() {
        // exponent = 8 - 6 + 6 = 8
        let expected = HASHES_FOR_BTC * 10u128.pow(8) / BTC_PRICE as u128;
        let got = hashes_for_token(HASHES_FOR_BTC, BTC_PRICE, FEED_DECIMALS, TOKEN_DECIMALS)
            .expect("hashes for token");
        assert_eq!(got, expected);
        assert!(got > 0);
    }

    #[test]
    fn test_hashes_for_token_negative_exponent() {
        // token_decimals 18, feed_decimals 6: exponent = 8 - 18 + 6 = -4
        let got = hashes_for_token(HASHES_FOR_BTC, BTC_PRICE, 6, 18).expect("negative exponent");
        let expected = HASHES_FOR_BTC / (BTC_PRICE as u128 * 10u128.pow(4));
        assert_eq!(got, expected);
    }

    #[test]
    fn test_division_truncates_toward_zero() {
        // 7 hashes at price 2 with all-zero decimals: 7 * 10^8 / 2 exact,
        // then a case that actually truncates.
        let got = hashes_for_token(7, 3, 0, 8).expect("truncating");
        // exponent = 8 - 8 + 0 = 0, so 7 / 3 = 2 (truncated)
        assert_eq!(got, 2);
    }
}
