//! Lamport amounts
//!
//! All fund-moving arithmetic is integer. Decimal input is parsed with
//! exact fixed-point rules; floating point never touches a transfer amount.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sniperfi_params::{LAMPORTS_PER_SOL, LAMPORT_DECIMALS};
use std::fmt;
use std::str::FromStr;

/// Amount in lamports
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Lamports(pub u64);

impl Lamports {
    /// Zero
    pub const ZERO: Lamports = Lamports(0);

    /// Raw lamport count
    pub fn get(self) -> u64 {
        self.0
    }

    /// Whether the amount is zero
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Lamports) -> Option<Lamports> {
        self.0.checked_add(other.0).map(Lamports)
    }

    /// Parse a decimal coin amount such as `"1.5"` or `"0.000000001"`
    pub fn parse_decimal(input: &str) -> Result<Self> {
        let text = input.trim();
        let invalid = |reason: &str| Error::InvalidParams(format!("amount '{}': {}", input, reason));

        if text.is_empty() {
            return Err(invalid("empty"));
        }

        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (text, None),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected a non-negative decimal number"));
        }

        let fraction_lamports = match fraction {
            None => 0,
            Some(digits) => {
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid("expected digits after the decimal point"));
                }
                if digits.len() > LAMPORT_DECIMALS as usize {
                    return Err(invalid("more than 9 decimal places"));
                }
                let padded = format!("{:0<width$}", digits, width = LAMPORT_DECIMALS as usize);
                padded
                    .parse::<u64>()
                    .map_err(|_| invalid("expected digits after the decimal point"))?
            }
        };

        let whole: u64 = whole.parse().map_err(|_| invalid("too large"))?;
        whole
            .checked_mul(LAMPORTS_PER_SOL)
            .and_then(|l| l.checked_add(fraction_lamports))
            .map(Lamports)
            .ok_or_else(|| invalid("too large"))
    }

    /// Whole-coin value for display only
    pub fn as_sol(self) -> f64 {
        self.0 as f64 / LAMPORTS_PER_SOL as f64
    }
}

impl From<u64> for Lamports {
    fn from(value: u64) -> Self {
        Lamports(value)
    }
}

impl FromStr for Lamports {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Lamports::parse_decimal(s)
    }
}

impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:09}",
            self.0 / LAMPORTS_PER_SOL,
            self.0 % LAMPORTS_PER_SOL
        )
    }
}

/// Split `total` into `n` shares
///
/// Every share is `total / n`; the remainder goes to the first share so the
/// shares always sum to `total`.
pub fn split_shares(total: Lamports, n: usize) -> Result<Vec<Lamports>> {
    if n == 0 {
        return Err(Error::NoWallets);
    }
    let n64 = n as u64;
    let base = total.0 / n64;
    let remainder = total.0 % n64;

    let mut shares = vec![Lamports(base); n];
    shares[0] = Lamports(base + remainder);
    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Lamports::parse_decimal("1").unwrap(), Lamports(1_000_000_000));
        assert_eq!(Lamports::parse_decimal("1.5").unwrap(), Lamports(1_500_000_000));
        assert_eq!(Lamports::parse_decimal(" 0.000000001 ").unwrap(), Lamports(1));
        assert_eq!(Lamports::parse_decimal("0").unwrap(), Lamports::ZERO);
    }

    #[test]
    fn test_parse_rejects() {
        for input in ["", "-1", "+1", "1.", ".5", "1.0000000001", "1e9", "abc", "1.2.3", "18446744074"] {
            assert!(
                matches!(Lamports::parse_decimal(input), Err(Error::InvalidParams(_))),
                "accepted {:?}",
                input
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Lamports(1_500_000_000).to_string(), "1.500000000");
        assert_eq!(Lamports(1).to_string(), "0.000000001");
    }

    #[test]
    fn test_remainder_goes_first() {
        let shares = split_shares(Lamports(1_000_000_000), 3).unwrap();
        assert_eq!(
            shares,
            vec![Lamports(333_333_334), Lamports(333_333_333), Lamports(333_333_333)]
        );
        assert!(matches!(split_shares(Lamports(10), 0), Err(Error::NoWallets)));
    }

    proptest! {
        #[test]
        fn prop_shares_sum_to_total(total in any::<u64>(), n in 1usize..500) {
            let shares = split_shares(Lamports(total), n).unwrap();
            prop_assert_eq!(shares.len(), n);
            let sum: u128 = shares.iter().map(|s| s.0 as u128).sum();
            prop_assert_eq!(sum, total as u128);
            let base = total / n as u64;
            prop_assert!(shares[1..].iter().all(|s| s.0 == base));
        }

        #[test]
        fn prop_display_parses_back(lamports in any::<u64>()) {
            let parsed = Lamports::parse_decimal(&Lamports(lamports).to_string()).unwrap();
            prop_assert_eq!(parsed, Lamports(lamports));
        }
    }
}
