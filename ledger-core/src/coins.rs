//! Multi-denomination coin amounts

use crate::{TxError, TxResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single (denomination, amount) pair
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Coin {
    pub denom: String,
    pub amount: i64,
}

impl Coin {
    pub fn new(denom: &str, amount: i64) -> Self {
        Self {
            denom: denom.to_string(),
            amount,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A set of coins, canonical when strictly denom-sorted with positive
/// amounts and no duplicates. The empty set is the zero value.
///
/// Arithmetic treats a missing denomination as zero and never wraps:
/// overflow and negative results are errors.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct Coins(Vec<Coin>);

impl Coins {
    pub fn new(coins: Vec<Coin>) -> Self {
        Self(coins)
    }

    pub fn as_slice(&self) -> &[Coin] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sort into canonical denomination order.
    pub fn sort(&mut self) {
        self.0.sort_by(|a, b| a.denom.cmp(&b.denom));
    }

    /// Canonical form: strictly sorted, named denominations, positive amounts.
    pub fn is_valid(&self) -> bool {
        self.0
            .iter()
            .all(|coin| coin.amount > 0 && !coin.denom.is_empty())
            && self.0.windows(2).all(|pair| pair[0].denom < pair[1].denom)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(Coin::is_zero)
    }

    pub fn is_nonnegative(&self) -> bool {
        self.0.iter().all(|coin| coin.amount >= 0)
    }

    /// Amount held in `denom`, zero when absent.
    pub fn amount_of(&self, denom: &str) -> i64 {
        self.0
            .iter()
            .find(|coin| coin.denom == denom)
            .map_or(0, |coin| coin.amount)
    }

    /// Per-denomination sum. Requires both sides canonical.
    pub fn plus(&self, other: &Coins) -> TxResult<Coins> {
        let mut result = Vec::with_capacity(self.0.len() + other.0.len());
        let mut lhs = self.0.iter().peekable();
        let mut rhs = other.0.iter().peekable();
        loop {
            match (lhs.peek(), rhs.peek()) {
                (Some(a), Some(b)) => match a.denom.cmp(&b.denom) {
                    Ordering::Less => {
                        result.push((*a).clone());
                        lhs.next();
                    }
                    Ordering::Greater => {
                        result.push((*b).clone());
                        rhs.next();
                    }
                    Ordering::Equal => {
                        let sum = a.amount.checked_add(b.amount).ok_or_else(|| {
                            TxError::Internal(format!("coin amount overflow for {}", a.denom))
                        })?;
                        if sum != 0 {
                            result.push(Coin::new(&a.denom, sum));
                        }
                        lhs.next();
                        rhs.next();
                    }
                },
                (Some(_), None) => {
                    result.extend(lhs.cloned());
                    break;
                }
                (None, Some(_)) => {
                    result.extend(rhs.cloned());
                    break;
                }
                (None, None) => break,
            }
        }
        Ok(Coins(result))
    }

    /// Per-denomination difference; a negative result in any
    /// denomination is an error, never wraparound.
    pub fn minus(&self, other: &Coins) -> TxResult<Coins> {
        let mut result = Vec::with_capacity(self.0.len());
        let mut lhs = self.0.iter().peekable();
        let mut rhs = other.0.iter().peekable();
        loop {
            match (lhs.peek(), rhs.peek()) {
                (Some(a), Some(b)) => match a.denom.cmp(&b.denom) {
                    Ordering::Less => {
                        result.push((*a).clone());
                        lhs.next();
                    }
                    Ordering::Greater => {
                        return Err(TxError::InsufficientFunds(format!(
                            "missing denomination {}",
                            b.denom
                        )));
                    }
                    Ordering::Equal => {
                        let diff = a.amount.checked_sub(b.amount).ok_or_else(|| {
                            TxError::Internal(format!("coin amount overflow for {}", a.denom))
                        })?;
                        if diff < 0 {
                            return Err(TxError::InsufficientFunds(format!(
                                "{} < {}",
                                a, b
                            )));
                        }
                        if diff != 0 {
                            result.push(Coin::new(&a.denom, diff));
                        }
                        lhs.next();
                        rhs.next();
                    }
                },
                (Some(_), None) => {
                    result.extend(lhs.cloned());
                    break;
                }
                (None, Some(b)) => {
                    return Err(TxError::InsufficientFunds(format!(
                        "missing denomination {}",
                        b.denom
                    )));
                }
                (None, None) => break,
            }
        }
        Ok(Coins(result))
    }

    /// True when every denomination in `other` is covered.
    pub fn is_gte(&self, other: &Coins) -> bool {
        other
            .0
            .iter()
            .all(|coin| self.amount_of(&coin.denom) >= coin.amount)
    }

    /// Equality with missing denominations treated as zero.
    pub fn is_equal(&self, other: &Coins) -> bool {
        let lhs = self.0.iter().filter(|coin| coin.amount != 0);
        let rhs = other.0.iter().filter(|coin| coin.amount != 0);
        lhs.eq(rhs)
    }
}

impl From<Coin> for Coins {
    /// A single-coin set; the zero coin becomes the empty set.
    fn from(coin: Coin) -> Self {
        if coin.is_zero() {
            Coins::default()
        } else {
            Coins(vec![coin])
        }
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for coin in &self.0 {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{coin}")?;
            first = false;
        }
        Ok(())
    }
}
