use std::fmt::Display;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

/// A value transfer between two accounts, as returned by the node when full
/// transaction objects are requested.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Transaction {
    pub from: String,
    /// `None` for contract creations: the created account is only known from the receipt.
    #[serde(default)]
    pub to: Option<String>,
    /// Amount in the smallest unit, encoded as a base-10 or `0x`-prefixed base-16 string.
    pub value: String,
}

impl Transaction {
    pub fn new(from: &str, to: &str, value: &str) -> Transaction {
        Transaction {
            from: from.to_string(),
            to: Some(to.to_string()),
            value: value.to_string(),
        }
    }
}

/// Block contains the transactions included at a given chain height. Only the
/// fields the scanner reads are kept, everything else in the node payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Block {
    /// Block height, as reported by the node (hex quantity).
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn with_transactions(transactions: Vec<Transaction>) -> Block {
        Block {
            number: None,
            transactions,
        }
    }
}

/// Net balance change of one address: inflows minus outflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub address: String,
    pub delta: BigInt,
}

impl BalanceChange {
    pub fn new(address: String, delta: BigInt) -> Self {
        BalanceChange { address, delta }
    }

    pub fn is_sender(&self) -> bool {
        self.delta.is_negative()
    }

    pub fn is_receiver(&self) -> bool {
        self.delta.is_positive()
    }
}

impl Display for BalanceChange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.delta.is_zero() {
            write!(f, "{} unchanged", self.address)
        } else {
            write!(f, "{} {:+}", self.address, self.delta)
        }
    }
}
