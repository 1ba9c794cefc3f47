use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

pub mod config;
pub mod consensus;
pub mod constants;
pub mod error;
pub mod hash;
pub mod ledger;
pub mod node;
pub mod pow;
pub mod validate;

pub use config::{LedgerConfig, RewardConfig};
pub use consensus::{ChainSnapshot, PeerChainFetcher};
pub use error::{ChainViolation, FetchError, LedgerError};
pub use hash::{digest, Canonical};
pub use ledger::Ledger;
pub use node::Node;
pub use pow::ProofOfWork;

/// Transferred value. Kept as the exact JSON number it arrived as, so a
/// peer's `10` and `10.0` hash differently just like they do on the peer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Number);

impl Amount {
    pub fn from_f64(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Amount)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.0.as_f64()
    }

    pub fn as_number(&self) -> &Number {
        &self.0
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(Number::from(value))
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(Number::from(value))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: Amount,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: Amount) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }

    /// Field check for boundaries that accept transactions from outside.
    /// The ledger itself never rejects a transaction.
    pub fn validate(&self) -> error::Result<()> {
        if self.sender.trim().is_empty() {
            return Err(LedgerError::InvalidTransaction("sender is empty".into()));
        }
        if self.receiver.trim().is_empty() {
            return Err(LedgerError::InvalidTransaction("receiver is empty".into()));
        }
        match self.amount.as_f64() {
            Some(v) if v.is_finite() && v >= 0.0 => Ok(()),
            _ => Err(LedgerError::InvalidTransaction(format!(
                "amount {} is not a non-negative number",
                self.amount
            ))),
        }
    }
}

impl Canonical for Transaction {
    fn canonical_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("sender".into(), Value::String(self.sender.clone()));
        map.insert("receiver".into(), Value::String(self.receiver.clone()));
        map.insert("amount".into(), Value::Number(self.amount.0.clone()));
        Value::Object(map)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    pub proof: i64,
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Digest of the canonical form; what the next block stores as
    /// `previous_hash`.
    pub fn hash(&self) -> String {
        digest(self)
    }
}

impl Canonical for Block {
    fn canonical_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("index".into(), Value::from(self.index));
        map.insert("timestamp".into(), Value::String(self.timestamp.clone()));
        map.insert("proof".into(), Value::from(self.proof));
        map.insert(
            "previous_hash".into(),
            Value::String(self.previous_hash.clone()),
        );
        map.insert(
            "transactions".into(),
            Value::Array(
                self.transactions
                    .iter()
                    .map(Canonical::canonical_value)
                    .collect(),
            ),
        );
        Value::Object(map)
    }
}
