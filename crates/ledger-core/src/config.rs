//! Runtime configuration for a ledger node.

use crate::constants::{FETCH_TIMEOUT_SECS, HASH_HEX_SIZE, POW_DEFAULT_DIFFICULTY};
use crate::error::{LedgerError, Result};
use crate::{Amount, Transaction};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Leading zero hex digits the proof-of-work puzzle demands.
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    /// Transaction queued into every mined block, if set.
    #[serde(default)]
    pub reward: Option<RewardConfig>,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Defaults to the node's identifier.
    #[serde(default)]
    pub sender: Option<String>,
    pub receiver: String,
    #[serde(default = "default_reward_amount")]
    pub amount: Amount,
}

impl RewardConfig {
    pub fn transaction(&self, node_id: &str) -> Transaction {
        let sender = self.sender.as_deref().unwrap_or(node_id);
        Transaction::new(sender, self.receiver.clone(), self.amount.clone())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            reward: None,
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_difficulty() -> usize {
    POW_DEFAULT_DIFFICULTY
}

fn default_fetch_timeout() -> u64 {
    FETCH_TIMEOUT_SECS
}

fn default_reward_amount() -> Amount {
    Amount::from(1u64)
}

impl LedgerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: LedgerConfig =
            serde_json::from_str(raw).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty == 0 || self.difficulty > HASH_HEX_SIZE {
            return Err(LedgerError::Config(format!(
                "difficulty must be between 1 and {HASH_HEX_SIZE}, got {}",
                self.difficulty
            )));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(LedgerError::Config(
                "fetch_timeout_secs must be positive".into(),
            ));
        }
        if let Some(reward) = &self.reward {
            reward
                .transaction("node")
                .validate()
                .map_err(|e| LedgerError::Config(format!("reward: {e}")))?;
        }
        Ok(())
    }
}
