use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF, TIMESTAMP_FORMAT};
use crate::error::{LedgerError, Result};
use crate::pow::ProofOfWork;
use crate::validate;
use crate::{Amount, Block, Transaction};
use chrono::{Local, NaiveDateTime, Timelike};
use std::collections::BTreeSet;
use tracing::{debug, info};
use url::Url;

/// Process-lifetime ledger state: the block chain, transactions waiting for
/// the next block, and the peers consulted during consensus.
#[derive(Clone, Debug)]
pub struct Ledger {
    pub(crate) chain: Vec<Block>,
    pub(crate) pending: Vec<Transaction>,
    pub(crate) peers: BTreeSet<String>,
    pow: ProofOfWork,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(ProofOfWork::default())
    }
}

impl Ledger {
    /// A ledger holding only the genesis block.
    pub fn new(pow: ProofOfWork) -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pending: Vec::new(),
            peers: BTreeSet::new(),
            pow,
        };
        ledger.create_block(GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string());
        ledger
    }

    pub fn pow(&self) -> &ProofOfWork {
        &self.pow
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn peers(&self) -> &BTreeSet<String> {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Seal every pending transaction into a new block and append it.
    /// The caller is responsible for `proof` and `previous_hash` being
    /// admissible against the current tip.
    pub fn create_block(&mut self, proof: i64, previous_hash: String) -> Block {
        let timestamp = capture_timestamp(self.chain.last().map(|b| b.timestamp.as_str()));
        let block = Block {
            index: self.chain.len() as u64 + 1,
            timestamp,
            proof,
            previous_hash,
            transactions: std::mem::take(&mut self.pending),
        };
        info!(
            index = block.index,
            proof = block.proof,
            transactions = block.transactions.len(),
            "block appended"
        );
        self.chain.push(block.clone());
        block
    }

    pub fn latest_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger chain always holds the genesis block")
    }

    /// Queue a transaction and return the index of the block it is expected
    /// to land in. The index is a prediction, not a reservation.
    pub fn add_transaction(
        &mut self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: Amount,
    ) -> u64 {
        self.pending.push(Transaction::new(sender, receiver, amount));
        self.latest_block().index + 1
    }

    /// Store the `[userinfo@]host:port` authority of `address`. A missing
    /// scheme is read as `http://`, and the port is always kept.
    pub fn register_peer(&mut self, address: &str) -> Result<String> {
        let authority = peer_authority(address)?;
        if self.peers.insert(authority.clone()) {
            debug!(peer = %authority, "peer registered");
        }
        Ok(authority)
    }

    pub fn is_valid(&self) -> bool {
        validate::is_valid_with(&self.pow, &self.chain)
    }

    /// Adopt `candidate` if it is strictly longer than the local chain and
    /// structurally valid. Pending transactions and peers are untouched.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> bool {
        if candidate.len() <= self.chain.len() {
            return false;
        }
        if let Err(violation) = validate::validate_chain(&self.pow, &candidate) {
            debug!(%violation, "rejecting candidate chain");
            return false;
        }
        info!(
            from = self.chain.len(),
            to = candidate.len(),
            "local chain replaced"
        );
        self.chain = candidate;
        true
    }
}

pub fn peer_authority(address: &str) -> Result<String> {
    let invalid = |reason: String| LedgerError::InvalidPeerAddress {
        address: address.to_string(),
        reason,
    };
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty address".into()));
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let url = Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("no host".into()))?;

    let mut authority = String::new();
    if !url.username().is_empty() {
        authority.push_str(url.username());
        if let Some(password) = url.password() {
            authority.push(':');
            authority.push_str(password);
        }
        authority.push('@');
    }
    authority.push_str(host);
    // The scheme is dropped, so a default port has to be spelled out.
    if let Some(port) = url.port_or_known_default() {
        authority.push(':');
        authority.push_str(&port.to_string());
    }
    Ok(authority)
}

/// Local wall-clock time, never earlier than `previous`.
fn capture_timestamp(previous: Option<&str>) -> String {
    let now = Local::now().naive_local();
    let at = match previous.and_then(parse_timestamp) {
        Some(prev) if prev > now => prev,
        _ => now,
    };
    format_timestamp(at)
}

/// `YYYY-MM-DD HH:MM:SS.ffffff`, dropping the fraction when it is zero.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    let micros = at.nanosecond() / 1_000;
    if micros == 0 {
        at.format(TIMESTAMP_FORMAT).to_string()
    } else {
        format!("{}.{:06}", at.format(TIMESTAMP_FORMAT), micros % 1_000_000)
    }
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT))
        .ok()
}
