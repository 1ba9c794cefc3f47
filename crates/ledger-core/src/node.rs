//! Shared handle over one [`Ledger`].
//!
//! Every operation takes the ledger lock only for as long as it reads or
//! mutates state. The proof-of-work search and peer fetches run with the lock
//! released, so submissions and reads keep flowing while a block is mined.

use crate::config::{LedgerConfig, RewardConfig};
use crate::consensus::{self, ChainSnapshot, PeerChainFetcher};
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::pow::ProofOfWork;
use crate::{Amount, Block};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct Node {
    id: String,
    reward: Option<RewardConfig>,
    ledger: Arc<Mutex<Ledger>>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new(&LedgerConfig::default())
    }
}

impl Node {
    pub fn new(config: &LedgerConfig) -> Self {
        let ledger = Ledger::new(ProofOfWork::new(config.difficulty));
        Self::with_ledger(ledger, config.reward.clone())
    }

    pub fn with_ledger(ledger: Ledger, reward: Option<RewardConfig>) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        info!(node = %id, difficulty = ledger.pow().difficulty(), "ledger node created");
        Self {
            id,
            reward,
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Random identifier of this node; the default sender of mining rewards.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Solve the puzzle against the current tip and append a block holding
    /// every pending transaction. If the tip moves while solving (a chain
    /// replacement landed), the search restarts against the new tip.
    pub async fn mine(&self) -> Result<Block> {
        self.mine_with(|| {}).await
    }

    /// `mine` with `after_solve` run each time a proof is found, before the
    /// lock is taken again.
    async fn mine_with(&self, mut after_solve: impl FnMut()) -> Result<Block> {
        loop {
            let (pow, previous_proof, previous_hash) = {
                let ledger = self.ledger.lock();
                let tip = ledger.latest_block();
                (*ledger.pow(), tip.proof, tip.hash())
            };

            let proof = tokio::task::spawn_blocking(move || pow.solve(previous_proof))
                .await
                .map_err(|e| LedgerError::MiningTask(e.to_string()))?;
            after_solve();

            let mut ledger = self.ledger.lock();
            if ledger.latest_block().hash() != previous_hash {
                warn!(proof, "tip changed while mining, retrying");
                continue;
            }
            if let Some(reward) = &self.reward {
                let tx = reward.transaction(&self.id);
                ledger.add_transaction(tx.sender, tx.receiver, tx.amount);
            }
            return Ok(ledger.create_block(proof, previous_hash));
        }
    }

    pub fn get_chain(&self) -> ChainSnapshot {
        ChainSnapshot::of(self.ledger.lock().chain())
    }

    pub fn check_valid(&self) -> bool {
        self.ledger.lock().is_valid()
    }

    /// Returns the index of the block the transaction is expected to land in.
    pub fn submit_transaction(
        &self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: Amount,
    ) -> u64 {
        self.ledger.lock().add_transaction(sender, receiver, amount)
    }

    pub fn add_peer(&self, address: &str) -> Result<String> {
        self.ledger.lock().register_peer(address)
    }

    pub fn peers(&self) -> Vec<String> {
        self.ledger.lock().peers().iter().cloned().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.ledger.lock().pending().len()
    }

    /// Fetch every peer without holding the lock, then swap in the longest
    /// valid chain if it still beats the local one.
    pub async fn resolve_consensus<F>(&self, fetcher: &F) -> bool
    where
        F: PeerChainFetcher + ?Sized,
    {
        let (pow, peers, local_len) = {
            let ledger = self.ledger.lock();
            let peers: Vec<String> = ledger.peers().iter().cloned().collect();
            (*ledger.pow(), peers, ledger.len())
        };
        let snapshots = consensus::collect_snapshots(fetcher, peers).await;
        match consensus::select_longest(&pow, local_len, snapshots) {
            Some((peer, chain)) => {
                info!(%peer, length = chain.len(), "adopting peer chain");
                self.ledger.lock().replace_chain(chain)
            }
            None => false,
        }
    }
}
