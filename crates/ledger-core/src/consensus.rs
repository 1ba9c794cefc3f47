//! Longest-valid-chain consensus.
//!
//! Peers are visited in lexicographic order of their authority. A peer's
//! chain is adopted only if it is strictly longer than the best seen so far
//! (starting from the local length) and passes validation, so among equally
//! long candidates the first peer in that order wins.

use crate::error::FetchError;
use crate::ledger::Ledger;
use crate::pow::ProofOfWork;
use crate::validate;
use crate::Block;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What a peer serves for its chain: the blocks and their count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: u64,
}

impl ChainSnapshot {
    pub fn of(chain: &[Block]) -> Self {
        Self {
            chain: chain.to_vec(),
            length: chain.len() as u64,
        }
    }

    /// Reject snapshots whose declared length disagrees with the blocks sent.
    pub fn check_length(&self, peer: &str) -> Result<(), FetchError> {
        if self.length != self.chain.len() as u64 {
            return Err(FetchError::LengthMismatch {
                peer: peer.to_string(),
                declared: self.length,
                actual: self.chain.len(),
            });
        }
        Ok(())
    }
}

/// Source of peer chains, implemented by networking code.
#[async_trait]
pub trait PeerChainFetcher: Send + Sync {
    async fn fetch(&self, peer: &str) -> Result<ChainSnapshot, FetchError>;
}

/// Fetch every peer in order, dropping the ones that fail.
pub async fn collect_snapshots<F, I>(fetcher: &F, peers: I) -> Vec<(String, ChainSnapshot)>
where
    F: PeerChainFetcher + ?Sized,
    I: IntoIterator<Item = String>,
{
    let mut snapshots = Vec::new();
    for peer in peers {
        match fetcher.fetch(&peer).await {
            Ok(snapshot) => {
                debug!(%peer, length = snapshot.length, "peer snapshot received");
                snapshots.push((peer, snapshot));
            }
            Err(e) => warn!(%peer, error = %e, "skipping peer"),
        }
    }
    snapshots
}

/// Pick the longest valid chain that beats `local_len`, if any.
pub fn select_longest(
    pow: &ProofOfWork,
    local_len: usize,
    snapshots: Vec<(String, ChainSnapshot)>,
) -> Option<(String, Vec<Block>)> {
    let mut best: Option<(String, Vec<Block>)> = None;
    let mut best_len = local_len;
    for (peer, snapshot) in snapshots {
        if let Err(e) = snapshot.check_length(&peer) {
            warn!(error = %e, "skipping peer");
            continue;
        }
        let len = snapshot.chain.len();
        if len <= best_len {
            continue;
        }
        match validate::validate_chain(pow, &snapshot.chain) {
            Ok(()) => {
                best_len = len;
                best = Some((peer, snapshot.chain));
            }
            Err(violation) => warn!(%peer, %violation, "peer chain is invalid"),
        }
    }
    best
}

/// Replace the ledger's chain with the longest valid peer chain.
/// Returns whether a replacement happened.
pub async fn resolve<F>(ledger: &mut Ledger, fetcher: &F) -> bool
where
    F: PeerChainFetcher + ?Sized,
{
    let peers: Vec<String> = ledger.peers().iter().cloned().collect();
    let snapshots = collect_snapshots(fetcher, peers).await;
    match select_longest(ledger.pow(), ledger.len(), snapshots) {
        Some((peer, chain)) => {
            info!(%peer, length = chain.len(), "adopting peer chain");
            ledger.replace_chain(chain)
        }
        None => false,
    }
}
