use thiserror::Error;

/// Recoverable errors returned by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid peer address {address:?}: {reason}")]
    InvalidPeerAddress { address: String, reason: String },

    #[error("malformed transaction: {0}")]
    InvalidTransaction(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("mining task failed: {0}")]
    MiningTask(String),
}

/// Why a peer could not supply a usable chain snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: String, reason: String },

    #[error("peer {peer} answered with status {status}")]
    Status { peer: String, status: u16 },

    #[error("peer {peer} sent an undecodable snapshot: {reason}")]
    Decode { peer: String, reason: String },

    #[error("peer {peer} declared length {declared} but sent {actual} blocks")]
    LengthMismatch {
        peer: String,
        declared: u64,
        actual: usize,
    },
}

impl FetchError {
    pub fn peer(&self) -> &str {
        match self {
            FetchError::Unreachable { peer, .. }
            | FetchError::Status { peer, .. }
            | FetchError::Decode { peer, .. }
            | FetchError::LengthMismatch { peer, .. } => peer,
        }
    }
}

/// First structural defect found while walking a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainViolation {
    #[error("chain is empty")]
    Empty,

    #[error("block {index} does not link to the digest of its predecessor")]
    BrokenLink { index: u64 },

    #[error("block {index} carries a proof that fails the difficulty predicate")]
    InvalidProof { index: u64 },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
