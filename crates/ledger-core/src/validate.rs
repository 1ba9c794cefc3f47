use crate::error::ChainViolation;
use crate::pow::ProofOfWork;
use crate::Block;

/// Walk `chain` front to back. The first block is taken as the trusted seed;
/// every later block must link to the digest of its predecessor and carry an
/// admissible proof against the predecessor's proof.
pub fn validate_chain(pow: &ProofOfWork, chain: &[Block]) -> Result<(), ChainViolation> {
    if chain.is_empty() {
        return Err(ChainViolation::Empty);
    }
    for pair in chain.windows(2) {
        let (previous, block) = (&pair[0], &pair[1]);
        if block.previous_hash != previous.hash() {
            return Err(ChainViolation::BrokenLink { index: block.index });
        }
        if !pow.verify(block.proof, previous.proof) {
            return Err(ChainViolation::InvalidProof { index: block.index });
        }
    }
    Ok(())
}

pub fn is_valid_with(pow: &ProofOfWork, chain: &[Block]) -> bool {
    validate_chain(pow, chain).is_ok()
}

/// Validity under the default difficulty.
pub fn is_valid(chain: &[Block]) -> bool {
    is_valid_with(&ProofOfWork::default(), chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pow, Amount, Transaction};

    fn genesis() -> Block {
        Block {
            index: 1,
            timestamp: "2024-01-01 00:00:00".to_string(),
            proof: 1,
            previous_hash: "0".to_string(),
            transactions: vec![],
        }
    }

    fn extend(chain: &mut Vec<Block>, transactions: Vec<Transaction>) {
        let previous = chain.last().unwrap();
        let block = Block {
            index: previous.index + 1,
            timestamp: format!("2024-01-01 00:00:{:02}", chain.len()),
            proof: pow::solve(previous.proof),
            previous_hash: previous.hash(),
            transactions,
        };
        chain.push(block);
    }

    fn sample_chain() -> Vec<Block> {
        let mut chain = vec![genesis()];
        extend(
            &mut chain,
            vec![Transaction::new("A", "B", Amount::from(10u64))],
        );
        extend(&mut chain, vec![]);
        chain
    }

    #[test]
    fn empty_chain_is_invalid() {
        assert!(!is_valid(&[]));
        assert_eq!(
            validate_chain(&ProofOfWork::default(), &[]),
            Err(ChainViolation::Empty)
        );
    }

    #[test]
    fn genesis_alone_is_valid() {
        assert!(is_valid(&[genesis()]));
    }

    #[test]
    fn mined_chain_is_valid() {
        assert!(is_valid(&sample_chain()));
    }

    #[test]
    fn tampered_proof_is_rejected() {
        let mut chain = sample_chain();
        chain[1].proof += 1;
        // Changing the proof also changes the digest block 3 links to.
        let err = validate_chain(&ProofOfWork::default(), &chain).unwrap_err();
        assert_eq!(err, ChainViolation::InvalidProof { index: 2 });
    }

    #[test]
    fn tampered_previous_hash_is_rejected() {
        let mut chain = sample_chain();
        chain[2].previous_hash = "0".repeat(64);
        let err = validate_chain(&ProofOfWork::default(), &chain).unwrap_err();
        assert_eq!(err, ChainViolation::BrokenLink { index: 3 });
    }

    #[test]
    fn tampered_transaction_breaks_the_next_link() {
        let mut chain = sample_chain();
        chain[1].transactions[0].amount = Amount::from(1_000u64);
        let err = validate_chain(&ProofOfWork::default(), &chain).unwrap_err();
        assert_eq!(err, ChainViolation::BrokenLink { index: 3 });
    }

    #[test]
    fn genesis_is_not_inspected() {
        let mut chain = vec![genesis()];
        chain[0].previous_hash = "anything".to_string();
        chain[0].proof = 7;
        assert!(is_valid(&chain));
    }

    #[test]
    fn validation_does_not_mutate_input() {
        let chain = sample_chain();
        let copy = chain.clone();
        let _ = is_valid(&chain);
        assert_eq!(chain, copy);
    }
}
