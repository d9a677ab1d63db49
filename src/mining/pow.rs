use crate::core::BlockHeader;
use crate::crypto::hash::Hashable;
use crate::{LedgerError, Result};

/// Highest difficulty (in leading zero bits) a header may be sealed at.
pub const MAX_DIFFICULTY: u32 = 64;

/// Leading-zero-bits proof of work over a block header.
#[derive(Debug, Clone, Copy)]
pub struct ProofOfWork {
    pub difficulty: u32,
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> Self {
        Self { difficulty }
    }

    /// Searches nonces from zero until the header hash meets the target and
    /// leaves the winning nonce in the header.
    pub fn run(&self, header: &mut BlockHeader) -> Result<u64> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::InvalidInput(format!(
                "Difficulty {} exceeds maximum of {}",
                self.difficulty, MAX_DIFFICULTY
            )));
        }

        header.difficulty = self.difficulty;
        for nonce in 0..=u64::MAX {
            header.nonce = nonce;
            if self.validate(header) {
                log::debug!("⛏️ Found nonce {} for difficulty {}", nonce, self.difficulty);
                return Ok(nonce);
            }
        }

        Err(LedgerError::InvalidBlockHash)
    }

    pub fn validate(&self, header: &BlockHeader) -> bool {
        header.hash().leading_zero_bits() >= self.difficulty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::Hash256;

    fn header() -> BlockHeader {
        BlockHeader {
            previous_hash: Hash256::zero(),
            merkle_root: Hash256::hash(b"transactions"),
            timestamp: 1_700_000_000,
            difficulty: 0,
            nonce: 0,
        }
    }

    #[test]
    fn test_run_meets_target() {
        let pow = ProofOfWork::new(8);
        let mut header = header();

        let nonce = pow.run(&mut header).unwrap();

        assert_eq!(header.nonce, nonce);
        assert_eq!(header.difficulty, 8);
        assert!(pow.validate(&header));
        assert!(header.hash().leading_zero_bits() >= 8);
    }

    #[test]
    fn test_run_finds_first_valid_nonce() {
        let pow = ProofOfWork::new(6);
        let mut header = header();
        let nonce = pow.run(&mut header).unwrap();

        let mut probe = header.clone();
        for earlier in 0..nonce {
            probe.nonce = earlier;
            assert!(!pow.validate(&probe));
        }
    }

    #[test]
    fn test_zero_difficulty_accepts_first_nonce() {
        let pow = ProofOfWork::new(0);
        let mut header = header();
        assert_eq!(pow.run(&mut header).unwrap(), 0);
    }

    #[test]
    fn test_rejects_excessive_difficulty() {
        let pow = ProofOfWork::new(MAX_DIFFICULTY + 1);
        assert!(pow.run(&mut header()).is_err());
    }
}
