use crate::core::Block;
use crate::crypto::hash::Hash256;
use crate::storage::Database;
use crate::{LedgerError, Result};

/// Cursor over the chain from a head block back to genesis.
///
/// Each step is its own store read. The cursor only follows predecessor
/// links, so blocks appended after it was created are never visited. Once
/// genesis has been yielded, or a read fails, the iterator is exhausted.
#[derive(Debug)]
pub struct ChainIterator {
    current_hash: Option<Hash256>,
    db: Database,
}

impl ChainIterator {
    pub(crate) fn new(head: Hash256, db: Database) -> Self {
        Self {
            current_hash: Some(head),
            db,
        }
    }

    fn read(&self, hash: &Hash256) -> Result<Block> {
        self.db
            .get_block(hash)?
            .ok_or(LedgerError::MissingBlock(*hash))
    }
}

impl Iterator for ChainIterator {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.current_hash.take()?;

        match self.read(&hash) {
            Ok(block) => {
                if !block.is_genesis() {
                    self.current_hash = Some(block.header.previous_hash);
                }
                log::debug!("Visited block {}", hash);
                Some(Ok(block))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl std::iter::FusedIterator for ChainIterator {}
