//! Proof-of-work sealing for blocks

pub mod pow;

pub use pow::{ProofOfWork, MAX_DIFFICULTY};
