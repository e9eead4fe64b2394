//! Etherscan-compatible block explorer backend for the verification oracle.

pub mod client;
pub mod predicate;

pub use client::{EtherscanConfig, EtherscanOracle, DEFAULT_ETHERSCAN_URL};
pub use predicate::{ExplorerResponse, VerificationPredicate, NOT_VERIFIED_RESULT};
