//! The chain adapter seam.
//!
//! Everything the middleware needs from the chain is behind this trait, so
//! the core stays testable against the deterministic mock and the RPC
//! client can live with the deployment. Every operation takes a
//! cancellation token; implementations are expected to give up promptly
//! once it fires.

use crate::valset::Key;

use ethers_core::types::{Address, H256, U256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

pub type Timestamp = u64;

/// A cooperative cancellation flag shared between a caller and the
/// operations it started. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Errors once the token has fired
    pub fn check(&self) -> Result<(), AdapterError> {
        if self.is_cancelled() {
            Err(AdapterError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Debug, Error)]
pub enum AdapterError {
    /// The chain could not be reached or answered out of protocol
    #[error("chain adapter unavailable: {0}")]
    Unavailable(String),

    /// The chain answered with bytes the adapter could not decode
    #[error("malformed on-chain data: {0}")]
    Decode(String),

    /// The cancellation token fired
    #[error("operation cancelled")]
    Cancelled,
}

/// The protocol phases of the settlement contract
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Commit,
    Fail,
}

#[derive(Clone, Debug)]
pub struct CrossChainAddress {
    pub address: Address,
    pub chain_id: u64,
}

#[derive(Clone, Debug)]
pub struct MasterConfig {
    pub voting_power_providers: Vec<CrossChainAddress>,
    pub keys_provider: CrossChainAddress,
    pub replicas: Vec<CrossChainAddress>,
}

/// Validator set filters. A zero value on any field means the filter is
/// unbounded.
#[derive(Clone, Debug, Default)]
pub struct ValsetConfig {
    pub max_voting_power: U256,
    pub min_inclusion_voting_power: U256,
    pub max_validators_count: u64,
}

#[derive(Clone, Debug)]
pub struct VaultVotingPower {
    pub vault: Address,
    pub voting_power: U256,
}

#[derive(Clone, Debug)]
pub struct OperatorVotingPower {
    pub operator: Address,
    pub vaults: Vec<VaultVotingPower>,
}

#[derive(Clone, Debug)]
pub struct OperatorWithKeys {
    pub operator: Address,
    pub keys: Vec<Key>,
}

#[derive(Clone, Debug)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
}

pub trait ChainAdapter: Send + Sync {
    fn master_config(
        &self,
        cancel: &CancelToken,
        timestamp: Timestamp,
    ) -> Result<MasterConfig, AdapterError>;

    fn valset_config(
        &self,
        cancel: &CancelToken,
        timestamp: Timestamp,
    ) -> Result<ValsetConfig, AdapterError>;

    fn current_valset_timestamp(&self, cancel: &CancelToken) -> Result<Timestamp, AdapterError>;

    fn capture_timestamp(&self, cancel: &CancelToken) -> Result<Timestamp, AdapterError>;

    fn current_epoch(&self, cancel: &CancelToken) -> Result<U256, AdapterError>;

    fn current_phase(&self, cancel: &CancelToken) -> Result<Phase, AdapterError>;

    fn voting_powers(
        &self,
        cancel: &CancelToken,
        provider: Address,
        timestamp: Timestamp,
    ) -> Result<Vec<OperatorVotingPower>, AdapterError>;

    fn required_keys(
        &self,
        cancel: &CancelToken,
        provider: Address,
        timestamp: Timestamp,
    ) -> Result<Vec<OperatorWithKeys>, AdapterError>;

    fn required_key_tag(
        &self,
        cancel: &CancelToken,
        timestamp: Timestamp,
    ) -> Result<u8, AdapterError>;

    fn quorum_threshold(
        &self,
        cancel: &CancelToken,
        timestamp: Timestamp,
        key_tag: u8,
    ) -> Result<U256, AdapterError>;

    fn subnetwork(&self, cancel: &CancelToken) -> Result<H256, AdapterError>;

    fn eip712_domain(&self, cancel: &CancelToken) -> Result<Eip712Domain, AdapterError>;
}
