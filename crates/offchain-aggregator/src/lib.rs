//! # Offchain Aggregator
//!
//! The middleware half of the validator set pipeline: derive the canonical
//! validator set from on-chain configuration, build the committed header,
//! collect BLS partial signatures into a shared pool, and hand aggregate
//! signatures to the prover.
//!
//! The chain itself is reached through the [`chain::ChainAdapter`] seam;
//! this crate ships the trait contract and a deterministic mock. The RPC
//! implementation lives with the deployment, not here.

pub mod chain;
pub use chain::{AdapterError, CancelToken, ChainAdapter, Phase};

pub mod mock;
pub use mock::MockChainAdapter;

pub mod valset;
pub use valset::{Key, Validator, ValidatorSet, ValidatorSetHeader, Vault, VALSET_VERSION};

mod deriver;
pub use deriver::ValsetDeriver;

mod eip712;
pub use eip712::{domain_separator, valset_header_commit_digest};

mod header;
pub use header::ValsetGenerator;

mod pool;
pub use pool::SignaturePool;

mod aggregation;
pub use aggregation::{Aggregation, Prover};

mod error;
pub use error::AggregationError;
