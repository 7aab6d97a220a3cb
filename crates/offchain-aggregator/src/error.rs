use crate::chain::AdapterError;

use bls_crypto::BLSError;
use thiserror::Error;
use valset_snark::SnarkError;

#[derive(Debug, Error)]
pub enum AggregationError {
    /// A chain adapter call failed; the cause chains through
    #[error("chain adapter call failed")]
    Adapter(#[from] AdapterError),

    /// The proving pipeline failed
    #[error("proof pipeline failed")]
    Snark(#[from] SnarkError),

    /// Message hashing or signature handling failed
    #[error("bls operation failed")]
    Bls(#[from] BLSError),

    /// Local serialization failed
    #[error("serialization failed")]
    Serialization(#[from] ark_serialize::SerializationError),
}
