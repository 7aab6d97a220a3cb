//! # BLS Cryptography
//!
//! BLS signatures over BLS12-377 for the validator set middleware.
//!
//! Signatures live on G1, verification keys on G2. Every key pair also
//! carries the G1 mirror of its public key, which is the half committed by
//! the aggregate-signature proof circuit. The serialized form of a public
//! key, `g1 ‖ g2` in compressed affine coordinates, is the key payload
//! published on chain and matched against signature-pool entries.

pub(crate) mod bls;
pub use bls::{PrivateKey, PublicKey, Signature};

/// Deterministic hashing of 32-byte message hashes to G1.
pub mod hash_to_curve;
pub use hash_to_curve::hash_to_g1;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use thiserror::Error;

/// Convenience result alias
pub type BlsResult<T> = std::result::Result<T, BLSError>;

#[derive(Debug, Error)]
/// Error type
pub enum BLSError {
    /// The pairing check rejected the signature
    #[error("signature verification failed")]
    VerificationFailed,

    /// Try-and-increment ran out of attempts
    #[error("could not hash message to the curve")]
    HashToCurveFailed,

    /// Malformed, off-curve or wrong-subgroup point bytes
    #[error(transparent)]
    SerializationError(#[from] ark_serialize::SerializationError),
}
