//! # Validator Set SNARK
//!
//! Groth16 proofs, over BW6-761, that a declared subset of a committed
//! BLS12-377 validator set jointly produced an aggregate BLS signature on a
//! message point, and that the subset's voting power equals the declared
//! value. The verifier sees a single public input: the masked Keccak digest
//! binding the validator set commitment, the signers' voting power and the
//! message.

mod valset;
pub use valset::{
    hash_valset, normalize_valset, optimal_capacity, ProveInput, ValidatorData, MAX_VALIDATORS,
};

mod circuit;
pub use circuit::{mask_input_hash, public_input_hash, AggregateSignatureCircuit, ValidatorSlot};

pub mod api;
pub use api::{ProofData, VerifierExport, ZkProver};

mod error;
pub use error::SnarkError;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

// Instantiate certain types to avoid confusion
pub type BLSCurve = ark_bls12_377::Bls12_377;
pub type BLSCurveG1Affine = ark_bls12_377::G1Affine;
pub type BLSCurveG2Affine = ark_bls12_377::G2Affine;
pub type ProofCurve = ark_bw6_761::BW6_761;
/// The constraint field of the proof curve, equal to the base field of the
/// signature curve
pub type ConstraintField = ark_bw6_761::Fr;
