//! The proving and verifying service.
//!
//! Holds the Groth16 artifacts for every supported capacity; the keys are
//! read-only after initialization, so one instance serves concurrent
//! provers. `prove` snaps the validator count up to the smallest supported
//! capacity and re-verifies its own output before releasing it; `verify`
//! rebuilds the public witness from the input hash alone.

use crate::api::{load_or_setup, CircuitArtifacts, VerifierExport};
use crate::{
    mask_input_hash, normalize_valset, optimal_capacity, AggregateSignatureCircuit,
    ConstraintField, ProofCurve, ProveInput, SnarkError,
};

use ark_ff::PrimeField;
use ark_groth16::{create_random_proof, verify_proof, Proof};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use bls_gadgets::utils::field_to_be_bytes;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, span, warn, Level};

use crate::MAX_VALIDATORS;

/// A proof along with the voting power it publicly declares.
///
/// The wire format is the canonical uncompressed Groth16 proof followed by
/// the declared voting power, zero padded to 32 big-endian bytes.
#[derive(Clone, Debug)]
pub struct ProofData {
    pub proof: Vec<u8>,
    pub signers_agg_voting_power: ConstraintField,
}

impl ProofData {
    pub fn marshal(&self) -> Vec<u8> {
        let mut result = self.proof.clone();
        let vp_bytes = field_to_be_bytes(&self.signers_agg_voting_power);
        result.extend_from_slice(&vp_bytes[vp_bytes.len() - 32..]);
        result
    }
}

pub struct ZkProver {
    artifacts: BTreeMap<usize, CircuitArtifacts>,
}

impl ZkProver {
    /// Loads or generates the artifacts for every supported capacity under
    /// `circuits_dir`. Generation can take minutes per capacity.
    pub fn new<P: Into<PathBuf>>(circuits_dir: P) -> Result<Self, SnarkError> {
        let circuits_dir = circuits_dir.into();
        warn!("prover initialization started (circuit setup may take minutes)");
        let mut artifacts = BTreeMap::new();
        for &capacity in MAX_VALIDATORS {
            artifacts.insert(capacity, load_or_setup(&circuits_dir, capacity)?);
        }
        info!("prover initialization done");
        Ok(ZkProver { artifacts })
    }

    /// Proves that the non-signer-flagged subset of the validator set is
    /// consistent with the aggregate signature and the declared voting power
    pub fn prove(&self, input: &ProveInput) -> Result<ProofData, SnarkError> {
        let prove_span = span!(Level::TRACE, "prove");
        let _enter = prove_span.enter();

        let mut input = input.clone();
        input.validator_data = normalize_valset(input.validator_data)?;
        let capacity = input.validator_data.len();
        let artifacts = self
            .artifacts
            .get(&capacity)
            .ok_or(SnarkError::CapacityExceeded(capacity))?;

        let (circuit, input_hash, signers_agg_voting_power) =
            AggregateSignatureCircuit::new(&input);
        debug!(
            "proving with input hash 0x{}",
            hex::encode(field_to_be_bytes(&input_hash))
        );

        info!("proving");
        let rng = &mut rand::thread_rng();
        let proof = create_random_proof(circuit, &artifacts.pk, rng)?;
        info!("proved");

        // defensive: never hand out a proof this instance cannot verify
        if !verify_proof(&artifacts.pvk, &proof, &[input_hash])? {
            return Err(SnarkError::ProofRejected);
        }

        let mut proof_bytes = vec![];
        proof.serialize_uncompressed(&mut proof_bytes)?;
        Ok(ProofData {
            proof: proof_bytes,
            signers_agg_voting_power,
        })
    }

    /// The verifying key for a set of `valset_len` validators, as deployed
    /// alongside the on-chain verifier
    pub fn verifying_key(
        &self,
        valset_len: usize,
    ) -> Result<&ark_groth16::VerifyingKey<ProofCurve>, SnarkError> {
        let capacity =
            optimal_capacity(valset_len).ok_or(SnarkError::CapacityExceeded(valset_len))?;
        self.artifacts
            .get(&capacity)
            .map(|artifacts| &artifacts.vk)
            .ok_or(SnarkError::CapacityExceeded(valset_len))
    }

    /// The hex verifier export for a set of `valset_len` validators, the
    /// same rendering setup persists as `Verifier_<N>.json`
    pub fn verifier_export(&self, valset_len: usize) -> Result<VerifierExport, SnarkError> {
        let capacity =
            optimal_capacity(valset_len).ok_or(SnarkError::CapacityExceeded(valset_len))?;
        self.artifacts
            .get(&capacity)
            .map(|artifacts| VerifierExport::new(capacity, &artifacts.vk))
            .ok_or(SnarkError::CapacityExceeded(valset_len))
    }

    /// Verifies marshalled proof bytes against the externally computed
    /// public input hash for a set of `valset_len` validators
    pub fn verify(
        &self,
        valset_len: usize,
        input_hash: [u8; 32],
        proof_bytes: &[u8],
    ) -> Result<bool, SnarkError> {
        let capacity =
            optimal_capacity(valset_len).ok_or(SnarkError::CapacityExceeded(valset_len))?;
        let artifacts = self
            .artifacts
            .get(&capacity)
            .ok_or(SnarkError::CapacityExceeded(valset_len))?;

        let masked = mask_input_hash(input_hash);
        let public_input = ConstraintField::from_be_bytes_mod_order(&masked);
        debug!("verifying with input hash 0x{}", hex::encode(masked));

        // the trailing 32 voting power bytes only matter to the on-chain side
        let mut reader = proof_bytes;
        let proof: Proof<ProofCurve> = Proof::deserialize_uncompressed(&mut reader)
            .map_err(SnarkError::MalformedProof)?;

        Ok(verify_proof(&artifacts.pvk, &proof, &[public_input])?)
    }
}
