//! The aggregate-signature circuit.
//!
//! One public input — the masked Keccak digest of
//! `(valset_hash, signers_agg_voting_power, message)` — binds everything the
//! on-chain side anchors. Everything else is witnessed: the declared voting
//! power and message point are "virtually public" through the digest, while
//! the per-validator non-signer flags stay hidden.

use crate::{BLSCurveG1Affine, BLSCurveG2Affine, ConstraintField, ProveInput};

use ark_bls12_377::{
    constraints::{Fq12Var, G1Var, G2Var, PairingVar},
    G1Projective, G2Projective,
};
use ark_ec::ProjectiveCurve;
use ark_ff::{PrimeField, Zero};
use ark_r1cs_std::{
    alloc::AllocationMode, fields::fp::FpVar, pairing::PairingVar as _, prelude::*, uint8::UInt8,
    Assignment,
};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use bls_gadgets::{
    g1_coords, g2_coords,
    utils::{field_to_be_bytes, fp_to_be_bytes, fp_to_le_limbs},
    G1PointVar, G2PointVar, Keccak256Gadget, MimcVar,
};
use tiny_keccak::{Hasher, Keccak};
use tracing::{debug, info, span, Level};

type F = ConstraintField;

/// One slot of the fixed-capacity validator table
#[derive(Clone)]
pub struct ValidatorSlot {
    pub key: Option<BLSCurveG1Affine>,
    pub voting_power: Option<F>,
    pub is_non_signer: Option<bool>,
}

impl ValidatorSlot {
    fn blank() -> Self {
        ValidatorSlot {
            key: None,
            voting_power: None,
            is_non_signer: None,
        }
    }
}

#[derive(Clone)]
pub struct AggregateSignatureCircuit {
    /// The single public input
    pub input_hash: Option<F>,
    /// Virtually public: committed by `input_hash`
    pub signers_agg_voting_power: Option<F>,
    /// Virtually public: committed by `input_hash`
    pub message: Option<BLSCurveG1Affine>,
    pub signature: Option<BLSCurveG1Affine>,
    pub signers_agg_key_g2: Option<BLSCurveG2Affine>,
    pub validator_data: Vec<ValidatorSlot>,
}

impl AggregateSignatureCircuit {
    /// An unassigned circuit of the given capacity, for the trusted setup
    pub fn empty(capacity: usize) -> Self {
        AggregateSignatureCircuit {
            input_hash: None,
            signers_agg_voting_power: None,
            message: None,
            signature: None,
            signers_agg_key_g2: None,
            validator_data: vec![ValidatorSlot::blank(); capacity],
        }
    }

    /// The fully assigned circuit for a normalized prove input, along with
    /// the public input value and the declared signer voting power
    pub fn new(input: &ProveInput) -> (Self, F, F) {
        let signers_agg_voting_power = input
            .validator_data
            .iter()
            .filter(|validator| !validator.is_non_signer)
            .fold(F::zero(), |acc, validator| acc + validator.voting_power);
        let valset_hash = crate::hash_valset(&input.validator_data);
        let input_hash_bytes =
            public_input_hash(&valset_hash, &signers_agg_voting_power, &input.message_g1);
        let input_hash = F::from_be_bytes_mod_order(&input_hash_bytes);

        let circuit = AggregateSignatureCircuit {
            input_hash: Some(input_hash),
            signers_agg_voting_power: Some(signers_agg_voting_power),
            message: Some(input.message_g1),
            signature: Some(input.signature),
            signers_agg_key_g2: Some(input.signers_agg_key_g2),
            validator_data: input
                .validator_data
                .iter()
                .map(|validator| ValidatorSlot {
                    key: Some(validator.key),
                    voting_power: Some(validator.voting_power),
                    is_non_signer: Some(validator.is_non_signer),
                })
                .collect(),
        };
        (circuit, input_hash, signers_agg_voting_power)
    }
}

/// The masked Keccak digest committing the proof's virtually-public inputs:
/// `keccak256(valset_hash ‖ signers_vp(32, BE) ‖ message.X ‖ message.Y)`
/// with the top three bits cleared. The same masking runs in-circuit.
pub fn public_input_hash(
    valset_hash: &F,
    signers_agg_voting_power: &F,
    message: &BLSCurveG1Affine,
) -> [u8; 32] {
    let mut preimage = field_to_be_bytes(valset_hash);
    let vp_bytes = field_to_be_bytes(signers_agg_voting_power);
    preimage.extend_from_slice(&vp_bytes[vp_bytes.len() - 32..]);
    let (x, y) = g1_coords(message);
    preimage.extend(field_to_be_bytes(&x));
    preimage.extend(field_to_be_bytes(&y));

    let mut hasher = Keccak::v256();
    hasher.update(&preimage);
    let mut digest = [0u8; 32];
    hasher.finalize(&mut digest);
    mask_input_hash(digest)
}

/// Clears the top three bits so the digest is a canonical field element on
/// every curve the anchor format supports
pub fn mask_input_hash(mut input_hash: [u8; 32]) -> [u8; 32] {
    input_hash[0] &= 0x1f;
    input_hash
}

impl ConstraintSynthesizer<F> for AggregateSignatureCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let span = span!(Level::TRACE, "AggregateSignatureCircuit");
        let _enter = span.enter();
        info!(
            "generating constraints for {} validator slots",
            self.validator_data.len()
        );

        let input_hash = FpVar::new_input(cs.clone(), || self.input_hash.get())?;
        let signers_agg_voting_power =
            FpVar::new_witness(cs.clone(), || self.signers_agg_voting_power.get())?;
        let message = alloc_g1(cs.clone(), &self.message)?;
        let signature = alloc_g1(cs.clone(), &self.signature)?;
        let signers_agg_key_g2 = alloc_g2(cs.clone(), &self.signers_agg_key_g2)?;

        // ---- validator set consistency ----
        debug!("accumulating validator slots");
        let mut mimc = MimcVar::new();
        let mut valset_hash = FpVar::zero();
        let mut signers_agg_key = G1PointVar::zero();
        let mut accumulated_voting_power = FpVar::zero();

        for slot in &self.validator_data {
            let key = alloc_g1(cs.clone(), &slot.key)?;
            let voting_power = FpVar::new_witness(cs.clone(), || slot.voting_power.get())?;
            let is_non_signer = Boolean::new_witness(cs.clone(), || slot.is_non_signer.get())?;

            for limb in fp_to_le_limbs(&key.x)? {
                mimc.write(&limb)?;
            }
            for limb in fp_to_le_limbs(&key.y)? {
                mimc.write(&limb)?;
            }
            mimc.write(&voting_power)?;

            let is_filler = key.is_zero()?;
            // commit the slot unless it is padding
            valset_hash = is_filler.select(&valset_hash, &mimc.sum())?;

            let is_skip = is_filler.or(&is_non_signer)?;
            accumulated_voting_power = is_skip.select(
                &accumulated_voting_power,
                &(&accumulated_voting_power + &voting_power),
            )?;
            signers_agg_key =
                is_skip.select(&signers_agg_key, &signers_agg_key.add_unified(&key)?)?;
        }
        accumulated_voting_power.enforce_equal(&signers_agg_voting_power)?;

        // ---- input hash binding ----
        debug!("binding the public input digest");
        let mut preimage = fp_to_be_bytes(&valset_hash)?;
        preimage.extend(voting_power_be32(&signers_agg_voting_power)?);
        preimage.extend(fp_to_be_bytes(&message.x)?);
        preimage.extend(fp_to_be_bytes(&message.y)?);
        let digest = Keccak256Gadget::digest(&preimage)?;
        enforce_masked_digest(&input_hash, &digest)?;

        // ---- aggregate signature, linearized ----
        debug!("enforcing the pairing check");
        let mut transcript = MimcVar::new();
        for coordinate in &[
            &signature.x,
            &signature.y,
            &signers_agg_key.x,
            &signers_agg_key.y,
            &signers_agg_key_g2.x_c0,
            &signers_agg_key_g2.x_c1,
            &signers_agg_key_g2.y_c0,
            &signers_agg_key_g2.y_c1,
            &message.x,
            &message.y,
        ] {
            for limb in fp_to_le_limbs(coordinate)? {
                transcript.write(&limb)?;
            }
        }
        let alpha_bits = transcript.sum().to_bits_le()?;

        // zero flags of the loop-derived G1 aggregate and the allocated G2
        // aggregate, taken before both are lifted to curve representation
        let agg_key_is_zero = signers_agg_key.is_zero()?;
        let agg_key_g2_is_zero = signers_agg_key_g2.is_zero()?;

        let signature = signature.to_curve_var()?;
        let signers_agg_key = signers_agg_key.to_curve_var()?;
        let message = message.to_curve_var()?;
        let signers_agg_key_g2 = signers_agg_key_g2.to_curve_var()?;

        let g1_generator = G1Var::new_variable_omit_prime_order_check(
            cs.clone(),
            || Ok(G1Projective::prime_subgroup_generator()),
            AllocationMode::Constant,
        )?;
        let g2_generator = G2Var::new_variable_omit_prime_order_check(
            cs,
            || Ok(G2Projective::prime_subgroup_generator()),
            AllocationMode::Constant,
        )?;
        let neg_g2_generator = g2_generator.negate()?;

        // e(σ + α·apk₁, -g₂) · e(m + α·g₁, apk₂) == 1
        let sigma_side = signature + signers_agg_key.scalar_mul_le(alpha_bits.iter())?;
        let message_side = message + g1_generator.scalar_mul_le(alpha_bits.iter())?;

        // With no signer at all the honest instance is the identity on both
        // sides, which the affine pairing gadget cannot consume. Substitute
        // the trivially balanced pair e(m + α·g₁, -g₂) · e(m + α·g₁, g₂).
        // The gate requires the loop-derived G1 aggregate to be the identity
        // too, so a non-empty signer selection can never reach the
        // substitution by forging the free G2 witness.
        let degenerate = sigma_side
            .is_zero()?
            .and(&agg_key_g2_is_zero)?
            .and(&agg_key_is_zero)?;
        let first_g1 = degenerate.select(&message_side, &sigma_side)?;
        let second_g2 = degenerate.select(&g2_generator, &signers_agg_key_g2)?;

        let pairing = PairingVar::product_of_pairings(
            &[
                PairingVar::prepare_g1(&first_g1)?,
                PairingVar::prepare_g1(&message_side)?,
            ],
            &[
                PairingVar::prepare_g2(&neg_g2_generator)?,
                PairingVar::prepare_g2(&second_g2)?,
            ],
        )?;
        pairing.enforce_equal(&Fq12Var::one())?;

        info!("constraints generated");
        Ok(())
    }
}

fn alloc_g1(
    cs: ConstraintSystemRef<F>,
    point: &Option<BLSCurveG1Affine>,
) -> Result<G1PointVar<F>, SynthesisError> {
    let coords = point.map(|p| g1_coords(&p));
    let x = FpVar::new_witness(cs.clone(), || coords.map(|c| c.0).get())?;
    let y = FpVar::new_witness(cs, || coords.map(|c| c.1).get())?;
    Ok(G1PointVar { x, y })
}

fn alloc_g2(
    cs: ConstraintSystemRef<F>,
    point: &Option<BLSCurveG2Affine>,
) -> Result<G2PointVar<F>, SynthesisError> {
    let coords = point.map(|p| g2_coords(&p));
    let x_c0 = FpVar::new_witness(cs.clone(), || coords.map(|c| c.0).get())?;
    let x_c1 = FpVar::new_witness(cs.clone(), || coords.map(|c| c.1).get())?;
    let y_c0 = FpVar::new_witness(cs.clone(), || coords.map(|c| c.2).get())?;
    let y_c1 = FpVar::new_witness(cs, || coords.map(|c| c.3).get())?;
    Ok(G2PointVar {
        x_c0,
        x_c1,
        y_c0,
        y_c1,
    })
}

/// The 32-byte big-endian voting power, enforcing that the value fits
fn voting_power_be32(voting_power: &FpVar<F>) -> Result<Vec<UInt8<F>>, SynthesisError> {
    let bytes = voting_power.to_bytes()?;
    for byte in &bytes[32..] {
        byte.enforce_equal(&UInt8::constant(0))?;
    }
    let mut out = bytes[..32].to_vec();
    out.reverse();
    Ok(out)
}

/// Byte-compares the digest against the big-endian encoding of the public
/// input. The top three digest bits are masked off; the matching bits of the
/// public input are constrained to zero instead.
fn enforce_masked_digest(
    input_hash: &FpVar<F>,
    digest: &[UInt8<F>],
) -> Result<(), SynthesisError> {
    let bits = input_hash.to_bits_le()?;
    for bit in &bits[253..] {
        bit.enforce_equal(&Boolean::constant(false))?;
    }
    for (i, byte) in digest.iter().enumerate() {
        for (j, bit) in byte.to_bits_le()?.iter().enumerate() {
            let position = 8 * (31 - i) + j;
            if position >= 253 {
                continue;
            }
            bit.enforce_equal(&bits[position])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gen_valset, prove_input, test_message};
    use ark_ff::UniformRand;
    use ark_relations::r1cs::ConstraintSystem;
    use rand::thread_rng;

    fn is_satisfied(circuit: AggregateSignatureCircuit) -> bool {
        let cs = ConstraintSystem::<F>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    /// Like [`is_satisfied`], but treats a synthesis error as a rejection:
    /// forged witnesses may make the pairing gadget's witness generation
    /// fail outright instead of leaving constraints unsatisfied
    fn is_satisfiable(circuit: AggregateSignatureCircuit) -> bool {
        let cs = ConstraintSystem::<F>::new_ref();
        circuit.generate_constraints(cs.clone()).is_ok() && cs.is_satisfied().unwrap()
    }

    fn assigned_circuit(
        num: usize,
        non_signers: &[usize],
    ) -> (AggregateSignatureCircuit, F, F) {
        let (valset, secrets) = gen_valset(num, non_signers);
        let message = test_message();
        let input = prove_input(&valset, &secrets, &message);
        AggregateSignatureCircuit::new(&input)
    }

    #[test]
    fn test_all_signers_satisfy() {
        let (circuit, _, voting_power) = assigned_circuit(10, &[]);
        assert_eq!(voting_power, F::from(1000u64));
        assert!(is_satisfied(circuit));
    }

    #[test]
    fn test_non_signers_are_excluded() {
        let (circuit, _, voting_power) = assigned_circuit(10, &[0, 1, 2]);
        assert_eq!(voting_power, F::from(700u64));
        assert!(is_satisfied(circuit));
    }

    #[test]
    fn test_padded_set_satisfies() {
        let (circuit, _, voting_power) = assigned_circuit(7, &[1]);
        assert_eq!(voting_power, F::from(600u64));
        assert_eq!(circuit.validator_data.len(), 10);
        assert!(is_satisfied(circuit));
    }

    #[test]
    fn test_all_non_signers_with_identity_signature() {
        let non_signers = (0..10).collect::<Vec<_>>();
        let (circuit, _, voting_power) = assigned_circuit(10, &non_signers);
        assert_eq!(voting_power, F::zero());
        assert!(is_satisfied(circuit));
    }

    #[test]
    fn test_empty_valset_satisfies() {
        let (circuit, _, voting_power) = assigned_circuit(0, &[]);
        assert_eq!(voting_power, F::zero());
        assert!(is_satisfied(circuit));
    }

    #[test]
    fn test_declared_voting_power_must_match() {
        let (mut circuit, _, voting_power) = assigned_circuit(10, &[0]);
        circuit.signers_agg_voting_power = Some(voting_power + F::from(1u64));
        assert!(!is_satisfied(circuit));
    }

    #[test]
    fn test_tampered_input_hash_fails() {
        let (mut circuit, input_hash, _) = assigned_circuit(10, &[0]);
        circuit.input_hash = Some(input_hash + F::from(1u64));
        assert!(!is_satisfied(circuit));
    }

    #[test]
    fn test_forged_signature_fails() {
        let rng = &mut thread_rng();
        let (mut circuit, _, _) = assigned_circuit(10, &[]);
        circuit.signature = Some(ark_bls12_377::G1Projective::rand(rng).into_affine());
        assert!(!is_satisfied(circuit));
    }

    #[test]
    fn test_flipping_a_signer_flag_fails() {
        // claiming a non-signer signed changes the accumulated power away
        // from the committed declaration
        let (mut circuit, _, _) = assigned_circuit(10, &[3]);
        for slot in circuit.validator_data.iter_mut() {
            if slot.is_non_signer == Some(true) {
                slot.is_non_signer = Some(false);
            }
        }
        assert!(!is_satisfied(circuit));
    }

    #[test]
    fn test_forged_zero_g2_aggregate_fails() {
        // a full signer set with the free G2 aggregate witness zeroed out
        // must not reach the degenerate substitution: the loop-derived G1
        // aggregate is non-zero, so the real pairing check runs and rejects
        let (mut circuit, _, _) = assigned_circuit(10, &[]);
        circuit.signers_agg_key_g2 = Some(BLSCurveG2Affine::zero());
        assert!(!is_satisfiable(circuit));
    }

    #[test]
    fn test_forged_identity_signature_fails() {
        // zeroing both the signature and the G2 aggregate while slots still
        // claim to have signed must not verify either
        let (mut circuit, _, _) = assigned_circuit(10, &[]);
        circuit.signature = Some(BLSCurveG1Affine::zero());
        circuit.signers_agg_key_g2 = Some(BLSCurveG2Affine::zero());
        assert!(!is_satisfiable(circuit));
    }

    #[test]
    fn test_tampered_filler_slot_is_ignored() {
        // writing voting power into a filler must not change the statement:
        // the hash and the aggregates skip fillers entirely
        let (circuit, input_hash, _) = assigned_circuit(7, &[]);
        let (mut tampered, _, _) = assigned_circuit(7, &[]);
        for slot in tampered.validator_data.iter_mut() {
            if slot.key == Some(BLSCurveG1Affine::zero()) {
                slot.voting_power = Some(F::from(999u64));
            }
        }
        assert_eq!(circuit.input_hash, Some(input_hash));
        assert!(is_satisfied(tampered));
    }
}
