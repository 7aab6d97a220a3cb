//! Valset generators shared by the crate tests and the aggregation test
//! suite. Key material is derived from small deterministic scalars so test
//! failures reproduce.

use crate::{
    normalize_valset, BLSCurveG1Affine, BLSCurveG2Affine, ConstraintField, ProveInput,
    ValidatorData,
};

use ark_bls12_377::{Fr as ScalarField, G1Projective, G2Projective};
use ark_ec::{AffineCurve, ProjectiveCurve};
use ark_ff::{PrimeField, Zero};
use bls_crypto::{hash_to_g1, PrivateKey};

/// A validator set of `num` validators with 100 voting power each, the
/// listed indices flagged as non-signers
pub fn gen_valset(num: usize, non_signers: &[usize]) -> (Vec<ValidatorData>, Vec<PrivateKey>) {
    let mut valset = Vec::with_capacity(num);
    let mut secrets = Vec::with_capacity(num);
    for i in 0..num {
        let sk = PrivateKey::from(ScalarField::from((i + 10) as u64));
        let pk = sk.to_public();
        valset.push(ValidatorData {
            key: pk.g1().into_affine(),
            key_g2: pk.g2().into_affine(),
            voting_power: ConstraintField::from(100u64),
            is_non_signer: false,
        });
        secrets.push(sk);
    }
    for &index in non_signers {
        valset[index].is_non_signer = true;
    }
    (valset, secrets)
}

/// A fixed message point for tests
pub fn test_message() -> BLSCurveG1Affine {
    hash_to_g1(&[0x42u8; 32])
        .expect("test message must hash to the curve")
        .into_affine()
}

/// Signs the message point with every signer of the valset and returns the
/// aggregate signature along with the signers' aggregate G2 key. Both sums
/// only depend on the signer subset, not on validator order.
pub fn sign_valset(
    message: &BLSCurveG1Affine,
    valset: &[ValidatorData],
    secrets: &[PrivateKey],
) -> (BLSCurveG1Affine, BLSCurveG2Affine) {
    let mut signature = G1Projective::zero();
    let mut agg_key_g2 = G2Projective::zero();
    for (validator, secret) in valset.iter().zip(secrets) {
        if validator.is_non_signer {
            continue;
        }
        signature += &message.mul(secret.as_ref().into_repr());
        agg_key_g2 += &validator.key_g2.into_projective();
    }
    (signature.into_affine(), agg_key_g2.into_affine())
}

/// The normalized prove input for a generated valset
pub fn prove_input(
    valset: &[ValidatorData],
    secrets: &[PrivateKey],
    message: &BLSCurveG1Affine,
) -> ProveInput {
    let (signature, signers_agg_key_g2) = sign_valset(message, valset, secrets);
    let validator_data =
        normalize_valset(valset.to_vec()).expect("test valsets fit the capacity list");
    ProveInput {
        validator_data,
        message_g1: *message,
        signature,
        signers_agg_key_g2,
    }
}
