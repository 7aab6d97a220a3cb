//! Proof-form validator data: normalization to a supported capacity and the
//! native MiMC commitment the circuit reproduces.

use crate::{BLSCurveG1Affine, BLSCurveG2Affine, ConstraintField, SnarkError};

use ark_ff::{PrimeField, Zero};
use bls_gadgets::{g1_coords, mimc_hash, utils::field_to_le_limbs};

/// Supported circuit capacities, in ascending order. A development cap;
/// extend before running a production setup.
pub const MAX_VALIDATORS: &[usize] = &[10];

/// One validator as the circuit consumes it
#[derive(Clone, Debug)]
pub struct ValidatorData {
    /// The G1 half of the validator's BLS key, committed by the circuit
    pub key: BLSCurveG1Affine,
    /// The G2 half, aggregated across signers for the pairing check
    pub key_g2: BLSCurveG2Affine,
    pub voting_power: ConstraintField,
    pub is_non_signer: bool,
}

impl ValidatorData {
    /// A padding entry: identity keys, zero power, counted as a signer so it
    /// contributes nothing to either side of the check
    pub fn filler() -> Self {
        ValidatorData {
            key: BLSCurveG1Affine::zero(),
            key_g2: BLSCurveG2Affine::zero(),
            voting_power: ConstraintField::zero(),
            is_non_signer: false,
        }
    }

    pub fn is_filler(&self) -> bool {
        let (x, y) = g1_coords(&self.key);
        x.is_zero() && y.is_zero()
    }
}

/// Everything the prover needs for one proof
#[derive(Clone, Debug)]
pub struct ProveInput {
    pub validator_data: Vec<ValidatorData>,
    pub message_g1: BLSCurveG1Affine,
    pub signature: BLSCurveG1Affine,
    pub signers_agg_key_g2: BLSCurveG2Affine,
}

/// The smallest supported capacity that fits `len` validators
pub fn optimal_capacity(len: usize) -> Option<usize> {
    MAX_VALIDATORS.iter().copied().find(|&capacity| capacity >= len)
}

/// Sorts the validators ascending by their key coordinates and pads with
/// fillers up to the smallest supported capacity. Idempotent.
pub fn normalize_valset(
    mut valset: Vec<ValidatorData>,
) -> Result<Vec<ValidatorData>, SnarkError> {
    let len = valset.len();
    let capacity = optimal_capacity(len).ok_or(SnarkError::CapacityExceeded(len))?;

    valset.sort_by(|a, b| {
        let (ax, ay) = g1_coords(&a.key);
        let (bx, by) = g1_coords(&b.key);
        (ax.into_repr(), ay.into_repr()).cmp(&(bx.into_repr(), by.into_repr()))
    });
    while valset.len() < capacity {
        valset.push(ValidatorData::filler());
    }
    Ok(valset)
}

/// The MiMC commitment to the validator set.
///
/// Hashes, per non-filler validator, the key coordinates as 8-byte limbs
/// (least significant limb first, X then Y) followed by the voting power,
/// into a single running sponge. Stops at the first filler, so padded and
/// unpadded renditions of the same set commit to the same value.
pub fn hash_valset(valset: &[ValidatorData]) -> ConstraintField {
    let mut elements = Vec::new();
    for validator in valset {
        if validator.is_filler() {
            break;
        }
        let (x, y) = g1_coords(&validator.key);
        elements.extend(field_to_le_limbs(&x));
        elements.extend(field_to_le_limbs(&y));
        elements.push(validator.voting_power);
    }
    mimc_hash(&elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::gen_valset;

    #[test]
    fn test_normalize_pads_to_capacity() {
        let (valset, _) = gen_valset(7, &[]);
        let normalized = normalize_valset(valset).unwrap();
        assert_eq!(normalized.len(), 10);
        assert!(normalized[7..].iter().all(ValidatorData::is_filler));
    }

    #[test]
    fn test_normalize_exact_capacity_adds_no_fillers() {
        let (valset, _) = gen_valset(10, &[]);
        let normalized = normalize_valset(valset).unwrap();
        assert_eq!(normalized.len(), 10);
        assert!(normalized.iter().all(|v| !v.is_filler()));
    }

    #[test]
    fn test_normalize_rejects_oversized_set() {
        let (valset, _) = gen_valset(11, &[]);
        assert!(matches!(
            normalize_valset(valset),
            Err(SnarkError::CapacityExceeded(11))
        ));
    }

    #[test]
    fn test_normalize_sorts_by_key() {
        let (valset, _) = gen_valset(10, &[]);
        let normalized = normalize_valset(valset).unwrap();
        for pair in normalized.windows(2) {
            let (ax, ay) = g1_coords(&pair[0].key);
            let (bx, by) = g1_coords(&pair[1].key);
            assert!((ax.into_repr(), ay.into_repr()) <= (bx.into_repr(), by.into_repr()));
        }
    }

    #[test]
    fn test_fillers_are_invisible_to_the_hash() {
        let (valset, _) = gen_valset(7, &[]);
        let sorted = normalize_valset(valset.clone()).unwrap();
        let unpadded = sorted[..7].to_vec();
        assert_eq!(hash_valset(&unpadded), hash_valset(&sorted));
    }

    #[test]
    fn test_empty_set_normalizes_to_all_fillers() {
        let normalized = normalize_valset(vec![]).unwrap();
        assert_eq!(normalized.len(), 10);
        assert!(normalized.iter().all(ValidatorData::is_filler));
    }

    #[test]
    fn test_hash_depends_on_voting_power() {
        let (valset, _) = gen_valset(3, &[]);
        let mut tampered = valset.clone();
        tampered[0].voting_power += ConstraintField::from(1u64);
        assert_ne!(hash_valset(&valset), hash_valset(&tampered));
    }
}
