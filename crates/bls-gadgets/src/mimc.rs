//! MiMC over the constraint field, in Miyaguchi-Preneel mode.
//!
//! The same round-constant table drives the native hasher and the gadget,
//! so the validator set commitment computed off-circuit is bit-for-bit the
//! value the circuit accumulates. `sum()` returns the running state without
//! resetting it: absorbing further elements chains on top of the previous
//! digest, which is what lets the circuit overwrite its running commitment
//! per validator instead of hashing a list of hashes.

use ark_bw6_761::Fr;
use ark_ff::{Field, PrimeField, Zero};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;
use once_cell::sync::Lazy;
use tiny_keccak::{Hasher, Keccak};

/// Enough x^5 rounds to cover the 377-bit field
pub const MIMC_ROUNDS: usize = 163;

const MIMC_SEED: &[u8] = b"valset-mimc-bw6-761";

/// Round constants, derived by a Keccak-256 chain over the seed. The first
/// round constant is zero, as in the original MiMC construction.
static ROUND_CONSTANTS: Lazy<Vec<Fr>> = Lazy::new(|| {
    let mut constants = Vec::with_capacity(MIMC_ROUNDS);
    constants.push(Fr::zero());
    let mut digest = keccak256(MIMC_SEED);
    for _ in 1..MIMC_ROUNDS {
        constants.push(Fr::from_be_bytes_mod_order(&digest));
        digest = keccak256(&digest);
    }
    constants
});

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// The native hasher
#[derive(Clone, Debug, Default)]
pub struct Mimc {
    state: Fr,
}

impl Mimc {
    pub fn new() -> Self {
        Mimc { state: Fr::zero() }
    }

    /// Absorbs one field element: `h ← E_h(m) + h + m` where the keyed
    /// permutation is `x ← (x + h + c_i)^5` over all round constants
    pub fn write(&mut self, element: Fr) {
        let mut x = element;
        for constant in ROUND_CONSTANTS.iter() {
            let t = x + self.state + constant;
            x = t.square().square() * t;
        }
        self.state = x + self.state + element;
    }

    /// The running digest. Further writes continue from this state.
    pub fn sum(&self) -> Fr {
        self.state
    }
}

/// One-shot hash of a sequence of field elements
pub fn mimc_hash(elements: &[Fr]) -> Fr {
    let mut hasher = Mimc::new();
    for element in elements {
        hasher.write(*element);
    }
    hasher.sum()
}

/// The in-circuit hasher, mirroring [`Mimc`] state for state
#[derive(Clone)]
pub struct MimcVar {
    state: FpVar<Fr>,
}

impl MimcVar {
    pub fn new() -> Self {
        MimcVar {
            state: FpVar::zero(),
        }
    }

    pub fn write(&mut self, element: &FpVar<Fr>) -> Result<(), SynthesisError> {
        let mut x = element.clone();
        for constant in ROUND_CONSTANTS.iter() {
            let t = &x + &self.state + FpVar::constant(*constant);
            let t_sq = t.square()?;
            x = &t_sq * &t_sq * &t;
        }
        self.state = &x + &self.state + element;
        Ok(())
    }

    pub fn sum(&self) -> FpVar<Fr> {
        self.state.clone()
    }
}

impl Default for MimcVar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::ConstraintSystem;
    use rand::thread_rng;

    #[test]
    fn test_gadget_matches_native() {
        let rng = &mut thread_rng();
        let cs = ConstraintSystem::<Fr>::new_ref();

        let elements = (0..13).map(|_| Fr::rand(rng)).collect::<Vec<_>>();
        let native = mimc_hash(&elements);

        let mut gadget = MimcVar::new();
        for element in &elements {
            let var = FpVar::new_witness(cs.clone(), || Ok(*element)).unwrap();
            gadget.write(&var).unwrap();
        }

        assert_eq!(gadget.sum().value().unwrap(), native);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_chained_sum_matches_split_writes() {
        let a = Fr::from(1u64);
        let b = Fr::from(2u64);

        let mut hasher = Mimc::new();
        hasher.write(a);
        let first = hasher.sum();
        hasher.write(b);

        assert_ne!(first, hasher.sum());
        assert_eq!(hasher.sum(), mimc_hash(&[a, b]));
    }

    #[test]
    fn test_distinct_inputs_distinct_digests() {
        assert_ne!(
            mimc_hash(&[Fr::from(1u64)]),
            mimc_hash(&[Fr::from(2u64)])
        );
    }
}
