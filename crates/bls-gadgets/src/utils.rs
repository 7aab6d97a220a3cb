//! Byte and limb conversions shared by the native hashers and the circuit.
//!
//! The MiMC commitment absorbs curve coordinates as 8-byte limbs, least
//! significant limb first, and the Keccak binding consumes big-endian field
//! element bytes. Both sides of every conversion live here so the native
//! and in-circuit encodings cannot drift apart.

use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*, uint8::UInt8};
use ark_relations::r1cs::SynthesisError;

/// The number of bytes in a serialized field element
pub fn field_byte_len<F: PrimeField>() -> usize {
    (F::size_in_bits() + 7) / 8
}

/// Big-endian bytes of a field element
pub fn field_to_be_bytes<F: PrimeField>(element: &F) -> Vec<u8> {
    element.into_repr().to_bytes_be()
}

/// Splits a field element into 8-byte limbs, least significant limb first
pub fn field_to_le_limbs<F: PrimeField>(element: &F) -> Vec<F> {
    let bytes = element.into_repr().to_bytes_le();
    bytes
        .chunks(8)
        .map(|chunk| {
            let mut limb = [0u8; 8];
            limb[..chunk.len()].copy_from_slice(chunk);
            F::from(u64::from_le_bytes(limb))
        })
        .collect()
}

/// Big-endian byte gadgets of a field element variable
pub fn fp_to_be_bytes<F: PrimeField>(element: &FpVar<F>) -> Result<Vec<UInt8<F>>, SynthesisError> {
    let mut bytes = element.to_bytes()?;
    bytes.reverse();
    Ok(bytes)
}

/// Splits a field element variable into 8-byte limb variables, least
/// significant limb first. Limb values match [`field_to_le_limbs`].
pub fn fp_to_le_limbs<F: PrimeField>(element: &FpVar<F>) -> Result<Vec<FpVar<F>>, SynthesisError> {
    let mut bits = element.to_bits_le()?;
    while bits.len() % 64 != 0 {
        bits.push(Boolean::constant(false));
    }
    bits.chunks(64)
        .map(|chunk| Boolean::le_bits_to_fp_var(chunk))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bw6_761::Fr;
    use ark_ff::UniformRand;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::ConstraintSystem;
    use rand::thread_rng;

    #[test]
    fn test_limbs_match_native() {
        let rng = &mut thread_rng();
        let cs = ConstraintSystem::<Fr>::new_ref();
        for _ in 0..10 {
            let element = Fr::rand(rng);
            let native = field_to_le_limbs(&element);

            let var = FpVar::new_witness(cs.clone(), || Ok(element)).unwrap();
            let limbs = fp_to_le_limbs(&var).unwrap();

            assert_eq!(native.len(), limbs.len());
            for (native_limb, limb) in native.iter().zip(&limbs) {
                assert_eq!(*native_limb, limb.value().unwrap());
            }
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_be_bytes_match_native() {
        let rng = &mut thread_rng();
        let cs = ConstraintSystem::<Fr>::new_ref();
        let element = Fr::rand(rng);

        let var = FpVar::new_witness(cs.clone(), || Ok(element)).unwrap();
        let bytes = fp_to_be_bytes(&var).unwrap();
        let native = field_to_be_bytes(&element);

        assert_eq!(native.len(), bytes.len());
        for (native_byte, byte) in native.iter().zip(&bytes) {
            assert_eq!(*native_byte, byte.value().unwrap());
        }
        assert!(cs.is_satisfied().unwrap());
    }
}
