use crate::{hash_to_g1, BLSError, BlsResult, PrivateKey, Signature};

use ark_bls12_377::{Bls12_377, Fq12, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::{AffineCurve, PairingEngine, ProjectiveCurve};
use ark_ff::{One, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Read, SerializationError, Write};
use std::ops::Neg;

/// A BLS public key.
///
/// The G2 half is the verification key; the G1 half is the mirror of the
/// same secret committed by the proof circuit. Both are fixed by the secret
/// key, and the canonical serialization `g1 ‖ g2` is the key payload format
/// the rest of the system passes around.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PublicKey {
    g1: G1Projective,
    g2: G2Projective,
}

impl From<&PrivateKey> for PublicKey {
    fn from(sk: &PrivateKey) -> PublicKey {
        let repr = sk.as_ref().into_repr();
        PublicKey {
            g1: G1Projective::prime_subgroup_generator().mul(repr),
            g2: G2Projective::prime_subgroup_generator().mul(repr),
        }
    }
}

impl PublicKey {
    /// The G1 mirror of the key, as committed by the circuit
    pub fn g1(&self) -> &G1Projective {
        &self.g1
    }

    /// The G2 verification key
    pub fn g2(&self) -> &G2Projective {
        &self.g2
    }

    /// Sums the provided public keys, coordinate group by coordinate group.
    /// The empty slice aggregates to the identity key.
    pub fn aggregate<'a, I: IntoIterator<Item = &'a PublicKey>>(public_keys: I) -> PublicKey {
        let mut g1 = G1Projective::zero();
        let mut g2 = G2Projective::zero();
        for pk in public_keys {
            g1 += &pk.g1;
            g2 += &pk.g2;
        }
        PublicKey { g1, g2 }
    }

    /// Checks `e(H(m), pk_g2) * e(-σ, g2) == 1`
    pub fn verify(&self, message_hash: &[u8; 32], signature: &Signature) -> BlsResult<()> {
        let message = hash_to_g1(message_hash)?;
        let pairing = Bls12_377::product_of_pairings(&[
            (
                message.into_affine().into(),
                self.g2.into_affine().into(),
            ),
            (
                signature.as_ref().into_affine().neg().into(),
                G2Affine::prime_subgroup_generator().into(),
            ),
        ]);
        if pairing == Fq12::one() {
            Ok(())
        } else {
            Err(BLSError::VerificationFailed)
        }
    }
}

impl CanonicalSerialize for PublicKey {
    fn serialize<W: Write>(&self, mut writer: W) -> Result<(), SerializationError> {
        self.g1.into_affine().serialize(&mut writer)?;
        self.g2.into_affine().serialize(&mut writer)
    }

    fn serialized_size(&self) -> usize {
        self.g1.into_affine().serialized_size() + self.g2.into_affine().serialized_size()
    }
}

impl CanonicalDeserialize for PublicKey {
    fn deserialize<R: Read>(mut reader: R) -> Result<Self, SerializationError> {
        let g1 = G1Affine::deserialize(&mut reader)?;
        let g2 = G2Affine::deserialize(&mut reader)?;
        Ok(PublicKey {
            g1: g1.into_projective(),
            g2: g2.into_projective(),
        })
    }
}
