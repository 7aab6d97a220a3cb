use crate::{hash_to_g1, BlsResult, PublicKey, Signature};

use ark_bls12_377::{Fr, G1Projective};
use ark_ec::ProjectiveCurve;
use ark_ff::{PrimeField, UniformRand};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Read, SerializationError, Write};
use rand::Rng;

/// A private key using the pairing friendly curve's scalar field
#[derive(Clone, Debug, CanonicalSerialize, CanonicalDeserialize)]
pub struct PrivateKey(Fr);

impl From<Fr> for PrivateKey {
    fn from(sk: Fr) -> PrivateKey {
        PrivateKey(sk)
    }
}

impl AsRef<Fr> for PrivateKey {
    fn as_ref(&self) -> &Fr {
        &self.0
    }
}

impl PrivateKey {
    /// Samples a new private key uniformly from the scalar field
    pub fn generate<R: Rng>(rng: &mut R) -> PrivateKey {
        PrivateKey(Fr::rand(rng))
    }

    /// Hashes the 32-byte message hash to G1 and signs the resulting point
    pub fn sign(&self, message_hash: &[u8; 32]) -> BlsResult<Signature> {
        let hash = hash_to_g1(message_hash)?;
        Ok(self.sign_raw(&hash))
    }

    fn sign_raw(&self, message: &G1Projective) -> Signature {
        message.mul(self.0.into_repr()).into()
    }

    /// Converts the private key to its public key
    pub fn to_public(&self) -> PublicKey {
        PublicKey::from(self)
    }
}
