use ark_bls12_377::{G1Affine, G1Projective};
use ark_ec::{AffineCurve, ProjectiveCurve};
use ark_ff::Zero;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Read, SerializationError, Write};

/// A BLS signature (or partial signature) on G1
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(G1Projective);

impl From<G1Projective> for Signature {
    fn from(sig: G1Projective) -> Signature {
        Signature(sig)
    }
}

impl AsRef<G1Projective> for Signature {
    fn as_ref(&self) -> &G1Projective {
        &self.0
    }
}

impl Signature {
    /// Sums the provided signatures to produce the aggregate signature.
    /// The empty iterator aggregates to the identity element.
    pub fn aggregate<'a, I: IntoIterator<Item = &'a Signature>>(signatures: I) -> Signature {
        let mut asig = G1Projective::zero();
        for sig in signatures {
            asig += sig.as_ref();
        }
        asig.into()
    }
}

impl CanonicalSerialize for Signature {
    fn serialize<W: Write>(&self, writer: W) -> Result<(), SerializationError> {
        self.0.into_affine().serialize(writer)
    }

    fn serialized_size(&self) -> usize {
        self.0.into_affine().serialized_size()
    }
}

impl CanonicalDeserialize for Signature {
    fn deserialize<R: Read>(reader: R) -> Result<Self, SerializationError> {
        Ok(Signature(G1Affine::deserialize(reader)?.into_projective()))
    }
}
