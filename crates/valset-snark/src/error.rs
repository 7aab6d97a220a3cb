use ark_relations::r1cs::SynthesisError;
use ark_serialize::SerializationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnarkError {
    /// The validator set does not fit the largest supported capacity
    #[error("validator set of size {0} exceeds the largest supported capacity")]
    CapacityExceeded(usize),

    /// Filesystem failure while loading or persisting circuit artifacts.
    /// Fatal on startup.
    #[error("circuit artifact io failed")]
    ArtifactIo(#[from] std::io::Error),

    /// Artifact bytes did not decode
    #[error("circuit artifact decoding failed")]
    ArtifactEncoding(#[from] SerializationError),

    /// Constraint generation or the Groth16 backend failed
    #[error("constraint synthesis failed")]
    Synthesis(#[from] SynthesisError),

    /// The freshly generated proof failed local re-verification; this is a
    /// programmer error, never a recoverable condition
    #[error("generated proof failed local re-verification")]
    ProofRejected,

    /// Submitted proof bytes did not parse
    #[error("malformed proof bytes")]
    MalformedProof(#[source] SerializationError),
}
