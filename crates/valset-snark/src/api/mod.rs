mod export;
pub use export::VerifierExport;

mod setup;
pub(crate) use setup::{load_or_setup, CircuitArtifacts};

mod prover;
pub use prover::{ProofData, ZkProver};
