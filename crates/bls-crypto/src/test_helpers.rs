//! Helpers shared by the crate tests and the downstream snark/aggregation
//! test suites.

use crate::{PrivateKey, PublicKey, Signature};

use rand::Rng;

/// Generates `n` fresh key pairs
pub fn keygen_batch<R: Rng>(rng: &mut R, n: usize) -> (Vec<PrivateKey>, Vec<PublicKey>) {
    let secrets = (0..n).map(|_| PrivateKey::generate(rng)).collect::<Vec<_>>();
    let publics = secrets.iter().map(|sk| sk.to_public()).collect::<Vec<_>>();
    (secrets, publics)
}

/// Signs `message_hash` with each key and returns the partials along with
/// their aggregate
pub fn sign_batch(secrets: &[PrivateKey], message_hash: &[u8; 32]) -> (Vec<Signature>, Signature) {
    let partials = secrets
        .iter()
        .map(|sk| sk.sign(message_hash).expect("could not sign"))
        .collect::<Vec<_>>();
    let asig = Signature::aggregate(&partials);
    (partials, asig)
}
