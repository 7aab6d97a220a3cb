//! The aggregation orchestrator: from pooled partial signatures to a
//! proof.

use crate::chain::{CancelToken, ChainAdapter};
use crate::error::AggregationError;
use crate::pool::SignaturePool;
use crate::valset::to_validator_data;
use crate::ValsetDeriver;

use ark_bls12_377::{G1Projective, G2Projective};
use ark_ec::ProjectiveCurve;
use ark_ff::Zero;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use bls_crypto::{hash_to_g1, PublicKey, Signature};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use valset_snark::{ProofData, ProveInput, SnarkError, ZkProver};

/// The proving seam, so the orchestrator tests without a trusted setup
pub trait Prover: Send + Sync {
    fn prove(&self, input: &ProveInput) -> Result<ProofData, SnarkError>;
}

impl Prover for ZkProver {
    fn prove(&self, input: &ProveInput) -> Result<ProofData, SnarkError> {
        ZkProver::prove(self, input)
    }
}

pub struct Aggregation<C, P> {
    chain: Arc<C>,
    pool: Arc<SignaturePool>,
    deriver: ValsetDeriver<C>,
    prover: Arc<P>,
}

impl<C: ChainAdapter, P: Prover> Aggregation<C, P> {
    pub fn new(
        chain: Arc<C>,
        pool: Arc<SignaturePool>,
        deriver: ValsetDeriver<C>,
        prover: Arc<P>,
    ) -> Self {
        Aggregation {
            chain,
            pool,
            deriver,
            prover,
        }
    }

    /// Aggregates the pooled partial signatures for `message_hash` over the
    /// current validator set and proves the result. Returns the aggregate
    /// signature bytes and the marshalled proof.
    ///
    /// Contributions from unknown keys, undecodable points, or a validator
    /// that already contributed are dropped and logged, never fatal.
    pub fn aggregate_signatures(
        &self,
        cancel: &CancelToken,
        message_hash: &[u8; 32],
    ) -> Result<(Vec<u8>, Vec<u8>), AggregationError> {
        let valset_timestamp = self.chain.current_valset_timestamp(cancel)?;
        let valset = self.deriver.validator_set(cancel, Some(valset_timestamp))?;
        let required_key_tag = self.chain.required_key_tag(cancel, valset_timestamp)?;

        // payload -> validator index, active required-tag keys only
        let mut by_payload: HashMap<&[u8], usize> = HashMap::new();
        for (index, validator) in valset.validators.iter().enumerate() {
            if !validator.is_active {
                continue;
            }
            for key in &validator.keys {
                if key.tag != required_key_tag {
                    continue;
                }
                by_payload.insert(&key.payload, index);
            }
        }

        let (pubkeys, partial_signatures) = self.pool.signatures(&message_hash[..]);
        let mut signers: HashSet<usize> = HashSet::new();
        let mut aggregate_signature = G1Projective::zero();
        let mut signers_agg_key_g2 = G2Projective::zero();

        for (pubkey, partial_signature) in pubkeys.iter().zip(&partial_signatures) {
            let index = match by_payload.get(&pubkey[..]) {
                Some(index) => *index,
                None => {
                    debug!("dropping contribution from an unknown key");
                    continue;
                }
            };
            let signature = match Signature::deserialize(&partial_signature[..]) {
                Ok(signature) => signature,
                Err(err) => {
                    warn!("dropping undecodable partial signature: {}", err);
                    continue;
                }
            };
            let public_key = match PublicKey::deserialize(&pubkey[..]) {
                Ok(public_key) => public_key,
                Err(err) => {
                    warn!("dropping contribution with undecodable pubkey: {}", err);
                    continue;
                }
            };
            if !signers.insert(index) {
                debug!("dropping duplicate contribution of validator {}", index);
                continue;
            }
            aggregate_signature += signature.as_ref();
            signers_agg_key_g2 += public_key.g2();
        }
        info!(
            "aggregated {} of {} pooled contributions",
            signers.len(),
            pubkeys.len()
        );
        // TODO: reject aggregations below the quorum threshold from the
        // valset config instead of leaving the check to the submitter

        let mut validator_data = Vec::new();
        for (index, mut data) in to_validator_data(&valset, required_key_tag) {
            data.is_non_signer = !signers.contains(&index);
            validator_data.push(data);
        }

        // a cancelled computation must not emit a proof
        cancel.check().map_err(AggregationError::from)?;

        let message_g1 = hash_to_g1(message_hash)?;
        let prove_input = ProveInput {
            validator_data,
            message_g1: message_g1.into_affine(),
            signature: aggregate_signature.into_affine(),
            signers_agg_key_g2: signers_agg_key_g2.into_affine(),
        };
        let proof_data = self.prover.prove(&prove_input)?;

        let mut signature_bytes = vec![];
        Signature::from(aggregate_signature).serialize(&mut signature_bytes)?;
        Ok((signature_bytes, proof_data.marshal()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{mock_secret_key, MockChainAdapter};
    use crate::valset::Key;
    use ark_serialize::CanonicalSerialize;
    use std::sync::Mutex;
    use valset_snark::ConstraintField;

    /// Records the prove input instead of running Groth16
    struct RecordingProver {
        last_input: Mutex<Option<ProveInput>>,
    }

    impl RecordingProver {
        fn new() -> Self {
            RecordingProver {
                last_input: Mutex::new(None),
            }
        }

        fn last_input(&self) -> ProveInput {
            self.last_input
                .lock()
                .unwrap()
                .clone()
                .expect("prove was never called")
        }
    }

    impl Prover for RecordingProver {
        fn prove(&self, input: &ProveInput) -> Result<ProofData, SnarkError> {
            *self.last_input.lock().unwrap() = Some(input.clone());
            Ok(ProofData {
                proof: vec![0u8; 8],
                signers_agg_voting_power: ConstraintField::zero(),
            })
        }
    }

    fn setup() -> (
        Aggregation<MockChainAdapter, RecordingProver>,
        Arc<SignaturePool>,
        Arc<RecordingProver>,
    ) {
        let chain = Arc::new(MockChainAdapter::new());
        let pool = Arc::new(SignaturePool::new());
        let prover = Arc::new(RecordingProver::new());
        let deriver = ValsetDeriver::new(chain.clone());
        let aggregation = Aggregation::new(chain, pool.clone(), deriver, prover.clone());
        (aggregation, pool, prover)
    }

    fn pool_partial(pool: &SignaturePool, message_hash: &[u8; 32], index: usize) {
        let secret = mock_secret_key(index);
        let key = Key::from_public_key(crate::mock::MOCK_BLS_KEY_TAG, &secret.to_public());
        let mut signature_bytes = vec![];
        secret
            .sign(message_hash)
            .unwrap()
            .serialize(&mut signature_bytes)
            .unwrap();
        pool.add_signature(&message_hash[..], key.payload, signature_bytes);
    }

    #[test]
    fn test_signers_are_flagged_and_signature_aggregates() {
        let (aggregation, pool, prover) = setup();
        let message_hash = [0x21u8; 32];
        pool_partial(&pool, &message_hash, 0);
        pool_partial(&pool, &message_hash, 2);

        let (signature_bytes, proof_bytes) = aggregation
            .aggregate_signatures(&CancelToken::new(), &message_hash)
            .unwrap();
        assert!(!proof_bytes.is_empty());

        let input = prover.last_input();
        // all five active validators are present, two of them signers
        assert_eq!(input.validator_data.len(), 5);
        let non_signers = input
            .validator_data
            .iter()
            .filter(|v| v.is_non_signer)
            .count();
        assert_eq!(non_signers, 3);

        // the aggregate signature verifies under the signers' keys
        let aggregate_key = PublicKey::aggregate(&[
            mock_secret_key(0).to_public(),
            mock_secret_key(2).to_public(),
        ]);
        let signature = Signature::deserialize(&signature_bytes[..]).unwrap();
        aggregate_key.verify(&message_hash, &signature).unwrap();
    }

    #[test]
    fn test_unknown_and_duplicate_contributions_are_dropped() {
        let (aggregation, pool, prover) = setup();
        let message_hash = [0x22u8; 32];
        pool_partial(&pool, &message_hash, 1);

        // a contribution from a key outside the validator set
        let outsider = bls_crypto::PrivateKey::from(ark_bls12_377::Fr::from(999u64));
        let outsider_key =
            Key::from_public_key(crate::mock::MOCK_BLS_KEY_TAG, &outsider.to_public());
        let mut outsider_sig = vec![];
        outsider
            .sign(&message_hash)
            .unwrap()
            .serialize(&mut outsider_sig)
            .unwrap();
        pool.add_signature(&message_hash[..], outsider_key.payload, outsider_sig);

        // a second, different signature from validator 1
        let secret = mock_secret_key(1);
        let key = Key::from_public_key(crate::mock::MOCK_BLS_KEY_TAG, &secret.to_public());
        pool.add_signature(&message_hash[..], key.payload, vec![0xde, 0xad]);

        aggregation
            .aggregate_signatures(&CancelToken::new(), &message_hash)
            .unwrap();

        let input = prover.last_input();
        let signer_count = input
            .validator_data
            .iter()
            .filter(|v| !v.is_non_signer)
            .count();
        assert_eq!(signer_count, 1);

        // only validator 1 contributed to the aggregate
        let aggregate_key = PublicKey::aggregate(&[mock_secret_key(1).to_public()]);
        let signature = Signature::from({
            use ark_ec::AffineCurve;
            input.signature.into_projective()
        });
        aggregate_key.verify(&message_hash, &signature).unwrap();
    }

    #[test]
    fn test_no_contributions_build_an_all_non_signer_input() {
        let (aggregation, _pool, prover) = setup();
        let message_hash = [0x23u8; 32];

        aggregation
            .aggregate_signatures(&CancelToken::new(), &message_hash)
            .unwrap();

        let input = prover.last_input();
        assert!(input.validator_data.iter().all(|v| v.is_non_signer));
        assert!(input.signature.is_zero());
    }

    #[test]
    fn test_cancellation_suppresses_the_proof() {
        let (aggregation, _pool, _prover) = setup();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(aggregation
            .aggregate_signatures(&cancel, &[0u8; 32])
            .is_err());
    }

    // The full pipeline against the mock chain: trusted setup, aggregation,
    // proof and verification. Takes minutes, run with `cargo test -- --ignored`.
    #[test]
    #[ignore]
    fn test_aggregate_and_prove_end_to_end() {
        use valset_snark::{hash_valset, normalize_valset, public_input_hash, ZkProver};

        let _ = tracing_subscriber::fmt().try_init();
        let dir = tempfile::tempdir().unwrap();
        let prover = Arc::new(ZkProver::new(dir.path()).unwrap());
        let chain = Arc::new(MockChainAdapter::new());
        let pool = Arc::new(SignaturePool::new());
        let deriver = ValsetDeriver::new(chain.clone());
        let aggregation = Aggregation::new(chain.clone(), pool.clone(), deriver, prover.clone());

        let message_hash = [0x42u8; 32];
        for index in [0usize, 1, 3].iter() {
            pool_partial(&pool, &message_hash, *index);
        }

        let (_, proof_bytes) = aggregation
            .aggregate_signatures(&CancelToken::new(), &message_hash)
            .unwrap();

        // recompute the public input the way an external verifier would
        let cancel = CancelToken::new();
        let valset = ValsetDeriver::new(chain.clone())
            .validator_set(&cancel, Some(chain.current_valset_timestamp))
            .unwrap();
        let signed = [0usize, 1, 3];
        let mut validator_data = to_validator_data(&valset, chain.required_key_tag)
            .into_iter()
            .map(|(index, mut data)| {
                data.is_non_signer = !signed.contains(&index);
                data
            })
            .collect::<Vec<_>>();
        validator_data = normalize_valset(validator_data).unwrap();

        let signers_vp = validator_data
            .iter()
            .filter(|v| !v.is_non_signer)
            .fold(ConstraintField::zero(), |acc, v| acc + v.voting_power);
        let message_g1 = hash_to_g1(&message_hash).unwrap().into_affine();
        let input_hash = public_input_hash(&hash_valset(&validator_data), &signers_vp, &message_g1);

        assert!(prover
            .verify(valset.validators.len(), input_hash, &proof_bytes)
            .unwrap());
    }
}
