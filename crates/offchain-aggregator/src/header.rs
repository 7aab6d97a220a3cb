//! Builds the committed validator set header.

use crate::chain::{CancelToken, ChainAdapter};
use crate::eip712;
use crate::error::AggregationError;
use crate::valset::{self, to_validator_data, ValidatorSetHeader};
use crate::ValsetDeriver;

use ark_bls12_377::G1Projective;
use ark_ec::ProjectiveCurve;
use ark_ff::Zero;
use bls_gadgets::utils::field_to_be_bytes;
use std::sync::Arc;
use tracing::{info, warn};
use valset_snark::{hash_valset, normalize_valset};

pub struct ValsetGenerator<C> {
    deriver: ValsetDeriver<C>,
    chain: Arc<C>,
}

impl<C: ChainAdapter> ValsetGenerator<C> {
    pub fn new(deriver: ValsetDeriver<C>, chain: Arc<C>) -> Self {
        ValsetGenerator { deriver, chain }
    }

    /// Builds the header for the capture-timestamp validator set.
    ///
    /// The aggregated key list carries one entry per recognized tag — the
    /// required tag in the current design. `extra_data` is the normalized
    /// proof-form commitment of the same set, so the header anchors exactly
    /// the value the prover binds into its public input.
    pub fn validator_set_header(
        &self,
        cancel: &CancelToken,
    ) -> Result<ValidatorSetHeader, AggregationError> {
        info!("generating validator set header");
        let timestamp = self.chain.capture_timestamp(cancel)?;
        let valset = self.deriver.validator_set(cancel, Some(timestamp))?;
        let required_key_tag = self.chain.required_key_tag(cancel, timestamp)?;

        let mut aggregated = G1Projective::zero();
        for validator in valset.validators.iter().filter(|v| v.is_active) {
            for key in &validator.keys {
                if key.tag != required_key_tag {
                    continue;
                }
                match key.bls_public_key() {
                    Ok(public_key) => aggregated += public_key.g1(),
                    Err(err) => warn!(
                        "skipping undecodable key of operator {:?}: {}",
                        validator.operator, err
                    ),
                }
            }
        }

        let validators_ssz_mroot = valset::ssz::validator_set_root(&valset);

        let validator_data = to_validator_data(&valset, required_key_tag)
            .into_iter()
            .map(|(_, data)| data)
            .collect::<Vec<_>>();
        let normalized = normalize_valset(validator_data)?;
        let extra_data = field_to_be_bytes(&hash_valset(&normalized));

        Ok(ValidatorSetHeader {
            version: valset.version,
            active_aggregated_keys: vec![aggregated.into_affine()],
            total_active_voting_power: valset.total_active_voting_power,
            validators_ssz_mroot,
            extra_data,
        })
    }

    /// The EIP-712 digest a validator signs to commit to the header
    pub fn header_commit_digest(
        &self,
        cancel: &CancelToken,
        header: &ValidatorSetHeader,
    ) -> Result<[u8; 32], AggregationError> {
        let header_hash = header.hash();
        let domain = self.chain.eip712_domain(cancel)?;
        let epoch = self.chain.current_epoch(cancel)?;
        let subnetwork = self.chain.subnetwork(cancel)?;
        Ok(eip712::valset_header_commit_digest(
            &domain,
            subnetwork,
            epoch,
            header_hash,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{mock_secret_key, MockChainAdapter};
    use bls_crypto::PublicKey;

    fn generator() -> ValsetGenerator<MockChainAdapter> {
        let chain = Arc::new(MockChainAdapter::new());
        ValsetGenerator::new(ValsetDeriver::new(chain.clone()), chain)
    }

    #[test]
    fn test_aggregated_key_covers_all_active_bls_keys() {
        let header = generator()
            .validator_set_header(&CancelToken::new())
            .unwrap();

        let expected = PublicKey::aggregate(
            &(0..5).map(|i| mock_secret_key(i).to_public()).collect::<Vec<_>>(),
        );
        assert_eq!(header.active_aggregated_keys.len(), 1);
        assert_eq!(
            header.active_aggregated_keys[0],
            expected.g1().into_affine()
        );
    }

    #[test]
    fn test_extra_data_is_the_normalized_valset_commitment() {
        let generator = generator();
        let cancel = CancelToken::new();
        let header = generator.validator_set_header(&cancel).unwrap();

        let valset = generator.deriver.validator_set(&cancel, None).unwrap();
        let data = to_validator_data(&valset, 1)
            .into_iter()
            .map(|(_, data)| data)
            .collect::<Vec<_>>();
        let normalized = normalize_valset(data).unwrap();
        assert_eq!(
            header.extra_data,
            field_to_be_bytes(&hash_valset(&normalized))
        );
    }

    #[test]
    fn test_commit_digest_changes_with_the_header() {
        let generator = generator();
        let cancel = CancelToken::new();
        let mut header = generator.validator_set_header(&cancel).unwrap();

        let digest = generator.header_commit_digest(&cancel, &header).unwrap();
        assert_eq!(
            digest,
            generator.header_commit_digest(&cancel, &header).unwrap()
        );

        header.extra_data.push(0xff);
        assert_ne!(
            digest,
            generator.header_commit_digest(&cancel, &header).unwrap()
        );
    }
}
