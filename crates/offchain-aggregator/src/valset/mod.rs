//! The canonical validator set and its committed header.

pub mod ssz;

use ark_ec::ProjectiveCurve;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use bls_crypto::PublicKey;
use ethers_core::{
    abi::{self, Token},
    types::{Address, U256},
    utils::keccak256,
};
use tracing::warn;
use valset_snark::{BLSCurveG1Affine, ConstraintField, ValidatorData};

pub const VALSET_VERSION: u8 = 1;

/// A typed key published by an operator. The payload of a BLS key is the
/// serialized [`PublicKey`], `g1 ‖ g2` in compressed affine form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Key {
    pub tag: u8,
    pub payload: Vec<u8>,
}

impl Key {
    pub fn from_public_key(tag: u8, public_key: &PublicKey) -> Key {
        let mut payload = vec![];
        public_key
            .serialize(&mut payload)
            .expect("writing to a vec cannot fail");
        Key { tag, payload }
    }

    /// Decodes the payload, rejecting off-curve points
    pub fn bls_public_key(&self) -> Result<PublicKey, SerializationError> {
        PublicKey::deserialize(&self.payload[..])
    }
}

#[derive(Clone, Debug)]
pub struct Vault {
    pub vault: Address,
    pub voting_power: U256,
}

#[derive(Clone, Debug)]
pub struct Validator {
    pub operator: Address,
    pub voting_power: U256,
    pub is_active: bool,
    pub keys: Vec<Key>,
    pub vaults: Vec<Vault>,
}

#[derive(Clone, Debug)]
pub struct ValidatorSet {
    pub version: u8,
    pub total_active_voting_power: U256,
    pub validators: Vec<Validator>,
}

/// The header committed on chain for a validator set
#[derive(Clone, Debug)]
pub struct ValidatorSetHeader {
    pub version: u8,
    pub active_aggregated_keys: Vec<BLSCurveG1Affine>,
    pub total_active_voting_power: U256,
    pub validators_ssz_mroot: [u8; 32],
    pub extra_data: Vec<u8>,
}

impl ValidatorSetHeader {
    /// The committed header hash: the Keccak digest of the ABI encoding of
    /// `(active_aggregated_keys, total_active_voting_power,
    /// validators_ssz_mroot, extra_data)`. `version` is deliberately not
    /// part of the encoding, matching the on-chain layout.
    pub fn hash(&self) -> [u8; 32] {
        let keys = self
            .active_aggregated_keys
            .iter()
            .map(|key| {
                let mut bytes = vec![];
                key.serialize_uncompressed(&mut bytes)
                    .expect("writing to a vec cannot fail");
                Token::Bytes(bytes)
            })
            .collect::<Vec<_>>();
        let encoded = abi::encode(&[
            Token::Array(keys),
            Token::Uint(self.total_active_voting_power),
            Token::FixedBytes(self.validators_ssz_mroot.to_vec()),
            Token::Bytes(self.extra_data.clone()),
        ]);
        keccak256(encoded)
    }
}

/// Reduces a U256 voting power into the constraint field
pub fn voting_power_to_field(voting_power: U256) -> ConstraintField {
    use ark_ff::PrimeField;
    let mut bytes = [0u8; 32];
    voting_power.to_big_endian(&mut bytes);
    ConstraintField::from_be_bytes_mod_order(&bytes)
}

/// The proof-form records of the active validators holding a key with the
/// required tag, paired with their index into `valset.validators` so
/// callers can mark signers. Undecodable payloads are dropped with a
/// warning.
pub fn to_validator_data(
    valset: &ValidatorSet,
    required_key_tag: u8,
) -> Vec<(usize, ValidatorData)> {
    let mut data = Vec::new();
    for (index, validator) in valset.validators.iter().enumerate() {
        if !validator.is_active {
            continue;
        }
        for key in &validator.keys {
            if key.tag != required_key_tag {
                continue;
            }
            match key.bls_public_key() {
                Ok(public_key) => {
                    data.push((
                        index,
                        ValidatorData {
                            key: public_key.g1().into_affine(),
                            key_g2: public_key.g2().into_affine(),
                            voting_power: voting_power_to_field(validator.voting_power),
                            is_non_signer: false,
                        },
                    ));
                }
                Err(err) => {
                    warn!(
                        "dropping undecodable key of operator {:?}: {}",
                        validator.operator, err
                    );
                }
            }
            break;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::Zero;

    fn sample_header() -> ValidatorSetHeader {
        ValidatorSetHeader {
            version: VALSET_VERSION,
            active_aggregated_keys: vec![BLSCurveG1Affine::zero()],
            total_active_voting_power: U256::from(1000u64),
            validators_ssz_mroot: [0x11; 32],
            extra_data: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_header_hash_is_pure() {
        assert_eq!(sample_header().hash(), sample_header().hash());
    }

    #[test]
    fn test_header_hash_ignores_version() {
        // known asymmetry: the version field is not serialized
        let mut header = sample_header();
        header.version = 77;
        assert_eq!(header.hash(), sample_header().hash());
    }

    #[test]
    fn test_header_hash_depends_on_each_field() {
        let base = sample_header().hash();

        let mut header = sample_header();
        header.total_active_voting_power = U256::from(1001u64);
        assert_ne!(header.hash(), base);

        let mut header = sample_header();
        header.validators_ssz_mroot = [0x12; 32];
        assert_ne!(header.hash(), base);

        let mut header = sample_header();
        header.extra_data.push(4);
        assert_ne!(header.hash(), base);
    }
}
