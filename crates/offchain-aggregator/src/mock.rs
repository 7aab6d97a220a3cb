//! A deterministic chain adapter for tests.
//!
//! Every answer is a public field, so tests tweak exactly the fixture they
//! care about. The generated operators carry real BLS key material derived
//! from small scalars, which lets aggregation tests run the full signing
//! path against the mock.

use crate::chain::{
    AdapterError, CancelToken, ChainAdapter, CrossChainAddress, Eip712Domain, MasterConfig,
    OperatorVotingPower, OperatorWithKeys, Phase, Timestamp, ValsetConfig, VaultVotingPower,
};
use crate::valset::Key;

use ark_bls12_377::Fr;
use bls_crypto::PrivateKey;
use ethers_core::types::{Address, H256, U256};

/// The BLS key tag the mock publishes
pub const MOCK_BLS_KEY_TAG: u8 = 1;

/// The secret key of the `index`-th mock operator
pub fn mock_secret_key(index: usize) -> PrivateKey {
    PrivateKey::from(Fr::from((index + 10) as u64))
}

/// The address of the `index`-th mock operator
pub fn mock_operator_address(index: usize) -> Address {
    Address::from_low_u64_be((index + 100) as u64)
}

pub struct MockChainAdapter {
    pub master_config: MasterConfig,
    pub valset_config: ValsetConfig,
    pub current_phase: Phase,
    pub current_valset_timestamp: Timestamp,
    pub capture_timestamp: Timestamp,
    pub voting_powers: Vec<OperatorVotingPower>,
    pub required_keys: Vec<OperatorWithKeys>,
    pub required_key_tag: u8,
    pub quorum_threshold: U256,
    pub current_epoch: U256,
    pub subnetwork: H256,
    pub eip712_domain: Eip712Domain,
    /// When set, every call answers with this error
    pub fail_with: Option<AdapterError>,
}

impl MockChainAdapter {
    pub fn new() -> Self {
        Self::with_validators(5)
    }

    pub fn with_validators(count: usize) -> Self {
        MockChainAdapter {
            master_config: MasterConfig {
                voting_power_providers: vec![CrossChainAddress {
                    address: Address::from_low_u64_be(0x1111),
                    chain_id: 1,
                }],
                keys_provider: CrossChainAddress {
                    address: Address::from_low_u64_be(0x2222),
                    chain_id: 1,
                },
                replicas: vec![CrossChainAddress {
                    address: Address::from_low_u64_be(0x3333),
                    chain_id: 1,
                }],
            },
            valset_config: ValsetConfig::default(),
            current_phase: Phase::Commit,
            current_valset_timestamp: 1000,
            capture_timestamp: 900,
            voting_powers: mock_voting_powers(count),
            required_keys: mock_required_keys(count),
            required_key_tag: MOCK_BLS_KEY_TAG,
            quorum_threshold: U256::from(667u64),
            current_epoch: U256::from(42u64),
            subnetwork: H256::repeat_byte(0x04),
            eip712_domain: Eip712Domain {
                name: "TestDomain".into(),
                version: "1".into(),
            },
            fail_with: None,
        }
    }

    fn answer<T>(&self, cancel: &CancelToken, value: T) -> Result<T, AdapterError> {
        cancel.check()?;
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(value),
        }
    }
}

impl Default for MockChainAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn mock_voting_powers(count: usize) -> Vec<OperatorVotingPower> {
    (0..count)
        .map(|i| OperatorVotingPower {
            operator: mock_operator_address(i),
            vaults: (0..2)
                .map(|j| VaultVotingPower {
                    vault: Address::from_low_u64_be((i * 10 + j) as u64),
                    voting_power: U256::from((100 + i * 10 + j * 5) as u64),
                })
                .collect(),
        })
        .collect()
}

fn mock_required_keys(count: usize) -> Vec<OperatorWithKeys> {
    (0..count)
        .map(|i| {
            let bls_key =
                Key::from_public_key(MOCK_BLS_KEY_TAG, &mock_secret_key(i).to_public());
            // a second, foreign-tagged key that every consumer must ignore
            let foreign_key = Key {
                tag: 2,
                payload: (0..33).map(|j| (i + j + 100) as u8).collect(),
            };
            OperatorWithKeys {
                operator: mock_operator_address(i),
                keys: vec![bls_key, foreign_key],
            }
        })
        .collect()
}

impl ChainAdapter for MockChainAdapter {
    fn master_config(
        &self,
        cancel: &CancelToken,
        _timestamp: Timestamp,
    ) -> Result<MasterConfig, AdapterError> {
        self.answer(cancel, self.master_config.clone())
    }

    fn valset_config(
        &self,
        cancel: &CancelToken,
        _timestamp: Timestamp,
    ) -> Result<ValsetConfig, AdapterError> {
        self.answer(cancel, self.valset_config.clone())
    }

    fn current_valset_timestamp(&self, cancel: &CancelToken) -> Result<Timestamp, AdapterError> {
        self.answer(cancel, self.current_valset_timestamp)
    }

    fn capture_timestamp(&self, cancel: &CancelToken) -> Result<Timestamp, AdapterError> {
        self.answer(cancel, self.capture_timestamp)
    }

    fn current_epoch(&self, cancel: &CancelToken) -> Result<U256, AdapterError> {
        self.answer(cancel, self.current_epoch)
    }

    fn current_phase(&self, cancel: &CancelToken) -> Result<Phase, AdapterError> {
        self.answer(cancel, self.current_phase)
    }

    fn voting_powers(
        &self,
        cancel: &CancelToken,
        _provider: Address,
        _timestamp: Timestamp,
    ) -> Result<Vec<OperatorVotingPower>, AdapterError> {
        self.answer(cancel, self.voting_powers.clone())
    }

    fn required_keys(
        &self,
        cancel: &CancelToken,
        _provider: Address,
        _timestamp: Timestamp,
    ) -> Result<Vec<OperatorWithKeys>, AdapterError> {
        self.answer(cancel, self.required_keys.clone())
    }

    fn required_key_tag(
        &self,
        cancel: &CancelToken,
        _timestamp: Timestamp,
    ) -> Result<u8, AdapterError> {
        self.answer(cancel, self.required_key_tag)
    }

    fn quorum_threshold(
        &self,
        cancel: &CancelToken,
        _timestamp: Timestamp,
        _key_tag: u8,
    ) -> Result<U256, AdapterError> {
        self.answer(cancel, self.quorum_threshold)
    }

    fn subnetwork(&self, cancel: &CancelToken) -> Result<H256, AdapterError> {
        self.answer(cancel, self.subnetwork)
    }

    fn eip712_domain(&self, cancel: &CancelToken) -> Result<Eip712Domain, AdapterError> {
        self.answer(cancel, self.eip712_domain.clone())
    }
}
