//! Derives the canonical validator set from on-chain configuration.

use crate::chain::{CancelToken, ChainAdapter, Timestamp};
use crate::error::AggregationError;
use crate::valset::{Validator, ValidatorSet, VALSET_VERSION};

use ethers_core::types::{Address, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Consolidates voting powers and published keys into the canonical,
/// filtered validator set
pub struct ValsetDeriver<C> {
    chain: Arc<C>,
}

impl<C: ChainAdapter> ValsetDeriver<C> {
    pub fn new(chain: Arc<C>) -> Self {
        ValsetDeriver { chain }
    }

    /// The canonical validator set at `timestamp`, defaulting to the
    /// chain's capture timestamp.
    ///
    /// Voting powers from every provider merge into one operator-keyed
    /// mapping (duplicate operators sum), published keys attach to known
    /// operators, and the set is ordered by voting power descending with
    /// the operator address as the tie break. Filters from the valset
    /// config apply in order along the sorted walk: minimum inclusion
    /// power, key possession, the active-count cap, and the voting power
    /// clip. An empty result is valid.
    pub fn validator_set(
        &self,
        cancel: &CancelToken,
        timestamp: Option<Timestamp>,
    ) -> Result<ValidatorSet, AggregationError> {
        let timestamp = match timestamp {
            Some(timestamp) => timestamp,
            None => self.chain.capture_timestamp(cancel)?,
        };
        let master_config = self.chain.master_config(cancel, timestamp)?;
        let valset_config = self.chain.valset_config(cancel, timestamp)?;

        let mut by_operator: HashMap<Address, Validator> = HashMap::new();
        for provider in &master_config.voting_power_providers {
            let voting_powers = self.chain.voting_powers(cancel, provider.address, timestamp)?;
            for operator_power in voting_powers {
                let validator =
                    by_operator
                        .entry(operator_power.operator)
                        .or_insert_with(|| Validator {
                            operator: operator_power.operator,
                            voting_power: U256::zero(),
                            is_active: true,
                            keys: vec![],
                            vaults: vec![],
                        });
                for vault in operator_power.vaults {
                    validator.voting_power = validator.voting_power + vault.voting_power;
                    validator.vaults.push(crate::valset::Vault {
                        vault: vault.vault,
                        voting_power: vault.voting_power,
                    });
                }
            }
        }

        // keys of operators without voting power are ignored
        let required_keys =
            self.chain
                .required_keys(cancel, master_config.keys_provider.address, timestamp)?;
        for operator_keys in required_keys {
            if let Some(validator) = by_operator.get_mut(&operator_keys.operator) {
                validator.keys.extend(operator_keys.keys);
            }
        }

        let mut validators = by_operator.into_iter().map(|(_, v)| v).collect::<Vec<_>>();
        validators.sort_by(|a, b| {
            b.voting_power
                .cmp(&a.voting_power)
                .then_with(|| a.operator.cmp(&b.operator))
        });

        let mut total_active_voting_power = U256::zero();
        let mut active_count = 0u64;
        for validator in validators.iter_mut() {
            if !valset_config.min_inclusion_voting_power.is_zero()
                && validator.voting_power < valset_config.min_inclusion_voting_power
            {
                validator.is_active = false;
            }
            if validator.keys.is_empty() {
                validator.is_active = false;
            }
            if valset_config.max_validators_count != 0
                && validator.is_active
                && active_count >= valset_config.max_validators_count
            {
                validator.is_active = false;
            }
            if !valset_config.max_voting_power.is_zero()
                && validator.voting_power > valset_config.max_voting_power
            {
                validator.voting_power = valset_config.max_voting_power;
            }
            if validator.is_active {
                active_count += 1;
                total_active_voting_power = total_active_voting_power + validator.voting_power;
            }
        }
        debug!(
            "derived validator set: {} validators, {} active",
            validators.len(),
            active_count
        );

        Ok(ValidatorSet {
            version: VALSET_VERSION,
            total_active_voting_power,
            validators,
        })
    }
}
