//! SSZ merkleization of the canonical validator set.
//!
//! Follows the consensus merkleization rules: basic values pack into
//! 32-byte chunks (integers little-endian), lists merkleize over their
//! capacity limit and mix in their length, containers merkleize their field
//! roots. The schema mirrors the on-chain one: the validator set container
//! exposes only its validator list; `version` and the total voting power
//! are not part of the encoding.

use super::{Key, Validator, ValidatorSet, Vault};

use ethers_core::types::U256;
use sha2::{Digest, Sha256};

/// List limits of the schema
const MAX_KEYS: usize = 128;
const MAX_VAULTS: usize = 10;
const MAX_VALIDATORS: usize = 10_000;
const MAX_KEY_PAYLOAD: usize = 192;

type Root = [u8; 32];

/// `hash_tree_root` of the validator set
pub fn validator_set_root(valset: &ValidatorSet) -> Root {
    let roots = valset.validators.iter().map(validator_root).collect::<Vec<_>>();
    mix_in_length(merkleize(&roots, MAX_VALIDATORS), valset.validators.len())
}

fn validator_root(validator: &Validator) -> Root {
    let key_roots = validator.keys.iter().map(key_root).collect::<Vec<_>>();
    let vault_roots = validator.vaults.iter().map(vault_root).collect::<Vec<_>>();
    merkleize(
        &[
            bytes_chunk(validator.operator.as_bytes()),
            uint256_chunk(validator.voting_power),
            bool_chunk(validator.is_active),
            mix_in_length(merkleize(&key_roots, MAX_KEYS), validator.keys.len()),
            mix_in_length(merkleize(&vault_roots, MAX_VAULTS), validator.vaults.len()),
        ],
        5,
    )
}

fn key_root(key: &Key) -> Root {
    merkleize(
        &[
            bytes_chunk(&[key.tag]),
            byte_list_root(&key.payload, MAX_KEY_PAYLOAD),
        ],
        2,
    )
}

fn vault_root(vault: &Vault) -> Root {
    merkleize(
        &[
            bytes_chunk(vault.vault.as_bytes()),
            uint256_chunk(vault.voting_power),
        ],
        2,
    )
}

fn byte_list_root(bytes: &[u8], max_len: usize) -> Root {
    let chunks = bytes.chunks(32).map(bytes_chunk).collect::<Vec<_>>();
    let limit = (max_len + 31) / 32;
    mix_in_length(merkleize(&chunks, limit), bytes.len())
}

fn bytes_chunk(bytes: &[u8]) -> Root {
    let mut chunk = [0u8; 32];
    chunk[..bytes.len()].copy_from_slice(bytes);
    chunk
}

fn bool_chunk(value: bool) -> Root {
    bytes_chunk(&[value as u8])
}

fn uint256_chunk(value: U256) -> Root {
    let mut chunk = [0u8; 32];
    value.to_little_endian(&mut chunk);
    chunk
}

/// Merkleizes the chunks over a virtual tree wide enough for `limit` leaves
fn merkleize(chunks: &[Root], limit: usize) -> Root {
    let leaves = limit.max(chunks.len()).max(1).next_power_of_two();
    let depth = leaves.trailing_zeros();

    let mut layer = chunks.to_vec();
    let mut zero: Root = [0u8; 32];
    for _ in 0..depth {
        if layer.len() % 2 == 1 {
            layer.push(zero);
        }
        layer = layer
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
        zero = hash_pair(&zero, &zero);
    }
    layer.first().copied().unwrap_or(zero)
}

fn mix_in_length(root: Root, length: usize) -> Root {
    let mut length_chunk = [0u8; 32];
    length_chunk[..8].copy_from_slice(&(length as u64).to_le_bytes());
    hash_pair(&root, &length_chunk)
}

fn hash_pair(left: &Root, right: &Root) -> Root {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}
