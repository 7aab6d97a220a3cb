//! EIP-712 hashing of the header commitment.

use crate::chain::Eip712Domain;

use ethers_core::{
    abi::{self, Token},
    types::{H256, U256},
    utils::keccak256,
};

const DOMAIN_TYPE: &[u8] = b"EIP712Domain(string name,string version)";
const COMMIT_TYPE: &[u8] =
    b"ValSetHeaderCommit(bytes32 Subnetwork,uint256 Epoch,bytes32 HeaderHash)";

/// `hash_struct` of the two-field domain
pub fn domain_separator(domain: &Eip712Domain) -> [u8; 32] {
    keccak256(abi::encode(&[
        Token::FixedBytes(keccak256(DOMAIN_TYPE).to_vec()),
        Token::FixedBytes(keccak256(domain.name.as_bytes()).to_vec()),
        Token::FixedBytes(keccak256(domain.version.as_bytes()).to_vec()),
    ]))
}

/// The final signing digest:
/// `keccak256(0x19 ‖ 0x01 ‖ domain_separator ‖ hash_struct(commit))`
pub fn valset_header_commit_digest(
    domain: &Eip712Domain,
    subnetwork: H256,
    epoch: U256,
    header_hash: [u8; 32],
) -> [u8; 32] {
    let struct_hash = keccak256(abi::encode(&[
        Token::FixedBytes(keccak256(COMMIT_TYPE).to_vec()),
        Token::FixedBytes(subnetwork.as_bytes().to_vec()),
        Token::Uint(epoch),
        Token::FixedBytes(header_hash.to_vec()),
    ]));

    let mut preimage = Vec::with_capacity(2 + 32 + 32);
    preimage.extend_from_slice(&[0x19, 0x01]);
    preimage.extend_from_slice(&domain_separator(domain));
    preimage.extend_from_slice(&struct_hash);
    keccak256(preimage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Eip712Domain {
        Eip712Domain {
            name: "TestDomain".into(),
            version: "1".into(),
        }
    }

    #[test]
    fn test_digest_is_pure() {
        let digest = |epoch: u64| {
            valset_header_commit_digest(&domain(), H256::repeat_byte(3), U256::from(epoch), [9; 32])
        };
        assert_eq!(digest(42), digest(42));
        assert_ne!(digest(42), digest(43));
    }

    #[test]
    fn test_digest_is_domain_separated() {
        let other = Eip712Domain {
            name: "OtherDomain".into(),
            version: "1".into(),
        };
        let subnetwork = H256::repeat_byte(3);
        assert_ne!(
            valset_header_commit_digest(&domain(), subnetwork, U256::from(42u64), [9; 32]),
            valset_header_commit_digest(&other, subnetwork, U256::from(42u64), [9; 32]),
        );
    }
}
