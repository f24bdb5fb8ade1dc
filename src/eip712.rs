//! EIP-712 typed-data hashing for the ERC-3009 `TransferWithAuthorization`
//! struct, shared by [`crate::signer`] (which produces the hash to sign) and
//! [`crate::validator::chain`] (which reproduces it to recover the signer).

use ethers::abi::Token;
use ethers::core::utils::keccak256;
use ethers::types::{Address, H256, U256};

/// `keccak256("EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)")`
/// applied to a token's domain, per EIP-712 §domainSeparator.
pub fn domain_separator(token_address: Address, chain_id: U256, name: &str, version: &str) -> H256 {
    let type_hash = keccak256(
        b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
    );

    H256::from(keccak256(ethers::abi::encode(&[
        Token::FixedBytes(type_hash.to_vec()),
        Token::FixedBytes(keccak256(name.as_bytes()).to_vec()),
        Token::FixedBytes(keccak256(version.as_bytes()).to_vec()),
        Token::Uint(chain_id),
        Token::Address(token_address),
    ])))
}

/// The final EIP-712 digest for a `TransferWithAuthorization` struct:
/// `"\x19\x01" ‖ domainSeparator ‖ hashStruct(message)`.
#[allow(clippy::too_many_arguments)]
pub fn transfer_authorization_hash(
    from: Address,
    to: Address,
    value: U256,
    valid_after: U256,
    valid_before: U256,
    nonce: H256,
    domain_separator: H256,
) -> H256 {
    let type_hash = keccak256(
        b"TransferWithAuthorization(address from,address to,uint256 value,uint256 validAfter,uint256 validBefore,bytes32 nonce)",
    );

    let struct_hash = keccak256(ethers::abi::encode(&[
        Token::FixedBytes(type_hash.to_vec()),
        Token::Address(from),
        Token::Address(to),
        Token::Uint(value),
        Token::Uint(valid_after),
        Token::Uint(valid_before),
        Token::FixedBytes(nonce.as_bytes().to_vec()),
    ]));

    let mut message = Vec::with_capacity(2 + 32 + 32);
    message.extend_from_slice(b"\x19\x01");
    message.extend_from_slice(domain_separator.as_bytes());
    message.extend_from_slice(&struct_hash);

    H256::from(keccak256(&message))
}
