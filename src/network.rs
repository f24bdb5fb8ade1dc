//! The closed network table the core recognizes, mapping x402 network names
//! to EVM chain IDs.
//!
//! Implementations MAY extend this table; the set here is the one the
//! protocol enumerates. Unknown wire names are surfaced as
//! [`crate::errors::X402Error::UnsupportedNetwork`] rather than panicking, so
//! a deployment can still add its own network by matching on the raw string
//! before falling back to this table.

use crate::errors::{Result, X402Error};
use std::fmt;
use std::str::FromStr;

/// A network from the x402 protocol's network table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    EthereumMainnet,
    Sepolia,
    Base,
    BaseSepolia,
    Polygon,
    Arbitrum,
    Optimism,
}

impl Network {
    /// The EIP-712 `chainId` for this network.
    pub fn chain_id(self) -> u64 {
        match self {
            Network::EthereumMainnet => 1,
            Network::Sepolia => 11155111,
            Network::Base => 8453,
            Network::BaseSepolia => 84532,
            Network::Polygon => 137,
            Network::Arbitrum => 42161,
            Network::Optimism => 10,
        }
    }

    /// The canonical wire name, as used in `PaymentMethod.network`.
    pub fn as_str(self) -> &'static str {
        match self {
            Network::EthereumMainnet => "ethereum",
            Network::Sepolia => "sepolia",
            Network::Base => "base",
            Network::BaseSepolia => "base-sepolia",
            Network::Polygon => "polygon",
            Network::Arbitrum => "arbitrum",
            Network::Optimism => "optimism",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = X402Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ethereum" => Ok(Network::EthereumMainnet),
            "sepolia" => Ok(Network::Sepolia),
            "base" => Ok(Network::Base),
            "base-sepolia" => Ok(Network::BaseSepolia),
            "polygon" => Ok(Network::Polygon),
            "arbitrum" => Ok(Network::Arbitrum),
            "optimism" => Ok(Network::Optimism),
            other => Err(X402Error::UnsupportedNetwork(other.to_string())),
        }
    }
}
