use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// EVM networks the storefront can take wallet payments on.
pub enum Network {
    #[serde(rename = "eth")]
    Ethereum,
    #[serde(rename = "sepolia")]
    Sepolia,
    #[serde(rename = "base")]
    Base,
    #[serde(rename = "base-sepolia")]
    BaseSepolia,
}

impl Network {
    /// EIP-155 chain id.
    pub const fn chain_id(self) -> u64 {
        match self {
            Network::Ethereum => 1,
            Network::Sepolia => 11_155_111,
            Network::Base => 8453,
            Network::BaseSepolia => 84_532,
        }
    }

    /// CAIP-2 chain identifier, e.g. `eip155:8453`.
    pub fn caip2(self) -> String {
        format!("eip155:{}", self.chain_id())
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Network::Ethereum => "Ethereum",
            Network::Sepolia => "Sepolia",
            Network::Base => "Base",
            Network::BaseSepolia => "Base Sepolia",
        }
    }

    pub const fn is_testnet(self) -> bool {
        matches!(self, Network::Sepolia | Network::BaseSepolia)
    }
}
