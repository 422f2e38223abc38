//! Payment assets a buyer can settle a crypto checkout with.

use super::networks::Network;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Asset reference used for a chain's native coin.
pub const NATIVE_ASSET: &str = "native";

/// Display metadata of a payment asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub name: CompactString,
    pub symbol: CompactString,
    pub decimals: u8,
}

/// A target asset for a wallet payment.
///
/// `network` is a CAIP-2 chain id and `asset` is either a token contract
/// address or [`NATIVE_ASSET`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentAsset {
    pub network: CompactString,
    pub asset: CompactString,
    pub metadata: AssetMetadata,
}

impl PaymentAsset {
    pub fn is_native(&self) -> bool {
        self.asset.eq_ignore_ascii_case(NATIVE_ASSET)
    }

    /// CAIP-19 asset id: `eip155:8453/erc20:0x…` or `eip155:8453/slip44:60`.
    pub fn caip19(&self) -> String {
        if self.is_native() {
            format!("{}/slip44:60", self.network)
        } else {
            format!("{}/erc20:{}", self.network, self.asset)
        }
    }

    /// Upper-cased ticker symbol.
    pub fn symbol(&self) -> String {
        self.metadata.symbol.to_uppercase().into()
    }

    pub fn base_usdc() -> Self {
        Self {
            network: Network::Base.caip2().into(),
            asset: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".into(),
            metadata: AssetMetadata {
                name: "USD Coin".into(),
                symbol: "USDC".into(),
                decimals: 6,
            },
        }
    }

    pub fn base_eth() -> Self {
        Self {
            network: Network::Base.caip2().into(),
            asset: NATIVE_ASSET.into(),
            metadata: AssetMetadata {
                name: "Ethereum".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
        }
    }

    pub fn base_sepolia_eth() -> Self {
        Self {
            network: Network::BaseSepolia.caip2().into(),
            asset: NATIVE_ASSET.into(),
            metadata: AssetMetadata {
                name: "Ethereum".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
        }
    }

    /// Resolve a preset by its option id. Unknown ids fall back to `baseUSDC`.
    pub fn from_option_id(id: &str) -> Self {
        match id {
            "baseETH" => Self::base_eth(),
            "baseSepoliaETH" => Self::base_sepolia_eth(),
            _ => Self::base_usdc(),
        }
    }
}

/// A selectable payment asset as presented to the buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAssetOption {
    pub id: CompactString,
    pub name: CompactString,
    pub symbol: CompactString,
    pub network: Network,
    pub testnet: bool,
}

impl PaymentAssetOption {
    /// All preset options, testnets included.
    pub fn all() -> Vec<PaymentAssetOption> {
        vec![
            PaymentAssetOption {
                id: "baseUSDC".into(),
                name: "USDC".into(),
                symbol: "USDC".into(),
                network: Network::Base,
                testnet: false,
            },
            PaymentAssetOption {
                id: "baseETH".into(),
                name: "Ethereum".into(),
                symbol: "ETH".into(),
                network: Network::Base,
                testnet: false,
            },
            PaymentAssetOption {
                id: "baseSepoliaETH".into(),
                name: "Ethereum (Testnet)".into(),
                symbol: "ETH".into(),
                network: Network::BaseSepolia,
                testnet: true,
            },
        ]
    }
}

/// Ticker symbol for a preset option id. Unknown ids map to `ETH`.
pub fn symbol_for_asset_id(asset_id: &str) -> &'static str {
    match asset_id {
        "baseUSDC" => "USDC",
        "baseETH" | "baseSepoliaETH" => "ETH",
        _ => "ETH",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Assets whose USD conversion is fixed 1:1.
#[serde(rename_all = "UPPERCASE")]
pub enum Stablecoin {
    Usdc,
    Usdt,
    Dai,
}

impl Stablecoin {
    /// Case-insensitive symbol lookup.
    pub fn from_symbol(symbol: &str) -> Option<Stablecoin> {
        match symbol.to_ascii_uppercase().as_str() {
            "USDC" => Some(Stablecoin::Usdc),
            "USDT" => Some(Stablecoin::Usdt),
            "DAI" => Some(Stablecoin::Dai),
            _ => None,
        }
    }
}
