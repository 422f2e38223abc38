//! Storefront settings as persisted and as exposed over the API.

use super::asset::PaymentAsset;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Buyer-session settings.
///
/// Every field has a default so a partially stored value can be merged
/// over [`Settings::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Merchant address receiving wallet payments. Empty means unset.
    pub recipient_address: String,
    /// Preset payment asset option id, e.g. `baseUSDC`.
    pub default_payment_asset: CompactString,
    /// Overrides the preset when set.
    pub custom_asset: Option<PaymentAsset>,
    pub project_id: String,
    pub enable_testnet: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recipient_address: String::new(),
            default_payment_asset: "baseUSDC".into(),
            custom_asset: None,
            project_id: String::new(),
            enable_testnet: true,
        }
    }
}

impl Settings {
    /// The asset a crypto checkout uses when none is chosen explicitly.
    pub fn effective_asset(&self) -> PaymentAsset {
        match &self.custom_asset {
            Some(asset) => asset.clone(),
            None => PaymentAsset::from_option_id(&self.default_payment_asset),
        }
    }

    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(recipient_address) = patch.recipient_address {
            self.recipient_address = recipient_address;
        }
        if let Some(default_payment_asset) = patch.default_payment_asset {
            self.default_payment_asset = default_payment_asset;
        }
        if let Some(custom_asset) = patch.custom_asset {
            self.custom_asset = custom_asset;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if let Some(enable_testnet) = patch.enable_testnet {
            self.enable_testnet = enable_testnet;
        }
    }
}

/// Partial update for [`Settings`]. `custom_asset: null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub recipient_address: Option<String>,
    pub default_payment_asset: Option<CompactString>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub custom_asset: Option<Option<PaymentAsset>>,
    pub project_id: Option<String>,
    pub enable_testnet: Option<bool>,
}

mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T: Serialize, S: Serializer>(
        value: &Option<Option<T>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T: Deserialize<'de>, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<T>>, D::Error> {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
