//! Buyer-session settings backed by a [`ConfigStore`].

use crate::config::ConfigStore;
use crate::storage::{KeyValueStore, StorageError, read_json, write_json};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use wpay_sdk::objects::{Settings, SettingsPatch};

pub const SETTINGS_STORAGE_KEY: &str = "appkit-pay-settings";

#[derive(Clone)]
pub struct SettingsStore {
    current: ConfigStore<Settings>,
    store: Arc<dyn KeyValueStore>,
    // serializes read-modify-persist cycles
    writer: Arc<Mutex<()>>,
}

impl SettingsStore {
    /// Stored values are merged over the defaults. Unreadable settings fall
    /// back to the defaults.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let settings = match read_json::<Settings>(store.as_ref(), SETTINGS_STORAGE_KEY).await {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Falling back to default settings");
                Settings::default()
            }
        };
        Self {
            current: ConfigStore::new(settings),
            store,
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub async fn current(&self) -> Settings {
        self.current.snapshot().await
    }

    pub async fn update(&self, patch: SettingsPatch) -> Result<Settings, StorageError> {
        let _guard = self.writer.lock().await;
        let mut next = self.current.snapshot().await;
        next.apply(patch);
        write_json(self.store.as_ref(), SETTINGS_STORAGE_KEY, &next).await?;
        self.current.update(next.clone()).await;
        info!(
            asset = %next.default_payment_asset,
            has_recipient = !next.recipient_address.is_empty(),
            "Settings updated"
        );
        Ok(next)
    }

    pub async fn reset(&self) -> Result<Settings, StorageError> {
        let _guard = self.writer.lock().await;
        self.store.evict(SETTINGS_STORAGE_KEY).await?;
        let defaults = Settings::default();
        self.current.update(defaults.clone()).await;
        info!("Settings reset to defaults");
        Ok(defaults)
    }
}
