//! services/client/src/preferences.rs

use atticus_core::domain::ThemeMode;
use atticus_core::ports::{KeyValueStore, PortResult};
use std::sync::Arc;
use tracing::warn;

pub const THEME_KEY: &str = "themeMode";

/// The persisted light/dark choice.
pub struct ThemePreference {
    store: Arc<dyn KeyValueStore>,
}

impl ThemePreference {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Light unless "dark" was stored; read failures fall back too.
    pub async fn load(&self) -> ThemeMode {
        match self.store.get(THEME_KEY).await {
            Ok(Some(value)) => ThemeMode::from_stored(&value),
            Ok(None) => ThemeMode::default(),
            Err(e) => {
                warn!("Could not read the theme preference: {:?}", e);
                ThemeMode::default()
            }
        }
    }

    pub async fn set(&self, mode: ThemeMode) -> PortResult<()> {
        self.store.set(THEME_KEY, mode.as_str()).await
    }

    pub async fn toggle(&self) -> PortResult<ThemeMode> {
        let next = self.load().await.toggled();
        self.set(next).await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryKeyValueStore;

    #[tokio::test]
    async fn theme_defaults_to_light_and_toggle_persists() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let prefs = ThemePreference::new(store.clone());
        assert_eq!(prefs.load().await, ThemeMode::Light);

        assert_eq!(prefs.toggle().await.unwrap(), ThemeMode::Dark);
        assert_eq!(store.get(THEME_KEY).await.unwrap().as_deref(), Some("dark"));
        assert_eq!(prefs.load().await, ThemeMode::Dark);

        assert_eq!(prefs.toggle().await.unwrap(), ThemeMode::Light);
        assert_eq!(store.get(THEME_KEY).await.unwrap().as_deref(), Some("light"));
    }

    #[tokio::test]
    async fn unreadable_values_fall_back_to_light() {
        let store = Arc::new(MemoryKeyValueStore::new());
        store.set(THEME_KEY, "sepia").await.unwrap();
        assert_eq!(ThemePreference::new(store).load().await, ThemeMode::Light);
    }
}
