//! Persisted UI preferences.

use seedream_core::Language;

use crate::error::StoreError;
use crate::keys;
use crate::kv::KeyValueStore;

/// Read the saved UI language, defaulting to English when nothing valid
/// is stored.
pub async fn load_language(storage: &dyn KeyValueStore) -> Result<Language, StoreError> {
    let stored = storage.get(keys::LANGUAGE).await?;
    Ok(Language::from_stored(stored.as_deref()))
}

/// Persist the UI language as its two-letter code.
pub async fn save_language(storage: &dyn KeyValueStore, language: Language) -> Result<(), StoreError> {
    storage.set(keys::LANGUAGE, language.code()).await?;
    tracing::info!(language = language.code(), "Language preference saved");
    Ok(())
}
