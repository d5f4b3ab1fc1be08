//! Local settings repository: dietary preferences and small key/value state

use crate::error::{Error, Result};
use crate::models::DietaryPreferences;
use libsql::Connection;

const PREFERENCES_KEY: &str = "dietary_preferences";

/// Trait for settings storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    /// Load dietary preferences, falling back to defaults
    async fn load_preferences(&self) -> Result<DietaryPreferences>;

    /// Save dietary preferences
    async fn save_preferences(&self, preferences: &DietaryPreferences) -> Result<()>;

    /// Read a raw setting
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a raw setting
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// libSQL implementation of `SettingsRepository`
pub struct LibSqlSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for LibSqlSettingsRepository<'_> {
    async fn load_preferences(&self) -> Result<DietaryPreferences> {
        let Some(raw) = self.get(PREFERENCES_KEY).await? else {
            return Ok(DietaryPreferences::default());
        };

        match serde_json::from_str(&raw) {
            Ok(preferences) => Ok(preferences),
            Err(error) => {
                tracing::warn!("Ignoring unreadable dietary preferences: {error}");
                Ok(DietaryPreferences::default())
            }
        }
    }

    async fn save_preferences(&self, preferences: &DietaryPreferences) -> Result<()> {
        let raw = serde_json::to_string(preferences)?;
        self.set(PREFERENCES_KEY, &raw).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        if key.trim().is_empty() {
            return Err(Error::InvalidInput("setting key cannot be empty".into()));
        }

        let mut rows = self
            .conn
            .query("SELECT value FROM settings WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::InvalidInput("setting key cannot be empty".into()));
        }

        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{DietaryGoal, SpiceLevel};
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_default_preferences() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        let preferences = repo.load_preferences().await.unwrap();
        assert_eq!(preferences, DietaryPreferences::default());
        assert_eq!(preferences.spice_level, SpiceLevel::MEDIUM);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_and_load_preferences() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        let mut preferences = DietaryPreferences::default();
        preferences.toggle_goal(DietaryGoal::Vegan);
        preferences.add_allergy("peanuts").unwrap();
        preferences.spice_level = SpiceLevel::HOT;

        repo.save_preferences(&preferences).await.unwrap();
        let loaded = repo.load_preferences().await.unwrap();
        assert_eq!(loaded, preferences);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_corrupt_preferences_fall_back_to_default() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        repo.set(PREFERENCES_KEY, "{not json").await.unwrap();
        let loaded = repo.load_preferences().await.unwrap();
        assert_eq!(loaded, DietaryPreferences::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_raw_settings() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        assert_eq!(repo.get("deck_cursor").await.unwrap(), None);
        repo.set("deck_cursor", "abc").await.unwrap();
        assert_eq!(repo.get("deck_cursor").await.unwrap().as_deref(), Some("abc"));
        assert!(repo.set(" ", "x").await.is_err());
    }
}
