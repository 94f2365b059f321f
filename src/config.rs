use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Discogs consumer key is not configured")]
    MissingConsumerKey,
    #[error("Discogs consumer secret is not configured")]
    MissingConsumerSecret,
}

/// Application configuration
/// In debug builds: loads from .env file
/// In release builds: loads from environment only
#[derive(Clone, Debug)]
pub struct Config {
    /// OAuth consumer key issued by Discogs for this application
    pub consumer_key: String,
    /// OAuth consumer secret paired with the key
    pub consumer_secret: String,
    /// Base URL of the Discogs API
    pub api_base_url: String,
    /// Base URL of the user-facing authorization page (PIN flow)
    pub authorize_base_url: String,
    /// User-Agent sent with every request; Discogs rejects requests without one
    pub user_agent: String,
    /// Override for the library database location
    pub library_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration based on build mode
    pub fn load() -> Self {
        #[cfg(debug_assertions)]
        {
            // Try to load .env file
            if dotenvy::dotenv().is_ok() {
                tracing::info!("Config: dev mode - loaded .env file");
            }
        }

        Self::from_env()
    }

    fn from_env() -> Self {
        let consumer_key = std::env::var("PLATTER_DISCOGS_CONSUMER_KEY").unwrap_or_default();
        let consumer_secret = std::env::var("PLATTER_DISCOGS_CONSUMER_SECRET").unwrap_or_default();

        let api_base_url = std::env::var("PLATTER_DISCOGS_API_URL")
            .unwrap_or_else(|_| "https://api.discogs.com".to_string());
        let authorize_base_url = std::env::var("PLATTER_DISCOGS_AUTHORIZE_URL")
            .unwrap_or_else(|_| "https://www.discogs.com/oauth/authorize".to_string());

        let library_path = std::env::var("PLATTER_LIBRARY_PATH").ok().map(PathBuf::from);

        Self {
            consumer_key,
            consumer_secret,
            api_base_url,
            authorize_base_url,
            user_agent: "platter/0.1 +https://github.com/hideselfview/platter".to_string(),
            library_path,
        }
    }

    /// Fail fast before any network call if consumer credentials are absent
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.consumer_key.trim().is_empty() {
            return Err(ConfigError::MissingConsumerKey);
        }
        if self.consumer_secret.trim().is_empty() {
            return Err(ConfigError::MissingConsumerSecret);
        }
        Ok(())
    }

    /// Get the library storage path
    pub fn get_library_path(&self) -> PathBuf {
        if let Some(path) = &self.library_path {
            return path.clone();
        }

        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home_dir.join(".platter")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(key: &str, secret: &str) -> Config {
        Config {
            consumer_key: key.to_string(),
            consumer_secret: secret.to_string(),
            api_base_url: "https://api.discogs.com".to_string(),
            authorize_base_url: "https://www.discogs.com/oauth/authorize".to_string(),
            user_agent: "platter/0.1".to_string(),
            library_path: None,
        }
    }

    #[test]
    fn validate_rejects_empty_consumer_key() {
        let config = config_with("", "secret");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingConsumerKey)
        ));
    }

    #[test]
    fn validate_rejects_blank_consumer_secret() {
        let config = config_with("key", "  ");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingConsumerSecret)
        ));
    }

    #[test]
    fn validate_accepts_complete_credentials() {
        assert!(config_with("key", "secret").validate().is_ok());
    }
}
