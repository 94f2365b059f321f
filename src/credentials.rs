use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::discogs::models::AccessCredentials;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
    #[error("Stored connection is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("No Discogs connection stored")]
    NotFound,
}

/// The long-lived half of a completed handshake: who connected, and the
/// token pair that signs their requests from now on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredConnection {
    pub username: String,
    pub credentials: AccessCredentials,
}

/// Keychain-backed storage for the Discogs connection.
///
/// The token pair never touches the database or any config file; it lives
/// in the system keychain as one JSON blob under a fixed entry name.
pub struct CredentialStore {
    entry: keyring::Entry,
}

impl CredentialStore {
    pub fn new() -> Result<Self, CredentialError> {
        let entry = keyring::Entry::new("platter", "discogs_connection")?;
        Ok(Self { entry })
    }

    /// Persist a freshly exchanged connection, replacing any previous one
    pub fn store(&self, connection: &StoredConnection) -> Result<(), CredentialError> {
        let payload = serde_json::to_string(connection)?;
        self.entry.set_password(&payload)?;
        info!("Stored Discogs connection for {}", connection.username);
        Ok(())
    }

    pub fn load(&self) -> Result<StoredConnection, CredentialError> {
        match self.entry.get_password() {
            Ok(payload) => Ok(serde_json::from_str(&payload)?),
            Err(keyring::Error::NoEntry) => Err(CredentialError::NotFound),
            Err(e) => Err(CredentialError::Keyring(e)),
        }
    }

    /// Remove the stored connection (disconnect)
    pub fn clear(&self) -> Result<(), CredentialError> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::Keyring(e)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.load().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_round_trips_through_json() {
        let connection = StoredConnection {
            username: "collector".to_string(),
            credentials: AccessCredentials {
                token: "tok".to_string(),
                secret: "sec".to_string(),
            },
        };

        let payload = serde_json::to_string(&connection).unwrap();
        let restored: StoredConnection = serde_json::from_str(&payload).unwrap();
        assert_eq!(restored, connection);
    }

    #[test]
    fn corrupt_payload_is_reported_as_corrupt() {
        let result: Result<StoredConnection, serde_json::Error> =
            serde_json::from_str("not json");
        assert!(result.is_err());
    }
}
