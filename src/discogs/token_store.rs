//! Short-lived storage for request-token secrets during the OAuth handshake.
//!
//! The secret for a request token only needs to survive between
//! `OauthFlow::begin` and `OauthFlow::complete` - usually the minute or two
//! it takes the user to approve the app and copy the PIN. Entries expire
//! after ten minutes; a background sweeper and lazy purging on access keep
//! abandoned handshakes from accumulating.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenStoreError {
    #[error("request token was never issued")]
    NotFound,
    #[error("request token expired, restart the authorization flow")]
    Expired,
}

struct PendingToken {
    secret: String,
    stored_at: Instant,
}

/// Thread-safe map of request token -> secret with a fixed expiry window.
///
/// An explicitly-owned instance rather than a process-wide global, so tests
/// can construct isolated stores and shrink the TTL to exercise expiry.
pub struct TokenStore {
    entries: Mutex<HashMap<String, PendingToken>>,
    ttl: Duration,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Insert or overwrite the secret for a request token, timestamped now.
    pub fn store(&self, token: &str, secret: &str) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            token.to_string(),
            PendingToken {
                secret: secret.to_string(),
                stored_at: Instant::now(),
            },
        );
    }

    /// Fetch the secret for a token if it is still within the expiry window.
    ///
    /// Expired entries encountered here are purged immediately rather than
    /// waiting for the next sweep.
    pub fn get(&self, token: &str) -> Result<String, TokenStoreError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(token) {
            None => Err(TokenStoreError::NotFound),
            Some(pending) if pending.stored_at.elapsed() >= self.ttl => {
                entries.remove(token);
                debug!("TokenStore: purged expired request token on access");
                Err(TokenStoreError::Expired)
            }
            Some(pending) => Ok(pending.secret.clone()),
        }
    }

    /// Delete a token. Idempotent - removing an absent token is not an error.
    pub fn remove(&self, token: &str) {
        self.entries.lock().unwrap().remove(token);
    }

    /// Drop every entry older than the expiry window. Returns the number
    /// of entries removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, pending| pending.stored_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Spawn the periodic sweep task for a shared store.
///
/// The handle can be dropped; the task runs until the process exits or it
/// is aborted.
pub fn spawn_sweeper(store: Arc<TokenStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        // First tick fires immediately; skip it so a fresh store isn't swept
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                debug!("TokenStore: sweep removed {} expired token(s)", purged);
            }
        }
    })
}
