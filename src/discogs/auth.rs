//! Three-legged OAuth handshake coordination.
//!
//! The client performs the two token exchanges; this module strings them
//! together around the user's out-of-band approval, keeping the request
//! token's secret in [`TokenStore`] for the handshake window only.

use crate::discogs::client::{DiscogsClient, DiscogsError};
use crate::discogs::models::AccessCredentials;
use crate::discogs::token_store::{TokenStore, TokenStoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Token(#[from] TokenStoreError),
    #[error(transparent)]
    Discogs(#[from] DiscogsError),
}

/// What the caller needs to send the user off to approve the app.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub token: String,
    pub authorize_url: String,
}

/// Drives the PIN-based authorization flow.
///
/// `begin` hands back an authorization URL to open in a browser; once the
/// user approves and copies the PIN, `complete` exchanges it for access
/// credentials. The request token is removed from the store on success, so
/// its secret cannot be fetched for a second exchange.
pub struct OauthFlow {
    client: DiscogsClient,
    token_store: Arc<TokenStore>,
}

impl OauthFlow {
    pub fn new(client: DiscogsClient, token_store: Arc<TokenStore>) -> Self {
        Self {
            client,
            token_store,
        }
    }

    pub async fn begin(&self) -> Result<PendingAuthorization, AuthError> {
        let request_token = self.client.get_request_token().await?;
        self.token_store
            .store(&request_token.token, &request_token.secret);

        info!("Discogs auth: issued request token, awaiting PIN");

        Ok(PendingAuthorization {
            token: request_token.token,
            authorize_url: request_token.authorize_url,
        })
    }

    pub async fn complete(
        &self,
        token: &str,
        verifier_pin: &str,
    ) -> Result<AccessCredentials, AuthError> {
        let secret = self.token_store.get(token)?;

        let credentials = self
            .client
            .get_access_token(token, &secret, verifier_pin.trim())
            .await?;

        // The handshake is done; the request token must not be reusable
        self.token_store.remove(token);

        info!("Discogs auth: access token obtained");
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal Discogs OAuth stub: answers the two token endpoints with
    /// fixed form-urlencoded bodies and closes each connection.
    async fn spawn_oauth_stub() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();

                let body = if request.starts_with("GET /oauth/request_token") {
                    "oauth_token=rt1&oauth_token_secret=s1"
                } else {
                    "oauth_token=at1&oauth_token_secret=ats1"
                };
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        format!("http://{}", addr)
    }

    fn config(api_base_url: String) -> Config {
        Config {
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
            api_base_url,
            authorize_base_url: "https://www.discogs.com/oauth/authorize".to_string(),
            user_agent: "platter-test/0.1".to_string(),
            library_path: None,
        }
    }

    #[tokio::test]
    async fn handshake_discards_request_token_after_exchange() {
        let base_url = spawn_oauth_stub().await;
        let client = DiscogsClient::new(&config(base_url)).unwrap();
        let token_store = Arc::new(TokenStore::new());
        let flow = OauthFlow::new(client, Arc::clone(&token_store));

        let pending = flow.begin().await.unwrap();
        assert_eq!(pending.token, "rt1");
        assert!(pending.authorize_url.contains("oauth_token=rt1"));
        assert_eq!(token_store.get("rt1").unwrap(), "s1");

        let credentials = flow.complete(&pending.token, "1234-5678").await.unwrap();
        assert_eq!(credentials.token, "at1");
        assert_eq!(credentials.secret, "ats1");

        // The request token is gone; its secret cannot be fetched for a
        // second exchange
        assert_eq!(token_store.get("rt1"), Err(TokenStoreError::NotFound));
    }

    #[tokio::test]
    async fn complete_without_begin_fails_before_any_network_call() {
        // Unroutable base URL: a network attempt would hang or error out
        let client = DiscogsClient::new(&config("http://127.0.0.1:1".to_string())).unwrap();
        let flow = OauthFlow::new(client, Arc::new(TokenStore::new()));

        let err = flow.complete("never-issued", "1234-5678").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Token(TokenStoreError::NotFound)
        ));
    }
}
