//! OAuth 1.0a request signing (PLAINTEXT method).
//!
//! Discogs accepts the PLAINTEXT signature method over HTTPS, so no
//! HMAC construction is needed: the signature is the consumer secret and
//! token secret joined with `&`, percent-encoded. See the PIN-flow docs
//! at https://www.discogs.com/developers/#page:authentication

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

const SIGNATURE_METHOD: &str = "PLAINTEXT";
const NONCE_LEN: usize = 16;

/// Builds `Authorization: OAuth ...` headers for Discogs API calls.
///
/// Holds the application's consumer credentials; per-request token pairs
/// and extra parameters (e.g. `oauth_verifier`) are supplied by the caller.
/// Signs even when the consumer credentials are empty - validating the
/// configuration is the caller's job.
#[derive(Clone)]
pub struct Signer {
    consumer_key: String,
    consumer_secret: String,
}

impl Signer {
    pub fn new(consumer_key: String, consumer_secret: String) -> Self {
        Self {
            consumer_key,
            consumer_secret,
        }
    }

    /// Produce the full `OAuth k="v", ...` header value.
    ///
    /// `token` is the request- or access-token pair when one exists at this
    /// stage of the flow. `extra_params` end up in the header field set
    /// alongside the standard oauth_* fields.
    pub fn authorization_header(
        &self,
        token: Option<(&str, &str)>,
        extra_params: &[(&str, &str)],
    ) -> String {
        let token_secret = token.map(|(_, secret)| secret);

        let mut fields: Vec<(String, String)> = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce()),
            (
                "oauth_signature".to_string(),
                plaintext_signature(&self.consumer_secret, token_secret),
            ),
            (
                "oauth_signature_method".to_string(),
                SIGNATURE_METHOD.to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp().to_string()),
        ];

        if let Some((token, _)) = token {
            fields.push(("oauth_token".to_string(), token.to_string()));
        }

        for (key, value) in extra_params {
            fields.push((key.to_string(), value.to_string()));
        }

        let joined = fields
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", key, percent_encode(value)))
            .collect::<Vec<_>>()
            .join(", ");

        format!("OAuth {}", joined)
    }
}

/// PLAINTEXT signature: `consumer_secret&token_secret`, percent-encoded.
/// The token secret is the empty string before a token has been issued.
pub fn plaintext_signature(consumer_secret: &str, token_secret: Option<&str>) -> String {
    let raw = format!("{}&{}", consumer_secret, token_secret.unwrap_or(""));
    percent_encode(&raw)
}

/// Percent-encode per RFC 3986 unreserved characters, as OAuth requires.
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Random alphanumeric nonce, unique per call.
fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
