use crate::config::Config;
use crate::discogs::models::{
    AccessCredentials, AddedInstance, CollectionPage, Identity, ReleaseSummary, RequestToken,
    SearchResponse, SearchResult,
};
use crate::discogs::oauth::Signer;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Discogs caps collection pages at 100 items
const MAX_PAGE_SIZE: u32 = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum DiscogsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API rate limit exceeded")]
    RateLimited,
    #[error("Discogs API error ({status}): {body}")]
    Upstream { status: StatusCode, body: String },
    #[error("Malformed Discogs response: {0}")]
    Malformed(String),
}

/// Typed wrapper over the Discogs HTTP API.
///
/// Every call is signed by [`Signer`]; no anonymous requests are made.
/// Network only - nothing here touches local state.
#[derive(Clone)]
pub struct DiscogsClient {
    http: Client,
    signer: Signer,
    base_url: String,
    authorize_base_url: String,
}

impl DiscogsClient {
    pub fn new(config: &Config) -> Result<Self, DiscogsError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            signer: Signer::new(config.consumer_key.clone(), config.consumer_secret.clone()),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            authorize_base_url: config.authorize_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// First leg of the handshake: obtain a temporary request token and the
    /// authorization URL the user must open. PIN flow, so no callback
    /// parameter is sent.
    pub async fn get_request_token(&self) -> Result<RequestToken, DiscogsError> {
        let url = format!("{}/oauth/request_token", self.base_url);
        debug!("Discogs: GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Authorization", self.signer.authorization_header(None, &[]))
            .send()
            .await?;

        let body = read_body(response).await?;
        let (token, secret) = parse_token_response(&body)?;
        let authorize_url = format!("{}?oauth_token={}", self.authorize_base_url, token);

        Ok(RequestToken {
            token,
            secret,
            authorize_url,
        })
    }

    /// Final leg: exchange an approved request token plus the user-entered
    /// PIN for a long-lived access-token pair. The verifier goes into both
    /// the signed parameter set and the POST body.
    pub async fn get_access_token(
        &self,
        request_token: &str,
        request_token_secret: &str,
        verifier: &str,
    ) -> Result<AccessCredentials, DiscogsError> {
        let url = format!("{}/oauth/access_token", self.base_url);
        debug!("Discogs: POST {}", url);

        let header = self.signer.authorization_header(
            Some((request_token, request_token_secret)),
            &[("oauth_verifier", verifier)],
        );

        let response = self
            .http
            .post(&url)
            .header("Authorization", header)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(format!(
                "oauth_verifier={}",
                urlencoding::encode(verifier)
            ))
            .send()
            .await?;

        let body = read_body(response).await?;
        let (token, secret) = parse_token_response(&body)?;

        Ok(AccessCredentials { token, secret })
    }

    /// Who the access token belongs to.
    pub async fn identity(&self, credentials: &AccessCredentials) -> Result<Identity, DiscogsError> {
        let url = format!("{}/oauth/identity", self.base_url);
        self.get_json(&url, credentials).await
    }

    /// One page of the user's "All" collection folder. `per_page` is capped
    /// at the upstream maximum of 100.
    pub async fn user_collection(
        &self,
        username: &str,
        credentials: &AccessCredentials,
        page: u32,
        per_page: u32,
    ) -> Result<CollectionPage, DiscogsError> {
        let url = format!(
            "{}/users/{}/collection/folders/0/releases?page={}&per_page={}",
            self.base_url,
            username,
            page,
            clamp_page_size(per_page)
        );
        self.get_json(&url, credentials).await
    }

    /// Full detail for one release.
    pub async fn release(
        &self,
        release_id: u64,
        credentials: &AccessCredentials,
    ) -> Result<ReleaseSummary, DiscogsError> {
        let url = format!("{}/releases/{}", self.base_url, release_id);
        self.get_json(&url, credentials).await
    }

    /// Add a release to the user's "Uncategorized" collection folder.
    /// Duplicate adds are tolerated upstream, so this is idempotent from
    /// the caller's perspective.
    pub async fn add_to_collection(
        &self,
        username: &str,
        release_id: u64,
        credentials: &AccessCredentials,
    ) -> Result<u64, DiscogsError> {
        let url = format!(
            "{}/users/{}/collection/folders/1/releases/{}",
            self.base_url, username, release_id
        );
        debug!("Discogs: POST {}", url);

        let header = self
            .signer
            .authorization_header(Some((&credentials.token, &credentials.secret)), &[]);

        let response = self
            .http
            .post(&url)
            .header("Authorization", header)
            .send()
            .await?;

        let added: AddedInstance = parse_json(read_body(response).await?)?;
        Ok(added.instance_id)
    }

    /// Search the Discogs database. Uses the user's credentials when given;
    /// otherwise signs with the application's consumer pair. Never anonymous.
    pub async fn search(
        &self,
        query: &str,
        credentials: Option<&AccessCredentials>,
    ) -> Result<Vec<SearchResult>, DiscogsError> {
        let url = format!(
            "{}/database/search?q={}",
            self.base_url,
            urlencoding::encode(query)
        );
        debug!("Discogs: GET {}", url);

        let header = self.signer.authorization_header(
            credentials.map(|c| (c.token.as_str(), c.secret.as_str())),
            &[],
        );

        let response = self
            .http
            .get(&url)
            .header("Authorization", header)
            .send()
            .await?;

        let search: SearchResponse = parse_json(read_body(response).await?)?;
        Ok(search.results)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        credentials: &AccessCredentials,
    ) -> Result<T, DiscogsError> {
        debug!("Discogs: GET {}", url);

        let header = self
            .signer
            .authorization_header(Some((&credentials.token, &credentials.secret)), &[]);

        let response = self
            .http
            .get(url)
            .header("Authorization", header)
            .send()
            .await?;

        parse_json(read_body(response).await?)
    }
}

/// Collapse a response into its body text, mapping 429 and other non-2xx
/// statuses to their error variants.
async fn read_body(response: reqwest::Response) -> Result<String, DiscogsError> {
    let status = response.status();
    let body = response.text().await?;

    match status_error(status, body) {
        Ok(body) => Ok(body),
        Err(err) => {
            match &err {
                DiscogsError::RateLimited => warn!("Discogs rate limit exceeded"),
                DiscogsError::Upstream { status, .. } => {
                    warn!("Discogs API error: status {}", status)
                }
                _ => {}
            }
            Err(err)
        }
    }
}

fn status_error(status: StatusCode, body: String) -> Result<String, DiscogsError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(DiscogsError::RateLimited);
    }
    if !status.is_success() {
        return Err(DiscogsError::Upstream { status, body });
    }
    Ok(body)
}

fn parse_json<T: DeserializeOwned>(body: String) -> Result<T, DiscogsError> {
    serde_json::from_str(&body).map_err(|e| {
        error!("JSON parsing error: {}", e);
        DiscogsError::Malformed(e.to_string())
    })
}

/// Parse an `application/x-www-form-urlencoded` token response body into
/// the (token, secret) pair.
fn parse_token_response(body: &str) -> Result<(String, String), DiscogsError> {
    let mut token = None;
    let mut secret = None;

    for pair in body.split('&') {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or("");
        let value = parts.next().unwrap_or("");
        let value = urlencoding::decode(value)
            .map_err(|e| DiscogsError::Malformed(format!("invalid token encoding: {}", e)))?
            .into_owned();

        match key {
            "oauth_token" => token = Some(value),
            "oauth_token_secret" => secret = Some(value),
            _ => {}
        }
    }

    match (token, secret) {
        (Some(token), Some(secret)) if !token.is_empty() && !secret.is_empty() => {
            Ok((token, secret))
        }
        (None, _) | (Some(_), None) => Err(DiscogsError::Malformed(
            "token response missing oauth_token or oauth_token_secret".to_string(),
        )),
        _ => Err(DiscogsError::Malformed(
            "token response contained an empty token field".to_string(),
        )),
    }
}

fn clamp_page_size(per_page: u32) -> u32 {
    per_page.min(MAX_PAGE_SIZE)
}
