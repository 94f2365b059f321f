pub mod auth;
pub mod client;
pub mod models;
pub mod oauth;
pub mod token_store;

pub use auth::{AuthError, OauthFlow, PendingAuthorization};
pub use client::{DiscogsClient, DiscogsError};
pub use models::AccessCredentials;
pub use token_store::{TokenStore, TokenStoreError};
