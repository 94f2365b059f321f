use serde::{Deserialize, Serialize};

/// Long-lived OAuth access-token pair for one connected user.
///
/// Produced by the access-token exchange and consumed on every
/// authenticated call; persisting it is the credential store's job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessCredentials {
    pub token: String,
    pub secret: String,
}

/// Result of the request-token leg of the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
    /// URL for the user to open in a browser to approve the app (PIN flow,
    /// no callback parameter).
    pub authorize_url: String,
}

/// Response from /oauth/identity
#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub username: String,
}

/// Pagination block shared by Discogs list endpoints
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PaginationInfo {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    #[serde(default)]
    pub items: u64,
}

/// One page of a user's collection folder
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionPage {
    pub pagination: PaginationInfo,
    #[serde(default)]
    pub releases: Vec<CollectionItem>,
}

/// A single collection entry: one physical copy of one release.
///
/// `instance_id` distinguishes multiple copies of the same release in a
/// collection; `id` is the release itself.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionItem {
    pub id: u64,
    pub instance_id: u64,
    pub date_added: Option<String>,
    pub basic_information: ReleaseSummary,
}

/// Artist credit in Discogs API responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtistCredit {
    pub name: String,
}

/// Label credit with its catalog number
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelCredit {
    pub name: String,
    pub catno: Option<String>,
}

/// One format entry, e.g. {name: "Vinyl", descriptions: ["LP", "Album"]}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub name: String,
    #[serde(default)]
    pub descriptions: Vec<String>,
}

/// Immutable release snapshot as returned inside collection items and by
/// the release-detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseSummary {
    pub id: u64,
    pub master_id: Option<u64>,
    pub title: String,
    pub year: Option<u32>,
    #[serde(default)]
    pub artists: Vec<ArtistCredit>,
    #[serde(default)]
    pub labels: Vec<LabelCredit>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub formats: Vec<FormatDescriptor>,
    pub thumb: Option<String>,
}

/// Discogs search response wrapper
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// Individual search result
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchResult {
    pub id: u64,
    pub title: String,
    pub year: Option<String>,
    pub genre: Option<Vec<String>>,
    pub style: Option<Vec<String>>,
    pub format: Option<Vec<String>>,
    pub country: Option<String>,
    pub label: Option<Vec<String>>,
    pub cover_image: Option<String>,
    pub thumb: Option<String>,
    pub master_id: Option<u64>,
    #[serde(rename = "type")]
    pub result_type: String,
}

/// Response from adding a release to a collection folder
#[derive(Debug, Clone, Deserialize)]
pub struct AddedInstance {
    pub instance_id: u64,
}
