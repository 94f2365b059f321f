use crate::sync::mapper::{RecordDraft, RecordType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A record in the local library.
///
/// Columns mirror [`RecordDraft`] plus bookkeeping timestamps. The two
/// Discogs ids carry UNIQUE indexes so a duplicate import fails at the
/// storage layer even if a dedup check is bypassed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbRecord {
    pub id: String,
    pub artist: String,
    pub title: String,
    pub label: Option<String>,
    pub catalog_number: Option<String>,
    pub release_year: Option<i64>,
    pub genre: Option<String>,
    pub record_type: RecordType,
    pub image_url: Option<String>,
    /// Release id on Discogs, set only for synced records
    pub discogs_release_id: Option<String>,
    pub discogs_master_id: Option<String>,
    /// Collection-instance id on Discogs; distinguishes duplicate copies
    pub discogs_instance_id: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbRecord {
    pub fn from_draft(draft: &RecordDraft) -> Self {
        let now = Utc::now();
        DbRecord {
            id: Uuid::new_v4().to_string(),
            artist: draft.artist.clone(),
            title: draft.title.clone(),
            label: draft.label.clone(),
            catalog_number: draft.catalog_number.clone(),
            release_year: draft.release_year.map(|y| y as i64),
            genre: draft.genre.clone(),
            record_type: draft.record_type,
            image_url: draft.image_url.clone(),
            discogs_release_id: Some(draft.discogs_release_id.clone()),
            discogs_master_id: draft.discogs_master_id.clone(),
            discogs_instance_id: draft.discogs_instance_id.clone(),
            last_synced_at: Some(draft.last_synced_at),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The one Discogs connection this library knows about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbDiscogsAccount {
    pub id: String,
    pub username: String,
    pub sync_enabled: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbDiscogsAccount {
    pub fn new(username: &str) -> Self {
        let now = Utc::now();
        DbDiscogsAccount {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            sync_enabled: true,
            last_sync_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
