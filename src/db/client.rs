use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::db::models::{DbDiscogsAccount, DbRecord};
use crate::sync::mapper::{RecordDraft, RecordType};
use crate::sync::service::{ExternalIdIndex, RecordStore, StoreError};

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Initialize database connection and create tables
    pub async fn new(database_path: &str) -> Result<Self, sqlx::Error> {
        // Use sqlite:// with ?mode=rwc to create if it doesn't exist
        let database_url = format!("sqlite://{}?mode=rwc", database_path);
        info!("Connecting to {}", database_url);
        let pool = SqlitePool::connect(&database_url).await?;

        let db = Database { pool };
        db.create_tables().await?;
        Ok(db)
    }

    /// Create all necessary tables
    async fn create_tables(&self) -> Result<(), sqlx::Error> {
        // Records table (the library itself)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                artist TEXT NOT NULL,
                title TEXT NOT NULL,
                label TEXT,
                catalog_number TEXT,
                release_year INTEGER,
                genre TEXT,
                record_type TEXT NOT NULL DEFAULT 'LP',
                image_url TEXT,
                discogs_release_id TEXT,
                discogs_master_id TEXT,
                discogs_instance_id TEXT,
                last_synced_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // One row per synced copy: duplicate external ids must fail loudly
        // even if a dedup check upstream is bypassed
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_records_discogs_release
             ON records (discogs_release_id) WHERE discogs_release_id IS NOT NULL",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_records_discogs_instance
             ON records (discogs_instance_id) WHERE discogs_instance_id IS NOT NULL",
        )
        .execute(&self.pool)
        .await?;

        // Connected Discogs account (single-user library, at most one row)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS discogs_accounts (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                sync_enabled BOOLEAN NOT NULL DEFAULT TRUE,
                last_sync_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a record row
    pub async fn insert_record(&self, record: &DbRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO records (
                id, artist, title, label, catalog_number, release_year, genre,
                record_type, image_url, discogs_release_id, discogs_master_id,
                discogs_instance_id, last_synced_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.artist)
        .bind(&record.title)
        .bind(&record.label)
        .bind(&record.catalog_number)
        .bind(record.release_year)
        .bind(&record.genre)
        .bind(record.record_type.as_str())
        .bind(&record.image_url)
        .bind(&record.discogs_release_id)
        .bind(&record.discogs_master_id)
        .bind(&record.discogs_instance_id)
        .bind(record.last_synced_at.map(|t| t.to_rfc3339()))
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All records, newest first
    pub async fn get_records(&self) -> Result<Vec<DbRecord>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM records ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    pub async fn count_records(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM records")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Both dedup key sets in one read, used before a sync pass starts
    pub async fn get_external_id_index(&self) -> Result<ExternalIdIndex, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT discogs_release_id, discogs_instance_id FROM records
             WHERE discogs_release_id IS NOT NULL OR discogs_instance_id IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut index = ExternalIdIndex::default();
        for row in rows {
            if let Some(release_id) = row.get::<Option<String>, _>("discogs_release_id") {
                index.release_ids.insert(release_id);
            }
            if let Some(instance_id) = row.get::<Option<String>, _>("discogs_instance_id") {
                index.instance_ids.insert(instance_id);
            }
        }

        Ok(index)
    }

    /// The connected Discogs account, if any
    pub async fn get_discogs_account(&self) -> Result<Option<DbDiscogsAccount>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM discogs_accounts LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| DbDiscogsAccount {
            id: row.get("id"),
            username: row.get("username"),
            sync_enabled: row.get("sync_enabled"),
            last_sync_at: row
                .get::<Option<String>, _>("last_sync_at")
                .map(|t| parse_timestamp(&t)),
            created_at: parse_timestamp(&row.get::<String, _>("created_at")),
            updated_at: parse_timestamp(&row.get::<String, _>("updated_at")),
        }))
    }

    /// Create or update the connected account row after a handshake
    pub async fn upsert_discogs_account(
        &self,
        username: &str,
    ) -> Result<DbDiscogsAccount, sqlx::Error> {
        if let Some(existing) = self.get_discogs_account().await? {
            if existing.username == username {
                return Ok(existing);
            }
            sqlx::query("DELETE FROM discogs_accounts WHERE id = ?")
                .bind(&existing.id)
                .execute(&self.pool)
                .await?;
        }

        let account = DbDiscogsAccount::new(username);
        sqlx::query(
            r#"
            INSERT INTO discogs_accounts (
                id, username, sync_enabled, last_sync_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(account.sync_enabled)
        .bind(account.last_sync_at.map(|t| t.to_rfc3339()))
        .bind(account.created_at.to_rfc3339())
        .bind(account.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    /// Stamp the account after a completed orchestration run
    pub async fn mark_sync_completed(
        &self,
        account_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE discogs_accounts SET last_sync_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RecordStore for Database {
    async fn existing_external_ids(&self) -> Result<ExternalIdIndex, StoreError> {
        self.get_external_id_index()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn insert_record(&self, draft: &RecordDraft) -> Result<String, StoreError> {
        let record = DbRecord::from_draft(draft);
        Database::insert_record(self, &record)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(record.id)
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> DbRecord {
    DbRecord {
        id: row.get("id"),
        artist: row.get("artist"),
        title: row.get("title"),
        label: row.get("label"),
        catalog_number: row.get("catalog_number"),
        release_year: row.get("release_year"),
        genre: row.get("genre"),
        record_type: RecordType::from_str_or_lp(&row.get::<String, _>("record_type")),
        image_url: row.get("image_url"),
        discogs_release_id: row.get("discogs_release_id"),
        discogs_master_id: row.get("discogs_master_id"),
        discogs_instance_id: row.get("discogs_instance_id"),
        last_synced_at: row
            .get::<Option<String>, _>("last_synced_at")
            .map(|t| parse_timestamp(&t)),
        created_at: parse_timestamp(&row.get::<String, _>("created_at")),
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at")),
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .unwrap()
        .with_timezone(&Utc)
}
