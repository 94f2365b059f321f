//! Collection sync orchestrator.
//!
//! Drives one full import pass for one account: paginate the remote
//! collection, skip what the library already has, map the rest to drafts,
//! persist them, and come back with a report. A bad item never aborts the
//! run - one malformed release out of a multi-hundred-item collection gets
//! recorded and skipped, and the user sees "N imported, M skipped" instead
//! of a failed sync.

use crate::discogs::client::{DiscogsClient, DiscogsError};
use crate::discogs::models::{AccessCredentials, CollectionPage};
use crate::sync::mapper::{map_to_draft, RecordDraft};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const SYNC_PAGE_SIZE: u32 = 100;
const ITEM_DELAY: Duration = Duration::from_millis(100);
const PAGE_DELAY: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record store error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("account is not connected to Discogs")]
    NotConnected,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the caller read from the user-account store before asking for a sync.
#[derive(Debug, Clone)]
pub struct DiscogsAccount {
    pub username: String,
    pub credentials: Option<AccessCredentials>,
    pub sync_enabled: bool,
}

/// The two dedup key sets, loaded once before pagination starts.
#[derive(Debug, Default)]
pub struct ExternalIdIndex {
    pub release_ids: HashSet<String>,
    pub instance_ids: HashSet<String>,
}

/// Paginated access to a remote collection. Implemented by [`DiscogsClient`];
/// tests script their own pages.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn collection_page(
        &self,
        username: &str,
        credentials: &AccessCredentials,
        page: u32,
        per_page: u32,
    ) -> Result<CollectionPage, DiscogsError>;
}

#[async_trait]
impl CollectionSource for DiscogsClient {
    async fn collection_page(
        &self,
        username: &str,
        credentials: &AccessCredentials,
        page: u32,
        per_page: u32,
    ) -> Result<CollectionPage, DiscogsError> {
        self.user_collection(username, credentials, page, per_page)
            .await
    }
}

/// The local records store the orchestrator persists into.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn existing_external_ids(&self) -> Result<ExternalIdIndex, StoreError>;
    async fn insert_record(&self, draft: &RecordDraft) -> Result<String, StoreError>;
}

/// Pacing policy between persisted items and between pages, injected so
/// tests run without wall-clock waits.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn after_item(&self);
    async fn between_pages(&self);
}

/// Fixed delays tuned to stay under the Discogs per-minute rate limit.
pub struct FixedDelayPacer {
    item_delay: Duration,
    page_delay: Duration,
}

impl Default for FixedDelayPacer {
    fn default() -> Self {
        Self {
            item_delay: ITEM_DELAY,
            page_delay: PAGE_DELAY,
        }
    }
}

#[async_trait]
impl Pacer for FixedDelayPacer {
    async fn after_item(&self) {
        tokio::time::sleep(self.item_delay).await;
    }

    async fn between_pages(&self) {
        tokio::time::sleep(self.page_delay).await;
    }
}

/// Cooperative cancellation signal checked between pages and between items.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncItemError {
    pub label: String,
    pub message: String,
}

/// Outcome of one orchestration run. Built incrementally; a run that hits a
/// page-level failure still returns everything imported up to that point.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<SyncItemError>,
}

/// One sync run per account at a time is assumed - the caller serializes;
/// within a run everything is sequential by design, because parallel item
/// fetches would trip the upstream rate limit.
pub struct SyncService {
    source: Arc<dyn CollectionSource>,
    store: Arc<dyn RecordStore>,
    pacer: Arc<dyn Pacer>,
}

impl SyncService {
    pub fn new(source: Arc<dyn CollectionSource>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            source,
            store,
            pacer: Arc::new(FixedDelayPacer::default()),
        }
    }

    pub fn with_pacer(
        source: Arc<dyn CollectionSource>,
        store: Arc<dyn RecordStore>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            source,
            store,
            pacer,
        }
    }

    /// Import the account's remote collection into the local store.
    ///
    /// Fails loud only on account-level preconditions (`NotConnected`) or if
    /// the initial dedup-index read fails. Page fetch failures - including
    /// rate limiting - end the run early with the partial report; item
    /// failures are recorded and skipped.
    pub async fn import_collection(
        &self,
        account: &DiscogsAccount,
        cancel: &CancelFlag,
    ) -> Result<SyncReport, SyncError> {
        let credentials = account
            .credentials
            .as_ref()
            .filter(|c| !c.token.trim().is_empty() && !c.secret.trim().is_empty())
            .ok_or(SyncError::NotConnected)?;

        if !account.sync_enabled || account.username.trim().is_empty() {
            return Err(SyncError::NotConnected);
        }

        info!("Sync: starting import for {}", account.username);

        // Single read up front so dedup is O(1) per remote item
        let index = self.store.existing_external_ids().await?;
        let mut known_release_ids = index.release_ids;
        let mut known_instance_ids = index.instance_ids;

        let mut report = SyncReport::default();
        let mut page: u32 = 1;

        'pages: loop {
            if cancel.is_cancelled() {
                info!("Sync: cancelled before page {}", page);
                break;
            }

            let collection_page = match self
                .source
                .collection_page(&account.username, credentials, page, SYNC_PAGE_SIZE)
                .await
            {
                Ok(collection_page) => collection_page,
                Err(DiscogsError::RateLimited) => {
                    warn!("Sync: rate limited on page {}, stopping early", page);
                    report.errors.push(SyncItemError {
                        label: format!("page {}", page),
                        message: "rate limited by Discogs, partial sync".to_string(),
                    });
                    break;
                }
                Err(e) => {
                    warn!("Sync: page {} fetch failed: {}", page, e);
                    report.errors.push(SyncItemError {
                        label: format!("page {}", page),
                        message: e.to_string(),
                    });
                    break;
                }
            };

            let total_pages = collection_page.pagination.pages;
            debug!(
                "Sync: page {}/{} with {} item(s)",
                page,
                total_pages,
                collection_page.releases.len()
            );

            for item in collection_page.releases {
                if cancel.is_cancelled() {
                    info!("Sync: cancelled mid-page {}", page);
                    break 'pages;
                }

                let release_id = item.id.to_string();
                let instance_id = item.instance_id.to_string();

                if known_release_ids.contains(&release_id)
                    || known_instance_ids.contains(&instance_id)
                {
                    report.skipped += 1;
                    continue;
                }

                let draft = match map_to_draft(&item.basic_information, Some(item.instance_id)) {
                    Ok(draft) => draft,
                    Err(reason) => {
                        report.skipped += 1;
                        report.errors.push(SyncItemError {
                            label: item_label(&item.basic_information.title, &release_id),
                            message: reason.to_string(),
                        });
                        continue;
                    }
                };

                match self.store.insert_record(&draft).await {
                    Ok(local_id) => {
                        debug!("Sync: imported {} as {}", draft.title, local_id);
                        report.imported += 1;
                        known_release_ids.insert(release_id);
                        known_instance_ids.insert(instance_id);
                        self.pacer.after_item().await;
                    }
                    Err(e) => {
                        warn!("Sync: failed to persist {}: {}", draft.title, e);
                        report.skipped += 1;
                        report.errors.push(SyncItemError {
                            label: item_label(&item.basic_information.title, &release_id),
                            message: e.to_string(),
                        });
                    }
                }
            }

            if page >= total_pages {
                break;
            }
            page += 1;
            self.pacer.between_pages().await;
        }

        info!(
            "Sync: finished for {}: {} imported, {} skipped, {} error(s)",
            account.username,
            report.imported,
            report.skipped,
            report.errors.len()
        );

        Ok(report)
    }
}

fn item_label(title: &str, release_id: &str) -> String {
    if title.is_empty() {
        format!("release {}", release_id)
    } else {
        title.to_string()
    }
}
