// Test support utilities for integration tests

use crate::discogs::client::DiscogsError;
use crate::discogs::models::{AccessCredentials, CollectionItem, CollectionPage, PaginationInfo};
use crate::sync::service::CollectionSource;
use std::sync::Mutex;

/// Mock collection source backed by pre-built pages.
///
/// Serves the given items in fixed-size pages instead of hitting the
/// Discogs API. Useful for exercising the sync path against a real
/// SQLite store without network access.
pub struct MockCollectionSource {
    items: Vec<CollectionItem>,
    page_size: u32,
    fail_on_page: Mutex<Option<u32>>,
}

impl MockCollectionSource {
    pub fn new(items: Vec<CollectionItem>, page_size: u32) -> Self {
        MockCollectionSource {
            items,
            page_size: page_size.max(1),
            fail_on_page: Mutex::new(None),
        }
    }

    /// Make a specific page fetch fail with a rate-limit error
    pub fn rate_limit_page(&self, page: u32) {
        *self.fail_on_page.lock().unwrap() = Some(page);
    }

    fn total_pages(&self) -> u32 {
        let len = self.items.len() as u32;
        if len == 0 {
            1
        } else {
            len.div_ceil(self.page_size)
        }
    }
}

#[async_trait::async_trait]
impl CollectionSource for MockCollectionSource {
    async fn collection_page(
        &self,
        _username: &str,
        _credentials: &AccessCredentials,
        page: u32,
        _per_page: u32,
    ) -> Result<CollectionPage, DiscogsError> {
        if *self.fail_on_page.lock().unwrap() == Some(page) {
            return Err(DiscogsError::RateLimited);
        }

        let start = ((page.saturating_sub(1)) * self.page_size) as usize;
        let end = (start + self.page_size as usize).min(self.items.len());
        let releases = if start < self.items.len() {
            self.items[start..end].to_vec()
        } else {
            Vec::new()
        };

        Ok(CollectionPage {
            pagination: PaginationInfo {
                page,
                pages: self.total_pages(),
                per_page: self.page_size,
                items: self.items.len() as u64,
            },
            releases,
        })
    }
}
