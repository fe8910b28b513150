//! Paged list of popular discussions.

use std::sync::Arc;

use tracing::warn;

use crate::api::ForumGateway;
use crate::error::GatewayResult;
use crate::models::Discussion;
use crate::pagination::Pagination;

pub struct PopularDiscussions<G: ForumGateway> {
    gateway: Arc<G>,
    pagination: Pagination,
    discussions: Vec<Discussion>,
    loading: bool,
}

impl<G: ForumGateway> PopularDiscussions<G> {
    pub fn new(gateway: Arc<G>, limit: u32) -> Self {
        Self {
            gateway,
            pagination: Pagination::new(limit),
            discussions: Vec::new(),
            loading: false,
        }
    }

    pub fn discussions(&self) -> &[Discussion] {
        &self.discussions
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The numbered paginator is shown under the same rule as "load more".
    pub fn has_pages(&self) -> bool {
        self.pagination.has_more()
    }

    /// Fetches the current page, replacing what is shown.
    pub async fn load(&mut self) -> GatewayResult<()> {
        self.loading = true;
        let result = self
            .gateway
            .list_popular(self.pagination.page, self.pagination.limit)
            .await;
        self.loading = false;
        match result {
            Ok(page) => {
                self.pagination.total = page.total;
                self.discussions = page.data;
                Ok(())
            }
            Err(err) => {
                warn!(page = self.pagination.page, error = %err, "failed to load popular discussions");
                Err(err)
            }
        }
    }

    pub async fn set_page(&mut self, page: u32) -> GatewayResult<()> {
        self.pagination.set_page(page);
        self.load().await
    }
}
