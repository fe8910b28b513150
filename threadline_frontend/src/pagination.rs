pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// "Load more" is offered whenever the reported total reaches the page size.
pub fn has_more(total: u64, limit: u32) -> bool {
    total >= u64::from(limit)
}

pub fn next_page(current: u32) -> u32 {
    current.saturating_add(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

impl Pagination {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            total: 0,
        }
    }

    pub fn has_more(&self) -> bool {
        has_more(self.total, self.limit)
    }

    pub fn next_page(&self) -> u32 {
        next_page(self.page)
    }

    /// Moves to the next page and returns it.
    pub fn advance(&mut self) -> u32 {
        self.page = self.next_page();
        self.page
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn reset(&mut self) {
        self.page = 1;
        self.total = 0;
    }

    /// Number of items covered by pages `1..=page`.
    pub fn loaded_span(&self) -> u32 {
        self.limit.saturating_mul(self.page)
    }

    /// Page count shown by the numbered paginator.
    pub fn page_count(&self) -> u64 {
        let limit = u64::from(self.limit);
        (self.total + limit / 2) / limit
    }
}
