/// Paginated result wrapper
#[derive(Debug)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = ((total as f64) / (limit.max(1) as f64)).ceil() as u32;
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Normalise a 1-based page / limit pair into `(page, limit, offset)`.
pub fn page_window(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> (u32, u32, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).clamp(1, 100);
    let offset = (page as u64 - 1) * limit as u64;
    (page, limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let r: PaginatedResult<()> = PaginatedResult::new(vec![], 21, 1, 10);
        assert_eq!(r.total_pages, 3);
        assert!(r.has_next());
        assert!(!r.has_prev());
    }

    #[test]
    fn page_window_clamps() {
        assert_eq!(page_window(None, None, 10), (1, 10, 0));
        assert_eq!(page_window(Some(0), Some(500), 10), (1, 100, 0));
        assert_eq!(page_window(Some(3), Some(20), 10), (3, 20, 40));
    }
}
