//! Pagination helper types for repository queries

use serde::{Deserialize, Serialize};

/// Limit/offset pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of items to return
    pub limit: u32,
    /// Number of items to skip
    pub offset: u32,
}

impl PageRequest {
    /// Create a new page request
    ///
    /// # Examples
    ///
    /// ```
    /// use core_catalog::repositories::PageRequest;
    ///
    /// let request = PageRequest::new(20, 40);
    /// assert_eq!(request.limit, 20);
    /// assert_eq!(request.offset, 40);
    /// ```
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// First page with the given size
    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }

    /// The request for the page after this one
    pub fn next(&self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset + self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

/// Paginated response containing items and metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in the current window
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: u64,
    /// Limit the window was requested with
    pub limit: u32,
    /// Offset the window starts at
    pub offset: u32,
}

impl<T> Page<T> {
    /// Create a new paginated response
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            limit: request.limit,
            offset: request.offset,
        }
    }

    /// Check if there are more items after this window
    pub fn has_more(&self) -> bool {
        (self.offset as u64) + (self.items.len() as u64) < self.total
    }

    /// Map the items to a different type
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_default() {
        let request = PageRequest::default();
        assert_eq!(request.limit, 50);
        assert_eq!(request.offset, 0);
    }

    #[test]
    fn test_page_request_next() {
        let request = PageRequest::new(20, 0);
        let next = request.next();
        assert_eq!(next.limit, 20);
        assert_eq!(next.offset, 20);
    }

    #[test]
    fn test_page_new() {
        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(10, 0));
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total, 25);
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_page_has_more() {
        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(3, 0));
        assert!(page.has_more());

        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(3, 22));
        assert!(!page.has_more());

        let page = Page::new(Vec::<i32>::new(), 0, PageRequest::default());
        assert!(!page.has_more());
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(10, 0));
        let mapped = page.map(|x| x * 2);

        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.total, 25);
        assert_eq!(mapped.limit, 10);
    }
}
