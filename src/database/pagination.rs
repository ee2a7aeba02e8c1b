use serde::{Deserialize, Serialize};

use crate::{error::TypeError, form::QueryParams, MAX_COUNT_PER_PAGE};

#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub count: i64,
    pub next_offset: Option<i64>,
    pub prev_offset: Option<i64>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page: Page) -> Self {
        let next_offset = page.offset + page.limit;
        let next_offset = (next_offset < total_rows).then_some(next_offset);
        let prev_offset = (page.offset > 0).then(|| (page.offset - page.limit).max(0));

        Self {
            count: total_rows,
            next_offset,
            prev_offset,
            results: rows,
        }
    }

    pub fn no_rows() -> Self {
        Self {
            count: 0,
            next_offset: None,
            prev_offset: None,
            results: vec![],
        }
    }

    pub fn map<U, F>(self, f: F) -> PageContext<U>
    where
        F: FnMut(T) -> U,
    {
        PageContext {
            count: self.count,
            next_offset: self.next_offset,
            prev_offset: self.prev_offset,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// Limit/offset window requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>, default_limit: i64) -> Self {
        Self {
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_COUNT_PER_PAGE),
            offset: offset.unwrap_or(0).max(0),
        }
    }

    pub fn from_query(query: &QueryParams, default_limit: i64) -> Result<Self, TypeError> {
        Ok(Self::new(
            query.get_number("limit")?,
            query.get_number("offset")?,
            default_limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page() {
        let page = PageContext::from_rows(vec![1, 2, 3], 7, Page::new(Some(3), None, 6));

        assert_eq!(page.count, 7);
        assert_eq!(page.next_offset, Some(3));
        assert_eq!(page.prev_offset, None);
    }

    #[test]
    fn last_page() {
        let page = PageContext::from_rows(vec![7], 7, Page::new(Some(3), Some(6), 6));

        assert_eq!(page.next_offset, None);
        assert_eq!(page.prev_offset, Some(3));
    }

    #[test]
    fn page_past_the_end_keeps_the_total() {
        let page = PageContext::<i32>::from_rows(vec![], 2, Page::new(Some(6), Some(10), 6));

        assert_eq!(page.count, 2);
        assert_eq!(page.next_offset, None);
        assert_eq!(page.prev_offset, Some(4));
        assert!(page.results.is_empty());
    }

    #[test]
    fn empty_page() {
        let page = PageContext::<i32>::from_rows(vec![], 0, Page::new(None, None, 6));

        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
    }

    #[test]
    fn limits_are_clamped() {
        assert_eq!(
            Page::new(Some(0), Some(-5), 6),
            Page {
                limit: 1,
                offset: 0
            }
        );
        assert_eq!(Page::new(Some(10_000), None, 6).limit, MAX_COUNT_PER_PAGE);
        assert_eq!(Page::new(None, None, 6).limit, 6);
    }
}
