//! Pagination utilities for service layer
//!
//! Provides a simple `Pagination` struct and helpers to normalize inputs.

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    /// Clamp to sane defaults and convert to `u64`
    pub fn normalize(self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, 100);
        ((page - 1) as u64, per_page as u64)
    }

    /// Apply to an in-memory, already ordered list.
    pub fn slice<T: Clone>(self, items: &[T]) -> Vec<T> {
        let (idx, per) = self.normalize();
        items.iter().skip((idx * per) as usize).take(per as usize).cloned().collect()
    }
}

/// One page of results plus the total across all pages.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, p: Pagination) -> Self {
        let (idx, per) = p.normalize();
        Self { items, total, page: idx as u32 + 1, per_page: per as u32 }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page { items: self.items.into_iter().map(f).collect(), total: self.total, page: self.page, per_page: self.per_page }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page { items: self.items.into_iter().map(f).collect::<Result<_, _>>()?, total: self.total, page: self.page, per_page: self.per_page })
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}
