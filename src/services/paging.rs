use serde::Serialize;

use crate::error::{ServiceError, ServiceResult};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// A validated `page`/`limit` pair. `offset()` cannot overflow once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: i64,
    pub limit: i64,
    offset: i64,
}

impl Paging {
    pub fn resolve(page: Option<i64>, limit: Option<i64>) -> ServiceResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);

        if page < 1 {
            return Err(ServiceError::validation("page must be at least 1"));
        }
        if limit < 1 {
            return Err(ServiceError::validation("limit must be at least 1"));
        }
        let limit = limit.min(MAX_PAGE_SIZE);

        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| ServiceError::validation("page is out of range"))?;

        Ok(Self {
            page,
            limit,
            offset,
        })
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(paging: Paging, total: i64, data: Vec<T>) -> Self {
        Self {
            total,
            page: paging.page,
            limit: paging.limit,
            total_pages: paging.total_pages(total),
            data,
        }
    }
}
