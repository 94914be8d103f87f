use serde::Serialize;

pub(crate) const MAX_LIMIT: i64 = 100;

pub(crate) const fn default_limit() -> i64 {
    10
}

/// Clamps caller paging to `offset >= 0` and `1..=MAX_LIMIT`.
pub(crate) fn clamp(offset: i64, limit: i64) -> (i64, i64) {
    (offset.max(0), limit.clamp(1, MAX_LIMIT))
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) offset: i64,
    pub(crate) limit: i64,
}
