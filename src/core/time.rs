use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime, PrimitiveDateTime};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn format_offset(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

/// Oldest `archived_at` that is still inside the retention window at `now`.
pub(crate) fn retention_cutoff(now: PrimitiveDateTime, window: Duration) -> PrimitiveDateTime {
    now.checked_sub(window).unwrap_or(PrimitiveDateTime::MIN)
}

pub(crate) fn expires_at(archived_at: PrimitiveDateTime, window: Duration) -> PrimitiveDateTime {
    archived_at.checked_add(window).unwrap_or(PrimitiveDateTime::MAX)
}
