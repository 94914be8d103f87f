use uuid::Uuid;

const MAX_REQUEST_ID_LEN: usize = 64;

/// Keeps a caller-supplied correlation id when it is short and made of
/// `[A-Za-z0-9_-]`, otherwise generates a fresh one.
pub(crate) fn normalize_request_id(raw: Option<&str>) -> String {
    let candidate = raw.map(str::trim).unwrap_or_default();
    let valid = !candidate.is_empty()
        && candidate.len() <= MAX_REQUEST_ID_LEN
        && candidate.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        candidate.to_string()
    } else {
        Uuid::new_v4().to_string()
    }
}
