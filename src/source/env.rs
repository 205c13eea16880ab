//! Environment-variable source.

/// Direct lookup: the variable named `UPPER(name)`, no prefix.
pub(super) fn read(name: &str) -> Option<String> {
    std::env::var(name.to_uppercase()).ok()
}

/// Bulk scan: variables starting with `prefix`, keyed by the stripped,
/// lowercased remainder. Empty remainders are discarded.
pub(super) fn scan(prefix: &str) -> Vec<(String, String)> {
    std::env::vars()
        .filter_map(|(key, value)| {
            let rest = key.strip_prefix(prefix)?;
            if rest.is_empty() {
                return None;
            }
            Some((rest.to_lowercase(), value))
        })
        .collect()
}
