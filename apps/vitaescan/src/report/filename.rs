/// Product tag prefixed to every report filename.
pub const FILENAME_PREFIX: &str = "VitaeScan_";
/// Maximum characters kept from the sanitized title.
pub const MAX_TITLE_CHARS: usize = 20;

/// Keeps only ASCII letters and digits, then truncates to 20 characters.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_TITLE_CHARS)
        .collect()
}

/// `VitaeScan_<sanitized title>.pdf`
pub fn report_filename(title: &str) -> String {
    format!("{FILENAME_PREFIX}{}.pdf", sanitize_title(title))
}
