/// Maximum length of a name derived from a URL
const MAX_NAME_LEN: usize = 100;

/// Convert a URL to a name usable as a single path component
pub fn sanitize_filename(url: &str) -> String {
    // Remove protocol and replace path, scheme and query separators
    let mut name = url.replace("http://", "").replace("https://", "");
    name = name.replace(['/', '\\', ':', '?', '&', '=', '#', '%'], "_");

    // Limit length on a char boundary
    match name.char_indices().nth(MAX_NAME_LEN) {
        Some((idx, _)) => name[..idx].to_string(),
        None => name,
    }
}
