// src/utils/html.rs

use std::collections::HashSet;

/// Sanitizes user-written rich text (article bodies, comments).
///
/// Keeps ammonia's default whitelist of formatting tags and drops scripts,
/// frames and event-handler attributes along with their content.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Strips every tag, keeping only the text. Used for titles and names.
pub fn strip_tags(input: &str) -> String {
    ammonia::Builder::default()
        .tags(HashSet::new())
        .clean(input)
        .to_string()
}
