//! Markdown code-fence stripping for model replies.
//!
//! Vision models like to wrap JSON in a fenced block, with or without a
//! language tag. Only the first complete block is considered.

const FENCE: &str = "```";

/// Content of the first complete fenced block, without its language tag.
///
/// Returns `None` when the text has no fence or the first fence never closes.
pub fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let after = &text[open + FENCE.len()..];
    let close = after.find(FENCE)?;
    Some(strip_info_string(&after[..close]))
}

/// The text worth parsing: the fenced content when well-formed, the whole reply otherwise.
pub fn strip_code_fence(text: &str) -> &str {
    fenced_block(text).unwrap_or(text).trim()
}

/// Drop a leading language tag such as `json` or `JSON` from a block body.
fn strip_info_string(block: &str) -> &str {
    let rest = block.trim_start_matches([' ', '\t']);
    let starts_alpha = rest.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '.')))
        .unwrap_or(rest.len());

    if starts_alpha && rest[tag_len..].starts_with(char::is_whitespace) {
        &rest[tag_len..]
    } else {
        block
    }
}
