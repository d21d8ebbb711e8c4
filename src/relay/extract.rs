use std::sync::LazyLock;

use regex::Regex;

// Opening fence, optional language tag plus newline, lazily-matched body.
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:\w*\n)?([\s\S]*?)```").expect("Invalid regex"));

/// Contents of the first fenced code block in `text`, trimmed.
///
/// Falls back to the whole text, trimmed, when there is no complete block.
///
/// ```
/// use prompt_relay::relay::extract_code;
///
/// assert_eq!(extract_code("Sure!\n```rust\nfn main() {}\n```\nBye"), "fn main() {}");
/// assert_eq!(extract_code("  no fences here \n"), "no fences here");
/// ```
pub fn extract_code(text: &str) -> String {
    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |body| body.as_str())
        .trim()
        .to_owned()
}
