use crate::SearchResult;

/// Only the first few hits make it into the prompt.
pub const MAX_CONTEXT_RESULTS: usize = 6;

/// Render search hits as the web-context block of the prompt.
///
/// Each hit becomes `- (<n>) <title>\n  <link>\n  <snippet>` with a 1-based
/// index; hits are separated by a newline. Missing fields render empty.
///
/// ```
/// use askweb_search::{SearchResult, format_web_context};
///
/// let hits = vec![SearchResult {
///     title: Some("France".into()),
///     link: Some("https://x".into()),
///     snippet: Some("Paris is the capital".into()),
/// }];
/// assert_eq!(
///     format_web_context(&hits),
///     "- (1) France\n  https://x\n  Paris is the capital"
/// );
/// assert_eq!(format_web_context(&[]), "");
/// ```
pub fn format_web_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .take(MAX_CONTEXT_RESULTS)
        .enumerate()
        .map(|(i, r)| {
            format!(
                "- ({}) {}\n  {}\n  {}",
                i + 1,
                r.title.as_deref().unwrap_or_default(),
                r.link.as_deref().unwrap_or_default(),
                r.snippet.as_deref().unwrap_or_default(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
