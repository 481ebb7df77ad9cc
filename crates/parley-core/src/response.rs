//! Post-processing of generated replies.

/// Cuts a reply after its last complete sentence.
///
/// A sentence ends at `.`, `?`, or `!` followed by whitespace or the end of
/// the text. Text without such a mark is returned unchanged.
///
/// ```
/// use parley_core::response::trim_after_last_sentence;
///
/// assert_eq!(trim_after_last_sentence("Hello there. How are you"), "Hello there.");
/// assert_eq!(trim_after_last_sentence("Wait... really?!"), "Wait... really?!");
/// ```
pub fn trim_after_last_sentence(text: &str) -> &str {
    let mut chars = text.char_indices().peekable();
    let mut cut = None;

    while let Some((index, c)) = chars.next() {
        if matches!(c, '.' | '?' | '!') {
            let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
            if at_boundary {
                cut = Some(index + c.len_utf8());
            }
        }
    }

    match cut {
        Some(end) => &text[..end],
        None => text,
    }
}
