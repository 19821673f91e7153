//! Text sanitizing for anything a submitter typed before it lands in an HTML body.

/// Max characters of a submitter name shown in an email.
pub const NAME_MAX: usize = 75;
/// Max characters of a project description shown in an email.
pub const DESCRIPTION_MAX: usize = 200;
/// Max characters of a free-text message shown in the admin notification.
pub const MESSAGE_MAX: usize = 1000;

/// Cut `text` down to `max` characters and append `...` when it was longer.
///
/// Counts `char`s, not bytes, so multi-byte input never splits a code point.
/// Whitespace left dangling at the cut is trimmed before the ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => {
            let mut out = text[..cut].trim_end().to_string();
            out.push_str("...");
            out
        }
    }
}

/// Escape the five HTML metacharacters.
///
/// `&` goes first so entities produced by the later replacements are not escaped twice.
/// Also registered as the handlebars escape function, see [`crate::render`].
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate("Jane", 75), "Jane");
        assert_eq!(truncate("", 10), "");
        assert_eq!(truncate("exact", 5), "exact");
    }

    #[test]
    fn long_text_is_cut_with_ellipsis() {
        let out = truncate("abcdefghij", 4);
        assert_eq!(out, "abcd...");
    }

    #[test]
    fn trailing_whitespace_at_cut_is_trimmed() {
        assert_eq!(truncate("hello world", 6), "hello...");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let out = truncate("ééééé", 2);
        assert_eq!(out, "éé...");
    }

    #[test]
    fn truncated_length_is_bounded() {
        let text = "lorem ipsum dolor sit amet ".repeat(20);
        for max in [0, 1, 7, 50, 200, 1000] {
            let out = truncate(&text, max);
            assert!(out.chars().count() <= max + 3, "max={max}");
            if out != text {
                assert!(out.ends_with("..."));
            }
        }
    }

    #[test]
    fn escapes_all_metacharacters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn ampersand_is_escaped_once() {
        assert_eq!(escape_html("<"), "&lt;");
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn escaped_output_has_no_raw_specials() {
        let out = escape_html("<script>alert(\"x\" + 'y')</script> & more");
        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert!(!out.contains('"'));
        assert!(!out.contains('\''));
        for (i, _) in out.match_indices('&') {
            let rest = &out[i..];
            assert!(
                ["&amp;", "&lt;", "&gt;", "&quot;", "&#039;"]
                    .iter()
                    .any(|e| rest.starts_with(e))
            );
        }
    }
}
