use std::borrow::Cow;

/// Escape text content: `&`, `<` and `>`.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    escape(text, false)
}

/// Escape an attribute value: `"`, `&`, `<` and `>`.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    escape(value, true)
}

fn escape(input: &str, quotes: bool) -> Cow<'_, str> {
    let needs_escape = |ch: char| matches!(ch, '&' | '<' | '>') || (quotes && ch == '"');

    let Some(first) = input.find(needs_escape) else {
        return Cow::Borrowed(input);
    };

    let mut escaped = String::with_capacity(input.len() + 8);
    escaped.push_str(&input[..first]);
    for ch in input[first..].chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if quotes => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(escape_text("hello world"), Cow::Borrowed(_)));
        assert!(matches!(escape_attribute("UTF-8"), Cow::Borrowed(_)));
    }

    #[test]
    fn text_leaves_quotes_alone() {
        assert_eq!(
            escape_text(r#"a < b && "c" > d"#),
            r#"a &lt; b &amp;&amp; "c" &gt; d"#
        );
    }

    #[test]
    fn attributes_escape_quotes() {
        assert_eq!(
            escape_attribute(r#"say "hi" & <go>"#),
            "say &quot;hi&quot; &amp; &lt;go&gt;"
        );
    }

    #[test]
    fn existing_entities_are_escaped_once() {
        assert_eq!(escape_text("&amp;"), "&amp;amp;");
        assert_eq!(escape_attribute("&quot;"), "&amp;quot;");
    }

    #[test]
    fn multibyte_text_survives() {
        assert_eq!(escape_text("ü<ß>"), "ü&lt;ß&gt;");
    }
}
