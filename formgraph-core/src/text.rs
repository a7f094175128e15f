//! Label and style string helpers

/// Strips HTML markup from a cell label for storage.
///
/// Tags are dropped, the common entities are decoded and whitespace is
/// collapsed to single spaces.
pub fn strip_html(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut in_tag = false;

    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => plain.push(ch),
            _ => {}
        }
    }

    let decoded = plain
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the label is a purely numeric value (e.g. `"3"`).
pub fn is_numeric_label(text: &str) -> bool {
    let trimmed = strip_html(text);
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

/// Looks up `key` in a `key=value;key2=value2;flag;` style string.
///
/// Bare flags (no `=`) report an empty value.
pub fn style_value<'a>(style: &'a str, key: &str) -> Option<&'a str> {
    style
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .find_map(|part| match part.split_once('=') {
            Some((k, v)) if k == key => Some(v),
            None if part == key => Some(""),
            _ => None,
        })
}

/// Returns `style` with `key` removed.
pub fn remove_style_key(style: &str, key: &str) -> String {
    let parts: Vec<&str> = style
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter(|part| part.split('=').next() != Some(key))
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!("{};", parts.join(";"))
    }
}

/// Returns `style` with `key` set to `value`, replacing any previous value.
pub fn set_style_value(style: &str, key: &str, value: &str) -> String {
    let mut updated = remove_style_key(style, key);
    updated.push_str(&format!("{}={};", key, value));
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<b>Main</b> Question"), "Main Question");
        assert_eq!(strip_html("<div>Tom&nbsp;&amp;&nbsp;Jerry</div>"), "Tom & Jerry");
        assert_eq!(strip_html("  plain   text "), "plain text");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_is_numeric_label() {
        assert!(is_numeric_label("3"));
        assert!(is_numeric_label(" 12 "));
        assert!(is_numeric_label("<span>7</span>"));
        assert!(!is_numeric_label("3a"));
        assert!(!is_numeric_label(""));
        assert!(!is_numeric_label("-1"));
    }

    #[test]
    fn test_style_helpers() {
        let style = "rounded=1;questionType=text;pdfNode;";
        assert_eq!(style_value(style, "rounded"), Some("1"));
        assert_eq!(style_value(style, "questionType"), Some("text"));
        assert_eq!(style_value(style, "pdfNode"), Some(""));
        assert_eq!(style_value(style, "missing"), None);

        let removed = remove_style_key(style, "questionType");
        assert_eq!(removed, "rounded=1;pdfNode;");

        let set = set_style_value(&removed, "questionType", "dropdown");
        assert_eq!(set, "rounded=1;pdfNode;questionType=dropdown;");
        assert_eq!(set_style_value("", "a", "b"), "a=b;");
    }
}
