//! Identifier sanitizing
//!
//! Every node ID is assembled from tokens produced here, so this is the only
//! place that decides which characters survive.

/// Sanitizes label text into an identifier token, keeping forward slashes.
///
/// Shorthand for `sanitize_with(text, true)`.
pub fn sanitize(text: &str) -> String {
    sanitize_with(text, true)
}

/// Sanitizes label text into an identifier token.
///
/// The text is lowercased, `?` and every character outside
/// `[a-z0-9_\s/]` (or `[a-z0-9_\s]` without slashes) is dropped, whitespace
/// runs collapse to a single underscore and leading/trailing underscores are
/// trimmed. Empty input yields an empty string.
pub fn sanitize_with(text: &str, preserve_slashes: bool) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;

    for ch in lowered.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }

        let keep = ch.is_ascii_lowercase()
            || ch.is_ascii_digit()
            || ch == '_'
            || (preserve_slashes && ch == '/');
        if !keep {
            continue;
        }

        if pending_space {
            out.push('_');
            pending_space = false;
        }
        out.push(ch);
    }

    out.trim_matches('_').to_string()
}

/// Removes one trailing file extension (`intake.pdf` -> `intake`).
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => {
            let ext = &name[dot + 1..];
            if ext.is_empty() || ext.contains('/') {
                name
            } else {
                &name[..dot]
            }
        }
        None => name,
    }
}

/// Normalizes a PDF file name: extension stripped, lowercased, every
/// non-alphanumeric character replaced by an underscore.
///
/// Slashes are not preserved here.
pub fn sanitize_pdf_name(name: &str) -> String {
    strip_extension(name)
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect()
}
