// src/core/sanitize.rs

/// Collapse runs of whitespace (NBSP included) into single spaces and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Filesystem-safe stem: alphanumerics, `-` and `_`; whitespace collapses to `_`.
pub fn sanitize_stem(name: &str, fallback: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_us = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' { out.push(ch); last_us = false; }
        else if (ch.is_whitespace() || ch == '_') && !last_us { out.push('_'); last_us = true; }
    }
    let out = out.trim_matches('_').to_string();
    if out.is_empty() { s!(fallback) } else { out }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_ws_collapses_nbsp() {
        assert_eq!(normalize_ws("  3 days\u{a0}\n 4 hours "), "3 days 4 hours");
    }

    #[test]
    fn sanitize_stem_variants() {
        assert_eq!(sanitize_stem("Group A / 2025", "grp"), "Group_A_2025");
        assert_eq!(sanitize_stem("***", "grp"), "grp");
    }
}
