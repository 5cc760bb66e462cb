// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Token substitution over the embedded page template
//!
//! The calls page is a fixed HTML artifact carrying placeholder tokens:
//! comment markers like `<!--FC_ROWS-->` for injected blocks and bare
//! uppercase names like `FUNCTION_RANGE_START` inside value attributes.
//! Rendering is plain string substitution; every token occurs exactly once
//! in the template.

/// The monitoring/configuration page template, embedded at compile time.
pub const CALLS_TEMPLATE: &str = include_str!("../../resources/calls.html");

/// Replace each `(token, value)` pair in the template.
pub fn substitute(template: &str, values: &[(&str, String)]) -> String {
    let mut page = template.to_string();
    for (token, value) in values {
        page = page.replace(token, value);
    }
    page
}

/// Minimal HTML escaping for text rendered into the page.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_replaces_tokens() {
        let out = substitute(
            "<p>A_TOKEN</p><!--BLOCK-->",
            &[
                ("A_TOKEN", "hello".to_string()),
                ("<!--BLOCK-->", "<b>x</b>".to_string()),
            ],
        );
        assert_eq!(out, "<p>hello</p><b>x</b>");
    }

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(escape(r#"<b a="1">&"#), "&lt;b a=&quot;1&quot;&gt;&amp;");
    }
}
