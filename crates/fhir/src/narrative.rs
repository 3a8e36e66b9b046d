//! Generated XHTML narrative.
//!
//! Free text supplied by the caller is escaped and wrapped in the XHTML `div` that FHIR requires
//! for `Narrative.div`. No other formatting is applied.

use crate::datatypes::Narrative;

/// XHTML namespace required on the root `div`.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Narrative status for text produced by this crate.
pub const GENERATED: &str = "generated";

/// Wraps `text` in a single-paragraph XHTML `div` with `status: generated`.
pub fn xhtml_div(text: &str) -> Narrative {
    Narrative {
        status: GENERATED.to_string(),
        div: format!(
            r#"<div xmlns="{XHTML_NAMESPACE}"><p>{}</p></div>"#,
            escape(text)
        ),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
