//! Replacement module bodies for requests answered without compiling.

use crate::params::{EMIT_PARAM, LOADER_PARAM, remove_search_param};

/// Escape `value` for a single-quoted JavaScript string literal.
fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out
}

/// Script that injects the stylesheet at `url` into the document head.
///
/// The `loader` tag is removed so the browser fetches the raw stylesheet.
pub fn css_module_source(url: &str) -> String {
    let href = remove_search_param(url, LOADER_PARAM);
    format!(
        "var link = document.createElement('link');\n\
         link.rel = 'stylesheet';\n\
         link.href = '{}';\n\
         document.head.appendChild(link);\n",
        quote_literal(&href)
    )
}

/// Module whose default export is the absolute URL of the asset at `url`.
///
/// `url` is resolved against the module's own URL, which is the asset's URL
/// with its tags, so it is usually the bare file name. Both handling tags are
/// stripped.
pub fn file_module_source(url: &str) -> String {
    let source = remove_search_param(url, EMIT_PARAM);
    let source = remove_search_param(&source, LOADER_PARAM);
    format!(
        "export default new URL('{}', import.meta.url).href;",
        quote_literal(&source)
    )
}
