//! Web worker construction rewriting.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static WORKER_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"new\s+(Shared)?Worker\(\s*new\s+URL\(\s*(["'][^"']+["'])\s*,\s*import\.meta\.url\s*\)"#,
    )
    .expect("valid worker pattern")
});

/// Route `new Worker(new URL('./w.js', import.meta.url))` through a same-origin
/// blob that imports the worker module, so cross-origin module hosts still work.
pub fn proxy_workers(code: &str) -> Option<String> {
    if !WORKER_URL.is_match(code) {
        return None;
    }
    let rewritten = WORKER_URL.replace_all(code, |caps: &Captures<'_>| {
        let shared = caps.get(1).map_or("", |m| m.as_str());
        let url = &caps[2];
        format!(
            "new {shared}Worker(URL.createObjectURL(new Blob([\
             'import ' + JSON.stringify(new URL({url}, import.meta.url).href) + ';'\
             ], {{ type: 'text/javascript' }}))"
        )
    });
    Some(rewritten.into_owned())
}
