//! Request classification.
//!
//! Every module request is sorted into exactly one [`RequestKind`] from its URL
//! tags and the extension of its path. The predicates are pure and cheap, so
//! hooks call them freely.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::params::{
    EMIT_CHUNK, EMIT_FILE, EMIT_PARAM, LOADER_CSS, LOADER_FILE, LOADER_JSON, LOADER_PARAM,
    ModuleUrl, split_search_params,
};

/// Prefix of helper modules served by the host itself.
pub const HELPER_PREFIX: &str = "/__rna__/";

/// npm package name, optionally scoped, with no subpath.
static BARE_MODULE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(@[a-z0-9-~][a-z0-9-._~]*/)?[a-z0-9-~][a-z0-9-._~]*$")
        .expect("bare module pattern is valid")
});

/// Source language used to compile a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
    Json,
    Css,
}

impl Loader {
    /// Loader for a file extension, without the leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "js" | "mjs" | "cjs" => Some(Loader::Js),
            "jsx" => Some(Loader::Jsx),
            "ts" | "mts" | "cts" => Some(Loader::Ts),
            "tsx" => Some(Loader::Tsx),
            "json" => Some(Loader::Json),
            "css" => Some(Loader::Css),
            _ => None,
        }
    }

    /// Loader for a path or URL; the query string is ignored.
    pub fn from_path(path: &str) -> Option<Self> {
        extension(path).and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Loader::Js => "js",
            Loader::Jsx => "jsx",
            Loader::Ts => "ts",
            Loader::Tsx => "tsx",
            Loader::Json => "json",
            Loader::Css => "css",
        }
    }

    /// Whether the loader produces executable script.
    pub fn is_script(&self) -> bool {
        matches!(self, Loader::Js | Loader::Jsx | Loader::Ts | Loader::Tsx)
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Asset referenced by URL (`emit=file|chunk` or `loader=file`).
    File,
    /// Stylesheet imported as a module (`loader=css`).
    CssModule,
    /// JSON imported as a module (`loader=json` on a `.json` path).
    JsonModule,
    /// Source compiled by the transform engine.
    Source(Loader),
    /// Left to the host's default handling.
    Passthrough,
}

impl RequestKind {
    /// Whether the response body is produced without reading the file.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, RequestKind::File | RequestKind::CssModule)
    }
}

/// Extension of the path part of `specifier`, lowercase-sensitive.
pub fn extension(specifier: &str) -> Option<&str> {
    let path = strip_query(specifier);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    Path::new(file_name).extension().and_then(|ext| ext.to_str())
}

fn strip_query(specifier: &str) -> &str {
    let end = specifier.find(['?', '#']).unwrap_or(specifier.len());
    &specifier[..end]
}

/// Whether the specifier points at a script the engine compiles.
pub fn is_js(specifier: &str) -> bool {
    Loader::from_path(specifier).is_some_and(|loader| loader.is_script())
}

pub fn is_json(specifier: &str) -> bool {
    extension(specifier) == Some("json")
}

pub fn is_css(specifier: &str) -> bool {
    extension(specifier) == Some("css")
}

/// `emit=file`, `emit=chunk` or `loader=file`.
pub fn is_file_request(url: &str) -> bool {
    let ModuleUrl { params, .. } = ModuleUrl::parse(url);
    matches!(params.get(EMIT_PARAM), Some(EMIT_FILE | EMIT_CHUNK))
        || params.get(LOADER_PARAM) == Some(LOADER_FILE)
}

pub fn is_css_module_request(url: &str) -> bool {
    let (_, params) = split_search_params(url);
    params.get(LOADER_PARAM) == Some(LOADER_CSS)
}

pub fn is_json_module_request(url: &str) -> bool {
    let (_, params) = split_search_params(url);
    params.get(LOADER_PARAM) == Some(LOADER_JSON)
}

/// Whether `name` is a bare package name such as `lodash` or `@scope/pkg`.
///
/// Relative and absolute paths, URLs, subpath imports and names with
/// uppercase letters are all rejected.
pub fn is_bare_module_source(name: &str) -> bool {
    BARE_MODULE_NAME.is_match(name)
}

/// Whether the path belongs to a helper module served by the host.
pub fn is_helper_import(path: &str) -> bool {
    path.starts_with(HELPER_PREFIX)
}

/// Classify a request from its URL and path.
pub fn classify_request(url: &str, path: &str) -> RequestKind {
    if is_file_request(url) {
        return RequestKind::File;
    }
    if is_css_module_request(url) {
        return RequestKind::CssModule;
    }
    match Loader::from_path(path) {
        None => RequestKind::Passthrough,
        Some(Loader::Json) if is_json_module_request(url) => RequestKind::JsonModule,
        Some(Loader::Json) => RequestKind::Passthrough,
        Some(loader) => RequestKind::Source(loader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_requests_need_a_tag() {
        assert!(is_file_request("x.png?emit=chunk"));
        assert!(is_file_request("x.png?emit=file"));
        assert!(is_file_request("x.svg?loader=file"));
        assert!(!is_file_request("x.png"));
        assert!(!is_file_request("x.png?emit=other"));
    }

    #[test]
    fn css_and_json_module_tags() {
        assert!(is_css_module_request("x.css?loader=css"));
        assert!(!is_css_module_request("x.css"));
        assert!(!is_json_module_request("x.json"));
        assert!(is_json_module_request("x.json?loader=json"));
    }

    #[test]
    fn bare_module_names() {
        for name in ["lodash", "@scope/pkg", "lit-html", "a.b_c~d"] {
            assert!(is_bare_module_source(name), "{name}");
        }
        for name in ["./local", "/abs/path", "http://x/y", "UPPER", "lodash/fp", "@scope", ""] {
            assert!(!is_bare_module_source(name), "{name}");
        }
    }

    #[test]
    fn loaders_by_extension() {
        assert_eq!(Loader::from_path("/a/b.mjs"), Some(Loader::Js));
        assert_eq!(Loader::from_path("/a/b.cts?x=1"), Some(Loader::Ts));
        assert_eq!(Loader::from_path("/a/b.tsx#x"), Some(Loader::Tsx));
        assert_eq!(Loader::from_path("/a/b.json"), Some(Loader::Json));
        assert_eq!(Loader::from_path("/a/b.png"), None);
        assert_eq!(Loader::from_path("/a.dir/b"), None);
    }

    #[test]
    fn extension_predicates_ignore_query() {
        assert!(is_js("./a.jsx?v=2"));
        assert!(is_css("./a.css?loader=css"));
        assert!(is_json("../data.json"));
        assert!(!is_js("./a.json"));
        assert!(!is_js("lodash"));
    }

    #[test]
    fn classification_precedence() {
        assert_eq!(classify_request("/a.css?loader=css", "/a.css"), RequestKind::CssModule);
        assert_eq!(classify_request("/a.css?emit=file", "/a.css"), RequestKind::File);
        assert_eq!(classify_request("/a.css", "/a.css"), RequestKind::Source(Loader::Css));
        assert_eq!(classify_request("/a.json", "/a.json"), RequestKind::Passthrough);
        assert_eq!(
            classify_request("/a.json?loader=json", "/a.json"),
            RequestKind::JsonModule
        );
        assert_eq!(classify_request("/a.ts", "/a.ts"), RequestKind::Source(Loader::Ts));
        assert_eq!(classify_request("/index.html", "/index.html"), RequestKind::Passthrough);
    }

    #[test]
    fn helper_imports() {
        assert!(is_helper_import("/__rna__/client.js"));
        assert!(!is_helper_import("/src/__rna__.js"));
    }
}
