//! Handling tags carried in module URL query strings.
//!
//! A module URL may already carry arbitrary parameters (cache busters, framework
//! flags, ...). The helpers here add, read and strip the `emit` and `loader`
//! tags without disturbing anything else: untouched parameters are written
//! back exactly as they arrived, in their original order.
//!
//! # Example
//!
//! ```
//! use rna_plugin::params::{append_search_param, get_search_param, remove_search_param};
//!
//! let url = append_search_param("/src/app.css?v=3", "loader", "css");
//! assert_eq!(url, "/src/app.css?v=3&loader=css");
//! assert_eq!(get_search_param(&url, "loader").as_deref(), Some("css"));
//! assert_eq!(remove_search_param(&url, "loader"), "/src/app.css?v=3");
//! ```

use std::borrow::Cow;
use std::fmt;

/// Query parameter telling the server how an asset should be emitted.
pub const EMIT_PARAM: &str = "emit";

/// Query parameter telling the server which loader handles the module.
pub const LOADER_PARAM: &str = "loader";

/// `emit` value for plain file assets.
pub const EMIT_FILE: &str = "file";

/// `emit` value for separately emitted chunks.
pub const EMIT_CHUNK: &str = "chunk";

/// `loader` value for stylesheets imported as modules.
pub const LOADER_CSS: &str = "css";

/// `loader` value for JSON imported as a module.
pub const LOADER_JSON: &str = "json";

/// `loader` value for arbitrary files imported by URL.
pub const LOADER_FILE: &str = "file";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pair {
    raw: String,
    key: String,
    value: String,
}

impl Pair {
    fn parse(segment: &str) -> Self {
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        Self {
            raw: segment.to_string(),
            key: decode_component(key),
            value: decode_component(value),
        }
    }

    fn encoded(key: &str, value: &str) -> Self {
        Self {
            raw: format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ),
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    // Malformed escapes are kept literally
    let decoded = urlencoding::decode(&spaced).map(Cow::into_owned);
    decoded.unwrap_or(spaced)
}

/// Ordered query parameters of a module URL.
///
/// Lookups operate on decoded keys and values. Serialization reuses the raw text
/// of every parameter that was never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<Pair>,
}

impl SearchParams {
    /// Parse a query string, with or without its leading `?`.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = query
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(Pair::parse)
            .collect();
        Self { pairs }
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|pair| pair.key == key)
            .map(|pair| pair.value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|pair| pair.key == key)
    }

    /// Set `key` to `value`.
    ///
    /// The first existing occurrence is replaced in place and any later
    /// duplicates are dropped; a missing key is appended at the end.
    pub fn set(&mut self, key: &str, value: &str) {
        let replacement = Pair::encoded(key, value);
        match self.pairs.iter().position(|pair| pair.key == key) {
            Some(index) => {
                self.pairs[index] = replacement;
                let mut position = 0;
                self.pairs.retain(|pair| {
                    let keep = position <= index || pair.key != key;
                    position += 1;
                    keep
                });
            }
            None => self.pairs.push(replacement),
        }
    }

    /// Remove every occurrence of `key`. Returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|pair| pair.key != key);
        self.pairs.len() != before
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Decoded `(key, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|pair| (pair.key.as_str(), pair.value.as_str()))
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, pair) in self.pairs.iter().enumerate() {
            if index > 0 {
                f.write_str("&")?;
            }
            f.write_str(&pair.raw)?;
        }
        Ok(())
    }
}

/// A module URL split into path, query parameters and fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleUrl {
    pub path: String,
    pub params: SearchParams,
    /// Fragment including its leading `#`, if any.
    pub fragment: Option<String>,
}

impl ModuleUrl {
    pub fn parse(url: &str) -> Self {
        let (rest, fragment) = match url.find('#') {
            Some(index) => (&url[..index], Some(url[index..].to_string())),
            None => (url, None),
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        Self {
            path: path.to_string(),
            params: SearchParams::parse(query),
            fragment,
        }
    }
}

impl fmt::Display for ModuleUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.params.is_empty() {
            write!(f, "?{}", self.params)?;
        }
        if let Some(fragment) = &self.fragment {
            f.write_str(fragment)?;
        }
        Ok(())
    }
}

/// Split `url` into its path and query parameters. The fragment is dropped.
pub fn split_search_params(url: &str) -> (String, SearchParams) {
    let ModuleUrl { path, params, .. } = ModuleUrl::parse(url);
    (path, params)
}

/// Read a single query parameter from `url`.
pub fn get_search_param(url: &str, key: &str) -> Option<String> {
    ModuleUrl::parse(url).params.get(key).map(str::to_string)
}

/// Set `key=value` on `url`, replacing any previous value.
pub fn append_search_param(url: &str, key: &str, value: &str) -> String {
    let mut parsed = ModuleUrl::parse(url);
    parsed.params.set(key, value);
    parsed.to_string()
}

/// Strip `key` from `url`. Returns `url` unchanged when the key is absent.
pub fn remove_search_param(url: &str, key: &str) -> String {
    let mut parsed = ModuleUrl::parse(url);
    if parsed.params.remove(key) {
        parsed.to_string()
    } else {
        url.to_string()
    }
}

/// Tag `url` as a stylesheet to be imported as a module.
pub fn append_css_module_param(url: &str) -> String {
    append_search_param(url, LOADER_PARAM, LOADER_CSS)
}

/// Tag `url` as JSON to be imported as a module.
pub fn append_json_module_param(url: &str) -> String {
    append_search_param(url, LOADER_PARAM, LOADER_JSON)
}

/// Tag `url` as a file asset to be imported by URL.
pub fn append_file_param(url: &str) -> String {
    append_search_param(url, LOADER_PARAM, LOADER_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_reads_value_among_unrelated_params() {
        let url = "/a.js?x=1&loader=css&y=2";
        assert_eq!(get_search_param(url, "loader").as_deref(), Some("css"));
        assert_eq!(get_search_param(url, "emit"), None);
    }

    #[test]
    fn append_adds_question_mark_when_needed() {
        assert_eq!(append_search_param("/a.png", "emit", "file"), "/a.png?emit=file");
        assert_eq!(
            append_search_param("/a.png?v=1", "emit", "file"),
            "/a.png?v=1&emit=file"
        );
    }

    #[test]
    fn append_replaces_instead_of_duplicating() {
        let once = append_search_param("/a.css", "loader", "css");
        let twice = append_search_param(&once, "loader", "css");
        assert_eq!(once, twice);

        let replaced = append_search_param("/a.css?loader=file&b=2&loader=x", "loader", "css");
        assert_eq!(replaced, "/a.css?loader=css&b=2");
    }

    #[test]
    fn get_returns_appended_value_for_any_url() {
        for url in ["/m.js", "/m.js?", "/m.js?a=%20b&c", "/m.js?loader=json#top", "m?x=y+z"] {
            let tagged = append_search_param(url, LOADER_PARAM, LOADER_FILE);
            assert_eq!(
                get_search_param(&tagged, LOADER_PARAM).as_deref(),
                Some(LOADER_FILE),
                "url: {url}"
            );
        }
    }

    #[test]
    fn remove_is_noop_when_absent() {
        assert_eq!(remove_search_param("/a.js?b=%41", "loader"), "/a.js?b=%41");
        assert_eq!(remove_search_param("/a.js", "loader"), "/a.js");
    }

    #[test]
    fn remove_drops_trailing_question_mark() {
        assert_eq!(remove_search_param("/a.css?loader=css", "loader"), "/a.css");
        assert_eq!(
            remove_search_param("/a.css?loader=css#frag", "loader"),
            "/a.css#frag"
        );
    }

    #[test]
    fn unrelated_params_keep_raw_encoding_and_order() {
        let url = "/a.svg?z=%2F&emit=file&a=1+2&flag";
        let stripped = remove_search_param(url, EMIT_PARAM);
        assert_eq!(stripped, "/a.svg?z=%2F&a=1+2&flag");
    }

    #[test]
    fn split_decodes_values() {
        let (path, params) = split_search_params("/x/y.js?name=a%20b&plus=c+d&empty#h");
        assert_eq!(path, "/x/y.js");
        assert_eq!(params.get("name"), Some("a b"));
        assert_eq!(params.get("plus"), Some("c d"));
        assert_eq!(params.get("empty"), Some(""));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn malformed_escape_is_kept_literally() {
        assert_eq!(get_search_param("/a?k=%zz", "k").as_deref(), Some("%zz"));
    }

    #[test]
    fn encoded_values_round_trip() {
        let url = append_search_param("/a.js", "label", "a&b=c d");
        assert_eq!(url, "/a.js?label=a%26b%3Dc%20d");
        assert_eq!(get_search_param(&url, "label").as_deref(), Some("a&b=c d"));
    }

    #[test]
    fn typed_helpers_set_loader() {
        assert_eq!(append_css_module_param("/s.css"), "/s.css?loader=css");
        assert_eq!(append_json_module_param("/d.json"), "/d.json?loader=json");
        assert_eq!(append_file_param("/i.png"), "/i.png?loader=file");
    }
}
