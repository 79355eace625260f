//! Server configuration, request context and URL/path mapping.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;

use crate::params::split_search_params;

/// URL prefix under which files above the root directory are served.
///
/// The segment after the prefix counts how many directories to climb from the
/// root: `/__rna_outside_root__/2/shared/x.js` maps to `<root>/../../shared/x.js`.
pub const OUTSIDE_ROOT_PREFIX: &str = "/__rna_outside_root__/";

/// Settings captured once when the host server starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Directory served at `/`.
    pub root_dir: PathBuf,
    pub hostname: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            hostname: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// The request a hook is asked about.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Request URL including the query string.
    pub url: String,
    /// Decoded URL path without the query string.
    pub path: String,
    /// Response body produced so far, if any.
    pub body: Option<String>,
}

impl RequestContext {
    /// Context for `url` with no body yet.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let (path, _) = split_search_params(&url);
        let path = decode_path(&path).into_owned();
        Self {
            url,
            path,
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

fn decode_path(path: &str) -> Cow<'_, str> {
    urlencoding::decode(path).unwrap_or(Cow::Borrowed(path))
}

/// Absolute file path addressed by a request URL.
pub fn request_file_path(url: &str, root_dir: &Path) -> PathBuf {
    let (path, _) = split_search_params(url);
    let path = decode_path(&path);

    if let Some(rest) = path.strip_prefix(OUTSIDE_ROOT_PREFIX) {
        let (depth, tail) = rest.split_once('/').unwrap_or((rest, ""));
        if let Ok(depth) = depth.parse::<usize>() {
            // Climbing past the filesystem root changes nothing.
            let depth = depth.min(root_dir.components().count());
            let mut base = root_dir.to_path_buf();
            for _ in 0..depth {
                base.push("..");
            }
            return base.join(tail).clean();
        }
    }

    root_dir.join(path.trim_start_matches('/')).clean()
}

/// Whether an import already points outside the root directory.
pub fn is_outside_root_dir(import_path: &str) -> bool {
    import_path.starts_with(OUTSIDE_ROOT_PREFIX)
}

/// Import specifier the browser can use to load `path` from `importer`.
///
/// Files under the root get a relative specifier (`./x.js`, `../y.js`); files
/// outside it get an absolute outside-root URL.
pub fn resolve_relative_import(path: &Path, importer: &Path, root_dir: &Path) -> String {
    let path = path.clean();
    let root_dir = root_dir.clean();

    if !path.starts_with(&root_dir) {
        return outside_root_url(&path, &root_dir);
    }

    let importer = importer.clean();
    if !importer.starts_with(&root_dir) {
        return format!("/{}", to_url_path(&relative_path(&root_dir, &path)));
    }

    let base = importer.parent().unwrap_or(&root_dir);
    let relative = to_url_path(&relative_path(base, &path));
    if relative.starts_with("../") {
        relative
    } else {
        format!("./{relative}")
    }
}

fn outside_root_url(path: &Path, root_dir: &Path) -> String {
    let root: Vec<Component<'_>> = root_dir.components().collect();
    let target: Vec<Component<'_>> = path.components().collect();
    let common = root
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let depth = root.len() - common;
    let rest: PathBuf = target[common..].iter().collect();
    format!("{OUTSIDE_ROOT_PREFIX}{depth}/{}", to_url_path(&rest))
}

/// Relative path from directory `from` to `to`. Both must be absolute and clean.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component.as_os_str());
    }
    relative
}

/// Join path components with `/`, whatever the host separator.
pub fn to_url_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            Component::ParentDir => Some(Cow::Borrowed("..")),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
