//! Stylesheet compilation with lightningcss.

use std::path::Path;
use std::sync::LazyLock;

use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use regex::Regex;
use rna_plugin::{EngineError, StyleImports};

static IMPORT_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@import\s+(?:url\(\s*)?["']([^"']+)["']"#).expect("valid @import pattern")
});

/// Rewrite every `@import` reference through [`StyleImports`].
pub async fn rewrite_style_imports(code: &str, path: &Path, style: &StyleImports) -> String {
    let mut out = String::with_capacity(code.len());
    let mut cursor = 0;
    for captures in IMPORT_RULE.captures_iter(code) {
        let Some(specifier) = captures.get(1) else {
            continue;
        };
        if let Some(rewritten) = style.rewrite(specifier.as_str(), path).await {
            out.push_str(&code[cursor..specifier.start()]);
            out.push_str(&rewritten);
            cursor = specifier.end();
        }
    }
    out.push_str(&code[cursor..]);
    out
}

/// Parse and print a stylesheet, normalising its syntax.
pub fn compile_stylesheet(code: &str, path: &Path) -> Result<String, EngineError> {
    let filename = path.to_string_lossy().to_string();
    let failed = |message: String| EngineError::Transform {
        path: path.to_path_buf(),
        message,
    };

    let stylesheet = StyleSheet::parse(
        code,
        ParserOptions {
            filename,
            ..Default::default()
        },
    )
    .map_err(|e| failed(format!("Failed to parse CSS: {e:?}")))?;

    let result = stylesheet
        .to_css(PrinterOptions::default())
        .map_err(|e| failed(format!("Failed to print CSS: {e:?}")))?;
    Ok(result.code)
}

/// Rewrite imports, then compile.
pub async fn transform_stylesheet(
    code: &str,
    path: &Path,
    style: Option<&StyleImports>,
) -> Result<String, EngineError> {
    let code = match style {
        Some(style) => rewrite_style_imports(code, path, style).await,
        None => code.to_string(),
    };
    compile_stylesheet(&code, path)
}
