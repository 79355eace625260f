//! Classic-runtime JSX pragmas derived from [`JsxOptions`].

use rna_plugin::{JsxOptions, Loader};

/// Pragma comments, plus the factory import when a module is configured.
///
/// `None` when no factory or module is set, leaving the compiler defaults.
pub fn jsx_prelude(jsx: &JsxOptions) -> Option<String> {
    if jsx.factory.is_none() && jsx.module.is_none() {
        return None;
    }

    let mut prelude = String::from("/** @jsxRuntime classic */\n");
    if let Some(factory) = &jsx.factory {
        prelude.push_str(&format!("/** @jsx {factory} */\n"));
    }
    if let Some(fragment) = &jsx.fragment {
        prelude.push_str(&format!("/** @jsxFrag {fragment} */\n"));
    }
    if let Some(import) = jsx.import_statement() {
        prelude.push_str(&import);
        prelude.push('\n');
    }
    Some(prelude)
}

pub fn accepts_jsx(loader: Loader) -> bool {
    matches!(loader, Loader::Jsx | Loader::Tsx)
}
