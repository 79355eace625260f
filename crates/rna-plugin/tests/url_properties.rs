//! Property-based tests for the URL tag codec using proptest.
//!
//! Tags must survive any query string a module URL may already carry:
//! duplicates, percent-encoded keys, `+` spaces and fragments.

use proptest::prelude::*;
use rna_plugin::classify::{
    classify_request, is_css_module_request, is_file_request, is_json_module_request,
};
use rna_plugin::params::{
    EMIT_PARAM, LOADER_PARAM, ModuleUrl, append_search_param, get_search_param,
    remove_search_param,
};

/// Raw query keys, including encoded spellings of the reserved ones.
fn raw_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("loader".to_string()),
        Just("emit".to_string()),
        Just("%6Coader".to_string()),
        Just("a+b".to_string()),
        Just("x%20y".to_string()),
        "[a-z]{1,5}",
    ]
}

fn raw_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("css".to_string()),
        Just("json".to_string()),
        Just("file".to_string()),
        Just("chunk".to_string()),
        Just("%2F%20".to_string()),
        "[a-zA-Z0-9._+-]{0,6}",
    ]
}

/// Module URLs with arbitrary existing parameters and an optional fragment.
fn module_url() -> impl Strategy<Value = String> {
    (
        "/?[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.(js|ts|css|json|png)",
        prop::collection::vec((raw_key(), prop::option::of(raw_value())), 0..6),
        prop::bool::ANY,
        prop::option::of("[a-z]{0,5}"),
    )
        .prop_map(|(path, params, bare_question_mark, fragment)| {
            let query = params
                .iter()
                .map(|(key, value)| match value {
                    Some(value) => format!("{key}={value}"),
                    None => key.clone(),
                })
                .collect::<Vec<_>>()
                .join("&");
            let mut url = path;
            if !query.is_empty() || bare_question_mark {
                url.push('?');
                url.push_str(&query);
            }
            if let Some(fragment) = fragment {
                url.push('#');
                url.push_str(&fragment);
            }
            url
        })
}

/// Decoded keys to set, overlapping the raw keys above.
fn tag_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(LOADER_PARAM.to_string()),
        Just(EMIT_PARAM.to_string()),
        Just("a b".to_string()),
        Just("x y".to_string()),
        "[a-z]{1,5}",
    ]
}

fn classify(url: &str) -> (bool, bool, bool, String) {
    let path = ModuleUrl::parse(url).path;
    (
        is_file_request(url),
        is_css_module_request(url),
        is_json_module_request(url),
        format!("{:?}", classify_request(url, &path)),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: get(append(U, K, V), K) == V
    #[test]
    fn appended_value_is_read_back(
        url in module_url(),
        key in tag_key(),
        value in "\\PC{0,10}",
    ) {
        let tagged = append_search_param(&url, &key, &value);
        prop_assert_eq!(get_search_param(&tagged, &key), Some(value));
    }

    /// Property: appending twice equals appending once
    #[test]
    fn append_is_idempotent(url in module_url(), key in tag_key(), value in "[a-z]{0,5}") {
        let once = append_search_param(&url, &key, &value);
        prop_assert_eq!(append_search_param(&once, &key, &value), once);
    }

    /// Property: remove(append(U, K, V), K) classifies like U for predicates
    /// that do not read K
    #[test]
    fn remove_after_append_restores_classification(
        url in module_url(),
        key in tag_key(),
        value in raw_value(),
    ) {
        let restored = remove_search_param(&append_search_param(&url, &key, &value), &key);
        prop_assert_eq!(get_search_param(&restored, &key), None);

        if key == LOADER_PARAM {
            prop_assert_eq!(
                get_search_param(&restored, EMIT_PARAM),
                get_search_param(&url, EMIT_PARAM)
            );
            prop_assert!(!is_css_module_request(&restored));
            prop_assert!(!is_json_module_request(&restored));
        } else if key == EMIT_PARAM {
            prop_assert_eq!(is_css_module_request(&restored), is_css_module_request(&url));
            prop_assert_eq!(is_json_module_request(&restored), is_json_module_request(&url));
        } else {
            prop_assert_eq!(classify(&restored), classify(&url));
        }
    }

    /// Property: unrelated parameters keep their decoded values
    #[test]
    fn unrelated_params_survive_tagging(url in module_url(), value in raw_value()) {
        let tagged = append_search_param(&url, LOADER_PARAM, &value);
        let before = ModuleUrl::parse(&url);
        let after = ModuleUrl::parse(&tagged);

        let unrelated = |params: &rna_plugin::params::SearchParams| {
            params
                .iter()
                .filter(|(key, _)| *key != LOADER_PARAM)
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(unrelated(&after.params), unrelated(&before.params));
        prop_assert_eq!(after.path, before.path);
        prop_assert_eq!(after.fragment, before.fragment);
    }
}
