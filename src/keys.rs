//! Key Naming Scheme
//!
//! Every cache key is built here so that invalidation globs reliably match
//! every key of a resource class. Keys have the shape
//! `namespace:class:identifier[:locale]` with the namespaces below.

use serde_json::Value;

pub const DOC: &str = "doc";
pub const LIST: &str = "list";
pub const GLOBAL: &str = "global";
pub const API: &str = "api";
pub const MEDIA: &str = "media";

/// Serialization used for empty or null query parameters.
const ALL_PARAMS: &str = "all";

// == Document Keys ==
/// `doc:{class}:{id}[:{locale}]`
pub fn document_key(class: &str, id: &str, locale: Option<&str>) -> String {
    with_locale(format!("{}:{}:{}", DOC, class, id), locale)
}

/// `doc:{class}:slug:{slug}[:{locale}]`
pub fn document_by_slug_key(class: &str, slug: &str, locale: Option<&str>) -> String {
    with_locale(format!("{}:{}:slug:{}", DOC, class, slug), locale)
}

// == Query Keys ==
/// `list:{class}:{canonical(params)}`
///
/// Object keys are sorted at every level, so the same query built in a
/// different order yields the same key.
pub fn list_key(class: &str, params: &Value) -> String {
    format!("{}:{}:{}", LIST, class, canonical_params(params))
}

/// `api:{route}:{canonical(params)}`
pub fn api_key(route: &str, params: &Value) -> String {
    format!("{}:{}:{}", API, route, canonical_params(params))
}

// == Other Namespaces ==
/// `global:{name}[:{locale}]`
pub fn global_key(name: &str, locale: Option<&str>) -> String {
    with_locale(format!("{}:{}", GLOBAL, name), locale)
}

/// `media:{class}:{id}`
pub fn media_key(class: &str, id: &str) -> String {
    format!("{}:{}:{}", MEDIA, class, id)
}

// == Invalidation Patterns ==
/// Patterns covering one document in every locale.
pub fn document_patterns(class: &str, id: &str) -> Vec<String> {
    let base = format!("{}:{}:{}", DOC, class, id);
    vec![format!("{}:*", base), base]
}

/// Patterns covering one slug-keyed document in every locale.
pub fn slug_patterns(class: &str, slug: &str) -> Vec<String> {
    let base = format!("{}:{}:slug:{}", DOC, class, slug);
    vec![format!("{}:*", base), base]
}

/// Patterns covering every key of a resource class.
pub fn collection_patterns(class: &str) -> Vec<String> {
    vec![format!("*:{}:*", class), list_pattern(class)]
}

/// Pattern covering every cached query of a resource class.
pub fn list_pattern(class: &str) -> String {
    format!("{}:{}:*", LIST, class)
}

/// Patterns covering one global in every locale.
pub fn global_patterns(name: &str) -> Vec<String> {
    let base = format!("{}:{}", GLOBAL, name);
    vec![format!("{}:*", base), base]
}

/// Stable serialization of query parameters.
pub fn canonical_params(params: &Value) -> String {
    match params {
        Value::Null => ALL_PARAMS.to_string(),
        Value::Object(map) if map.is_empty() => ALL_PARAMS.to_string(),
        other => sorted(other).to_string(),
    }
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sorted(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

fn with_locale(base: String, locale: Option<&str>) -> String {
    match locale {
        Some(locale) if !locale.is_empty() => format!("{}:{}", base, locale),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::cache::GlobPattern;

    fn any_match(patterns: &[String], key: &str) -> bool {
        patterns
            .iter()
            .any(|p| GlobPattern::compile(p).unwrap().matches(key))
    }

    #[test]
    fn test_document_keys() {
        assert_eq!(document_key("events", "42", None), "doc:events:42");
        assert_eq!(document_key("events", "42", Some("fr")), "doc:events:42:fr");
        assert_eq!(document_key("events", "42", Some("")), "doc:events:42");
        assert_eq!(
            document_by_slug_key("events", "spring-fair", Some("en")),
            "doc:events:slug:spring-fair:en"
        );
    }

    #[test]
    fn test_global_and_media_keys() {
        assert_eq!(global_key("footer", None), "global:footer");
        assert_eq!(global_key("footer", Some("de")), "global:footer:de");
        assert_eq!(media_key("images", "7"), "media:images:7");
    }

    #[test]
    fn test_list_key_is_order_independent() {
        let a = list_key("events", &json!({"status": "ACTIVE", "page": 1}));
        let b = list_key("events", &json!({"page": 1, "status": "ACTIVE"}));

        assert_eq!(a, b);
        assert_eq!(a, "list:events:{\"page\":1,\"status\":\"ACTIVE\"}");
    }

    #[test]
    fn test_list_key_sorts_nested_objects() {
        let a = list_key("events", &json!({"where": {"b": 2, "a": 1}, "sort": ["-date"]}));
        let b = list_key("events", &json!({"sort": ["-date"], "where": {"a": 1, "b": 2}}));

        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_params() {
        assert_eq!(list_key("events", &Value::Null), "list:events:all");
        assert_eq!(list_key("events", &json!({})), "list:events:all");
        assert_eq!(api_key("search", &json!({"q": "jazz"})), "api:search:{\"q\":\"jazz\"}");
    }

    #[test]
    fn test_document_patterns_are_precise() {
        let patterns = document_patterns("events", "42");

        assert!(any_match(&patterns, "doc:events:42"));
        assert!(any_match(&patterns, "doc:events:42:en"));
        assert!(!any_match(&patterns, "doc:events:420"));
        assert!(!any_match(&patterns, "doc:shops:42"));
    }

    #[test]
    fn test_collection_patterns_cover_every_namespace() {
        let patterns = collection_patterns("events");

        assert!(any_match(&patterns, "doc:events:1"));
        assert!(any_match(&patterns, "doc:events:slug:fair"));
        assert!(any_match(&patterns, &list_key("events", &json!({"page": 2}))));
        assert!(any_match(&patterns, &media_key("events", "3")));
        assert!(!any_match(&patterns, "doc:shops:1"));
    }

    #[test]
    fn test_global_patterns() {
        let patterns = global_patterns("footer");

        assert!(any_match(&patterns, "global:footer"));
        assert!(any_match(&patterns, "global:footer:en"));
        assert!(!any_match(&patterns, "global:footer-links"));
    }
}
