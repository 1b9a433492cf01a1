use serde_json::json;
use stalker_m3u::server::utils::json_utils::{LenientJson, field_string};

#[test]
fn test_clean_body_is_parsed() {
    let decoded = LenientJson::decode(r#"{"js":{"token":"abc"}}"#);

    assert_eq!(
        decoded.js().and_then(|js| field_string(js, "token")),
        Some("abc".to_string())
    );
}

#[test]
fn test_preamble_is_skipped() {
    let body = "\u{feff}<br />\n<b>Notice</b>: something\n{\"js\":{\"token\":\"t1\"}}\n";
    let decoded = LenientJson::decode(body);

    assert_eq!(
        decoded.js().and_then(|js| field_string(js, "token")),
        Some("t1".to_string())
    );
}

#[test]
fn test_js_marker_is_used_when_outer_braces_dont_parse() {
    let body = "<style>a{color:red}</style>{\"js\":{\"token\":\"t2\"}}";
    let decoded = LenientJson::decode(body);

    assert_eq!(
        decoded.js().and_then(|js| field_string(js, "token")),
        Some("t2".to_string())
    );
}

#[test]
fn test_garbage_is_tagged_not_raised() {
    let decoded = LenientJson::decode("<html>502 Bad Gateway</html>");

    assert_eq!(
        decoded,
        LenientJson::Unparsable("<html>502 Bad Gateway</html>".to_string())
    );
    assert!(decoded.js().is_none());
}

#[test]
fn test_null_js_counts_as_missing() {
    let decoded = LenientJson::decode(r#"{"js":null}"#);

    assert!(decoded.value().is_some());
    assert!(decoded.js().is_none());
}

#[test]
fn test_numbers_and_strings_read_the_same() {
    let value = json!({ "id": 12, "name": "News", "empty": "  " });

    assert_eq!(field_string(&value, "id"), Some("12".to_string()));
    assert_eq!(field_string(&value, "name"), Some("News".to_string()));
    assert_eq!(field_string(&value, "empty"), None);
    assert_eq!(field_string(&value, "missing"), None);
}
