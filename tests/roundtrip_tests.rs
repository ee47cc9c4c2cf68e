//! Round-trip behaviour across JSON, YAML and XML
//!
//! These tests pin down the conversion contract end to end: the concrete
//! YAML -> XML scenario, the attribute naming default, the multi-document
//! guard, and which round trips are strict and which are only lenient.

use pretty_assertions::assert_eq;
use serde_json::json;
use treeconv::converters::{parse_stream, write_stream, Adapter, JsonAdapter, XmlAdapter, XmlConfig, YamlAdapter};
use treeconv::names::make_valid_xml_name;
use treeconv::transcode::{decode_str, json_to_xml, json_to_yaml, transcode_str, xml_to_json, Format, TranscodeOptions};
use treeconv::xml::{WriteOptions, XmlDocument};
use treeconv::{compare, equal, CompareMode, Error, Mapping, Scalar, Value};

// Only leaves JSON can carry natively.
fn json_tree() -> Value {
    Value::Mapping(
        Mapping::new()
            .with("name", "widget")
            .with("count", 12i64)
            .with("neg", -40000i64)
            .with("ratio", 1.0)
            .with("missing", Value::Null)
            .with("list", Value::Sequence(vec![Value::from(true), Value::string("44"), Value::Sequence(vec![])]))
            .with("empty", Value::Mapping(Mapping::new())),
    )
}

fn sample_tree() -> Value {
    Value::Mapping(
        Mapping::new()
            .with("name", "widget")
            .with("count", 12i64)
            .with("big", 9_000_000_000i64)
            .with("ratio", 0.25)
            .with("enabled", false)
            .with("released", Value::infer("2024-03-01T08:15:00"))
            .with("stamp", Value::infer("2024-03-01T08:15:00-05:00"))
            .with(
                "parts",
                Value::Sequence(vec![
                    Value::Mapping(Mapping::new().with("id", 1i64).with("label", "bolt")),
                    Value::Mapping(Mapping::new().with("id", 2i64).with("label", "nut")),
                ]),
            )
            .with("owner", Value::Mapping(Mapping::new().with("email", "a@example.com"))),
    )
}

fn xml_roundtrip(value: &Value) -> Value {
    let adapter = XmlAdapter::new();
    let text = adapter
        .encode(value)
        .unwrap()
        .to_xml_string(&WriteOptions::new())
        .unwrap();
    adapter.decode(&XmlDocument::parse(&text).unwrap()).unwrap()
}

#[test]
fn test_yaml_to_xml_scenario() {
    let stream = parse_stream("a: 1\nb: true\nc: null\n").unwrap();
    let value = YamlAdapter::new().decode_single(&stream).unwrap();

    let expected = Mapping::from_entries(vec![
        ("a", Value::Scalar(Scalar::UInt8(1))),
        ("b", Value::Scalar(Scalar::Bool(true))),
        ("c", Value::Null),
    ])
    .unwrap();
    assert_eq!(value, Value::Mapping(expected));

    let xml = XmlAdapter::new()
        .encode(&value)
        .unwrap()
        .to_xml_string(&WriteOptions::new())
        .unwrap();
    assert_eq!(xml, "<root><a>1</a><b>true</b><c/></root>");

    let back = XmlAdapter::new()
        .decode(&XmlDocument::parse(&xml).unwrap())
        .unwrap();
    assert_eq!(back.get("c"), Some(&Value::Mapping(Mapping::new())));
    assert!(!equal(&value, &back, false));
    assert!(equal(&value, &back, true));
}

#[test]
fn test_json_roundtrip_is_strict() {
    let tree = json_tree();
    let adapter = JsonAdapter::new();
    let text = serde_json::to_string(&adapter.encode(&tree).unwrap()).unwrap();
    let back = adapter.decode(&serde_json::from_str(&text).unwrap()).unwrap();

    let comparison = compare(&tree, &back, CompareMode::Strict);
    assert!(comparison.is_equal(), "{:?}", comparison.differences);
}

#[test]
fn test_yaml_roundtrip_is_strict() {
    let tree = sample_tree();
    let adapter = YamlAdapter::new();
    let text = write_stream(&adapter.encode_stream(&tree).unwrap()).unwrap();
    let back = adapter.decode_single(&parse_stream(&text).unwrap()).unwrap();

    assert_eq!(back, tree);
}

#[test]
fn test_xml_roundtrip_is_lenient_only() {
    let mut tree = sample_tree();
    if let Value::Mapping(map) = &mut tree {
        map.insert("nothing", Value::Null);
        map.insert("blank", Value::string(""));
        map.insert("none", Value::Sequence(vec![]));
    }

    let back = xml_roundtrip(&tree);
    assert!(equal(&tree, &back, true));

    let strict = compare(&tree, &back, CompareMode::Strict);
    let paths: Vec<_> = strict.differences.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(paths, vec!["$.nothing", "$.blank", "$.none"]);
}

#[test]
fn test_xml_json_xml_stabilizes() {
    let config = XmlConfig::default();
    let original = XmlDocument::parse(
        r#"<catalog xmlns:p="urn:p" version="2">
             <p:item sku="A1"><name>One</name><tag>x</tag><tag>y</tag></p:item>
             <p:item sku="B2"><name>Two</name><empty/></p:item>
             <note>  padded  </note>
           </catalog>"#,
    )
    .unwrap();

    let first_json = xml_to_json(&original, &config).unwrap();
    let first_xml = json_to_xml(&first_json, &config).unwrap();
    let second_json = xml_to_json(&first_xml, &config).unwrap();
    let second_xml = json_to_xml(&second_json, &config).unwrap();

    let adapter = XmlAdapter::new();
    let first = adapter.decode(&first_xml).unwrap();
    let second = adapter.decode(&second_xml).unwrap();
    assert!(equal(&first, &second, true));
    assert_eq!(first_json, second_json);

    assert_eq!(
        first_json,
        json!({
            "$xmlns:p": "urn:p",
            "$version": 2,
            "p:item": [
                {"$sku": "A1", "name": "One", "tag": ["x", "y"]},
                {"$sku": "B2", "name": "Two", "empty": {}}
            ],
            "note": "  padded  "
        })
    );
}

#[test]
fn test_padded_strings_survive_xml() {
    let tree = Value::Mapping(Mapping::new().with("s", " padded "));
    let back = xml_roundtrip(&tree);
    assert!(equal(&tree, &back, true));
    assert_eq!(back.get("s"), Some(&Value::string(" padded ")));

    let element = XmlDocument::parse("<root><s> padded </s><n> 7 </n></root>").unwrap();
    let decoded = XmlAdapter::new().decode(&element).unwrap();
    assert_eq!(decoded.get("s"), Some(&Value::string(" padded ")));
    assert_eq!(decoded.get("n"), Some(&Value::Scalar(Scalar::UInt8(7))));
}

#[test]
fn test_multi_document_guard() {
    let adapter = YamlAdapter::new();
    let stream = adapter
        .encode_documents(&[
            Value::Mapping(Mapping::new().with("first", 1i64)),
            Value::Mapping(Mapping::new().with("second", 2i64)),
        ])
        .unwrap();
    let reparsed = parse_stream(&write_stream(&stream).unwrap()).unwrap();

    let err = adapter.decode_single(&reparsed).unwrap_err();
    assert!(matches!(err, Error::MultiDocument(2)));
    assert_eq!(err.to_string(), "multi-document error: expected a single document, found 2");
}

#[test]
fn test_attribute_naming_default() {
    let doc = XmlDocument::parse(r#"<thing id="5"/>"#).unwrap();
    let value = XmlAdapter::new().decode(&doc).unwrap();
    assert_eq!(value.get("$id"), Some(&Value::Scalar(Scalar::UInt8(5))));
}

#[test]
fn test_attribute_roundtrip_with_custom_prefix() {
    let config = XmlConfig::new().with_attribute_prefix("@");
    let json = json!({"@id": 5, "name": "x"});
    let doc = json_to_xml(&json, &config).unwrap();
    assert_eq!(
        doc.to_xml_string(&WriteOptions::new()).unwrap(),
        r#"<root id="5"><name>x</name></root>"#
    );
    assert_eq!(xml_to_json(&doc, &config).unwrap(), json);
}

#[test]
fn test_name_sanitization() {
    assert!(make_valid_xml_name("xml:thing").starts_with('_'));
    assert_eq!(make_valid_xml_name(""), "unnamed");
}

#[test]
fn test_namespace_errors_fail_fast() {
    let bare = json!({"$xmlns:": "urn:x", "a": 1});
    assert!(matches!(json_to_xml(&bare, &XmlConfig::default()), Err(Error::Namespace(_))));

    let unbound = json!({"q:a": 1});
    assert!(matches!(json_to_xml(&unbound, &XmlConfig::default()), Err(Error::Namespace(_))));

    let nested_unbound = json!({"outer": {"inner": {"q:a": 1}}});
    assert!(matches!(
        json_to_xml(&nested_unbound, &XmlConfig::default()),
        Err(Error::Namespace(_))
    ));
}

#[test]
fn test_default_namespace_roundtrip() {
    let json = json!({"$xmlns": "urn:default", "child": {"$xmlns:x": "urn:x", "x:leaf": true}});
    let doc = json_to_xml(&json, &XmlConfig::default()).unwrap();
    let text = doc.to_xml_string(&WriteOptions::new()).unwrap();
    assert_eq!(
        text,
        r#"<root xmlns="urn:default"><child xmlns:x="urn:x"><x:leaf>true</x:leaf></child></root>"#
    );

    let reparsed = XmlDocument::parse(&text).unwrap();
    let root = reparsed.root().unwrap();
    assert_eq!(root.namespace(), Some("urn:default"));
    assert_eq!(xml_to_json(&reparsed, &XmlConfig::default()).unwrap(), json);
}

#[test]
fn test_json_strings_are_not_inferred() {
    let value = JsonAdapter::new().decode(&json!({"n": "44"})).unwrap();
    assert_eq!(value.get("n"), Some(&Value::string("44")));

    // XML and YAML are untyped text, so the same string comes back as a number.
    let yaml = json_to_yaml(&json!({"n": "44"})).unwrap();
    let back = YamlAdapter::new().decode(&yaml).unwrap();
    assert_eq!(back.get("n"), Some(&Value::Scalar(Scalar::UInt8(44))));
    assert!(!equal(&value, &back, false));
}

#[test]
fn test_duplicate_keys_are_rejected() {
    let err = parse_stream("1: a\n'1': b\n").unwrap_err();
    assert!(matches!(err, Error::MalformedInput(_)));

    let options = TranscodeOptions::default();
    let err = transcode_str(r#"{"a":1,"a":2}"#, Format::Json, Format::Yaml, &options).unwrap_err();
    assert!(matches!(err, Error::MalformedInput(_)));
    let err = transcode_str("a: 1\na: 2\n", Format::Yaml, Format::Json, &options).unwrap_err();
    assert!(matches!(err, Error::MalformedInput(_)));
}

#[test]
fn test_yaml_and_xml_type_the_same_text() {
    for text in ["0x10", "0o17", ".inf", "16", "-0", "2024-01-15", "TRUE", "1e3"] {
        let yaml = YamlAdapter::new()
            .decode_single(&parse_stream(&format!("x: {}\n", text)).unwrap())
            .unwrap();
        let xml = XmlAdapter::new()
            .decode(&XmlDocument::parse(&format!("<root><x>{}</x></root>", text)).unwrap())
            .unwrap();
        assert_eq!(yaml, xml, "{}", text);
    }
}

#[test]
fn test_text_level_transcoding() {
    let options = TranscodeOptions::default();
    let json = transcode_str("<root><a>1</a><a>2</a><b>hi</b></root>", Format::Xml, Format::Json, &options)
        .unwrap();
    assert_eq!(json, r#"{"a":[1,2],"b":"hi"}"#);

    let yaml = transcode_str(&json, Format::Json, Format::Yaml, &options).unwrap();
    assert_eq!(yaml, "a:\n- 1\n- 2\nb: hi\n");

    let xml = transcode_str(&yaml, Format::Yaml, Format::Xml, &options).unwrap();
    assert_eq!(xml, "<root><a>1</a><a>2</a><b>hi</b></root>");
}

#[test]
fn test_integers_beyond_i64_become_doubles_through_text_formats() {
    let options = TranscodeOptions::default();
    let original = decode_str("18446744073709551615", Format::Json, &options).unwrap();
    assert!(matches!(original, Value::Scalar(Scalar::Decimal(_))));

    let yaml = transcode_str("18446744073709551615", Format::Json, Format::Yaml, &options).unwrap();
    let back = decode_str(&yaml, Format::Yaml, &options).unwrap();
    assert_eq!(back, Value::Scalar(Scalar::Double(18446744073709551615u64 as f64)));
    assert_eq!(
        transcode_str(&yaml, Format::Yaml, Format::Json, &options).unwrap(),
        "1.8446744073709552e19"
    );
    assert!(!equal(&original, &back, false));
}
