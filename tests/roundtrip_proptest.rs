//! Property-based tests for the round-trip laws
//!
//! JSON and YAML round trips must be exact. XML round trips only hold up
//! to lenient equivalence, and only for trees XML can express: no
//! one-element sequences and no sequences directly inside sequences.

use proptest::prelude::*;
use std::collections::BTreeMap;
use treeconv::converters::{parse_stream, write_stream, Adapter, JsonAdapter, XmlAdapter, XmlConfig, YamlAdapter};
use treeconv::names::{is_valid_ncname, make_valid_xml_name};
use treeconv::transcode::{json_to_xml, xml_to_json};
use treeconv::xml::{WriteOptions, XmlDocument};
use treeconv::{equal, infer, Mapping, Scalar, Value};

/// Keys that are valid XML names and never start with "xml"
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-w][a-z0-9_]{0,6}"
}

/// Strings that infer back to themselves
fn text_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ]{0,10}[A-Za-z0-9]"
        .prop_filter("must infer as a string", |s| matches!(infer(s), Scalar::String(_)))
}

fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e12f64..1.0e12).prop_map(Value::from),
        text_strategy().prop_map(Value::from),
    ]
}

fn mapping_of(entries: BTreeMap<String, Value>) -> Value {
    Value::Mapping(Mapping::from_entries(entries).unwrap())
}

/// Any tree of the leaves above
fn tree_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Sequence),
            prop::collection::btree_map(key_strategy(), inner, 0..4).prop_map(mapping_of),
        ]
    })
}

/// Trees XML can express up to lenient equivalence
fn xml_tree_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(3, 32, 4, |inner| {
        let mapping = prop::collection::btree_map(key_strategy(), inner, 0..4).prop_map(mapping_of).boxed();
        let item = prop_oneof![leaf_strategy(), mapping.clone()];
        prop_oneof![
            mapping,
            prop::collection::vec(item, 2..4).prop_map(Value::Sequence),
        ]
    })
}

fn document_strategy(values: impl Strategy<Value = Value>) -> impl Strategy<Value = Value> {
    prop::collection::btree_map(key_strategy(), values, 0..5).prop_map(mapping_of)
}

/// Text that looks like numbers, dates and booleans
fn typed_text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[+-]?[0-9]{1,25}",
        "[+-]?[0-9]{0,12}\\.[0-9]{0,12}",
        "[+-]?[0-9]{1,4}(\\.[0-9]{1,4})?[eE][+-]?[0-9]{1,3}",
        "(19|20)[0-9]{2}-(0[1-9]|1[0-2])-(0[1-9]|1[0-9]|2[0-8])",
        "(19|20)[0-9]{2}-(0[1-9]|1[0-2])-(0[1-9]|1[0-9]|2[0-8])[T ]([01][0-9]|2[0-3]):[0-5][0-9](:[0-5][0-9](\\.[0-9]{1,9})?)?",
        "(19|20)[0-9]{2}-(0[1-9]|1[0-2])-(0[1-9]|1[0-9]|2[0-8])T([01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9](\\.[0-9]{1,6})?(Z|[+-](0[0-9]|1[0-3]):[0-5][0-9])",
        "[Tt][Rr][Uu][Ee]|[Ff][Aa][Ll][Ss][Ee]",
        "-0+",
    ]
}

#[cfg(test)]
mod proptest_tests {
    use super::*;

    proptest! {
        #[test]
        fn test_scalar_inference_is_stable(text in any::<String>()) {
            let first = infer(&text);
            let second = infer(&first.render());
            prop_assert_eq!(first.kind(), second.kind());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn test_typed_scalar_inference_is_stable(text in typed_text_strategy()) {
            let first = infer(&text);
            let second = infer(&first.render());
            prop_assert_eq!(first.kind(), second.kind(), "{:?} rendered as {:?}", text, first.render());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn test_json_roundtrip(tree in tree_strategy()) {
            let adapter = JsonAdapter::new();
            let text = serde_json::to_string(&adapter.encode(&tree).unwrap()).unwrap();
            let back = adapter.decode(&serde_json::from_str(&text).unwrap()).unwrap();
            prop_assert!(equal(&tree, &back, false), "{:?} -> {}", tree, text);
        }

        #[test]
        fn test_yaml_roundtrip(tree in tree_strategy()) {
            let adapter = YamlAdapter::new();
            let text = write_stream(&adapter.encode_stream(&tree).unwrap()).unwrap();
            let back = adapter.decode_single(&parse_stream(&text).unwrap()).unwrap();
            prop_assert!(equal(&tree, &back, false), "{:?} -> {}", tree, text);
        }

        #[test]
        fn test_xml_roundtrip_is_lenient(tree in document_strategy(xml_tree_strategy())) {
            let adapter = XmlAdapter::new();
            let text = adapter
                .encode(&tree)
                .unwrap()
                .to_xml_string(&WriteOptions::new())
                .unwrap();
            let back = adapter.decode(&XmlDocument::parse(&text).unwrap()).unwrap();
            prop_assert!(equal(&tree, &back, true), "{:?} -> {}", tree, text);
        }

        #[test]
        fn test_xml_json_xml_is_idempotent(tree in document_strategy(tree_strategy())) {
            let config = XmlConfig::default();
            let adapter = XmlAdapter::new();
            let original = adapter.encode(&tree).unwrap();

            let once = json_to_xml(&xml_to_json(&original, &config).unwrap(), &config).unwrap();
            let twice = json_to_xml(&xml_to_json(&once, &config).unwrap(), &config).unwrap();

            let first = adapter.decode(&once).unwrap();
            let second = adapter.decode(&twice).unwrap();
            prop_assert!(equal(&first, &second, true));
        }

        #[test]
        fn test_sanitized_names_are_valid(raw in any::<String>()) {
            let name = make_valid_xml_name(&raw);
            prop_assert!(is_valid_ncname(&name), "{:?} -> {:?}", raw, name);
            prop_assert!(!name.to_ascii_lowercase().starts_with("xml"));
            prop_assert_eq!(name, make_valid_xml_name(&raw));
        }
    }
}
