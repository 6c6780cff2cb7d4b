use bl4_dup_core::core_api::{CoreErrorCode, SaveDocument};
use bl4_dup_core::grammar::{self, GrammarError};
use bl4_dup_core::node::{Node, NodeMap};

fn map(entries: Vec<(&str, Node)>) -> Node {
    Node::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

fn sample_tree() -> Node {
    map(vec![
        (
            "state",
            map(vec![
                ("char_name", Node::from("Vex")),
                ("total_playtime", Node::Integer(98_765)),
                ("is_online", Node::Bool(false)),
                ("scale", Node::Float(1.25)),
                ("note", Node::Null),
            ]),
        ),
        (
            "zeta_first",
            map(vec![
                ("b", Node::Integer(2)),
                ("a", Node::Integer(1)),
                ("c", Node::Integer(3)),
            ]),
        ),
        (
            "inventory",
            Node::Sequence(vec![
                Node::from("@Ugy3L+2}TYg%$yC%i7M2gZldO)@}cgb!l34$a-qf{00"),
                map(vec![("slot", Node::from("slot_0")), ("flags", Node::Integer(-1))]),
                Node::Sequence(vec![]),
            ]),
        ),
        ("unicode", Node::from("Ünïcödé ✓ 日本語 🎮")),
        ("looks_numeric", Node::from("00123")),
        ("looks_bool", Node::from("true")),
        ("empty", Node::from("")),
        ("multiline", Node::from("line one\nline two\n")),
        ("negative_float", Node::Float(-0.125)),
        ("big", Node::Integer(i64::MAX)),
    ])
}

#[test]
fn serialize_then_parse_preserves_structure() {
    let tree = sample_tree();
    let text = grammar::serialize(&tree).expect("serialize sample");
    let parsed = grammar::parse(&text).expect("parse serialized sample");
    assert_eq!(parsed, tree);
}

#[test]
fn map_key_order_follows_insertion_not_sorting() {
    let text = "zeta: 1\nalpha: 2\nmid:\n  y: true\n  x: false\n";
    let parsed = grammar::parse(text).expect("parse");
    let root = parsed.as_map().expect("root map");
    assert_eq!(root.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);

    let emitted = grammar::serialize(&parsed).expect("serialize");
    let zeta = emitted.find("zeta").expect("zeta emitted");
    let alpha = emitted.find("alpha").expect("alpha emitted");
    assert!(zeta < alpha, "emitted order changed:\n{emitted}");
    assert!(emitted.find("y:").expect("y") < emitted.find("x:").expect("x"));
}

#[test]
fn replacing_a_value_keeps_its_position() {
    let mut node = grammar::parse("a: 1\nb: 2\nc: 3\n").expect("parse");
    let root = node.as_map_mut().expect("root map");
    root.insert("b", Node::from("two"));
    root.insert("d", Node::Integer(4));

    assert_eq!(root.keys().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    let reparsed = grammar::parse(&grammar::serialize(&node).expect("serialize")).expect("parse");
    assert_eq!(reparsed, node);
}

#[test]
fn scalar_keys_become_strings() {
    let parsed = grammar::parse("1: one\ntrue: yes\n").expect("parse");
    let root = parsed.as_map().expect("root map");
    assert_eq!(root.get("1"), Some(&Node::from("one")));
    assert_eq!(root.get("true"), Some(&Node::from("yes")));
}

#[test]
fn tagged_values_are_rejected() {
    let err = grammar::parse("item: !custom 5\n").expect_err("tag should be rejected");
    assert!(matches!(err, GrammarError::UnsupportedTag(_)), "{err}");
}

#[test]
fn sequence_keys_are_rejected() {
    let err = grammar::parse("? [a, b]\n: 1\n").expect_err("complex key should be rejected");
    assert!(matches!(err, GrammarError::UnsupportedKey(_)), "{err}");
}

#[test]
fn out_of_range_integers_are_rejected() {
    let err = grammar::parse("n: 18446744073709551615\n").expect_err("u64 max should be rejected");
    assert!(matches!(err, GrammarError::IntegerOutOfRange(_)), "{err}");
}

#[test]
fn invalid_yaml_is_a_syntax_error() {
    let err = grammar::parse("a: [1, 2\n").expect_err("unterminated flow sequence");
    assert!(matches!(err, GrammarError::Syntax(_)), "{err}");
}

#[test]
fn document_requires_map_root() {
    for text in ["- 1\n- 2\n", "just a string\n", ""] {
        let err = SaveDocument::parse(text.as_bytes(), "1").expect_err("non-map root");
        assert_eq!(err.code, CoreErrorCode::Parse, "input {text:?}");
    }
}

#[test]
fn document_rejects_invalid_utf8() {
    let err = SaveDocument::parse(&[0x61, 0x3a, 0x20, 0xff, 0xfe], "1").expect_err("bad utf-8");
    assert_eq!(err.code, CoreErrorCode::Parse);
}

#[test]
fn document_yaml_round_trips_unicode_names() {
    let doc = SaveDocument::parse("state:\n  char_name: \"Zoë ☆\"\n".as_bytes(), "1")
        .expect("parse document");
    let yaml = doc.to_yaml().expect("serialize document");
    let again = SaveDocument::parse(yaml.as_bytes(), "1").expect("reparse document");
    assert_eq!(again.char_name().expect("name"), Some("Zoë ☆"));
    assert_eq!(again, doc);
}

#[test]
fn node_map_remove_and_retain_keep_relative_order() {
    let mut m: NodeMap = ["a", "b", "c", "d"]
        .into_iter()
        .enumerate()
        .map(|(i, k)| (k.to_string(), Node::Integer(i as i64)))
        .collect();
    assert_eq!(m.remove("b"), Some(Node::Integer(1)));
    m.retain(|k, _| k != "c");
    assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "d"]);
    assert_eq!(m.remove("missing"), None);
}
