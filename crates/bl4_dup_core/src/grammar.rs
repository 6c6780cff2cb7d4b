//! YAML text <-> [`Node`] conversion.
//!
//! Map key order is carried through both directions unchanged, so a document
//! that is parsed and serialized without edits produces the same key sequence.

use serde_yaml::{Mapping, Number, Value};
use thiserror::Error;

use crate::node::{Node, NodeMap};

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid YAML: {0}")]
    Syntax(#[source] serde_yaml::Error),
    #[error("plaintext is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("unsupported tagged value `{0}`")]
    UnsupportedTag(String),
    #[error("unsupported {0} map key")]
    UnsupportedKey(&'static str),
    #[error("integer {0} does not fit in 64 bits")]
    IntegerOutOfRange(String),
    #[error("failed to emit YAML: {0}")]
    Emit(#[source] serde_yaml::Error),
}

pub fn parse(text: &str) -> Result<Node, GrammarError> {
    let value: Value = serde_yaml::from_str(text).map_err(GrammarError::Syntax)?;
    node_from_value(value)
}

pub fn parse_bytes(bytes: &[u8]) -> Result<Node, GrammarError> {
    parse(std::str::from_utf8(bytes)?)
}

pub fn serialize(node: &Node) -> Result<String, GrammarError> {
    serde_yaml::to_string(&value_from_node(node)).map_err(GrammarError::Emit)
}

pub fn serialize_map(map: &NodeMap) -> Result<String, GrammarError> {
    serde_yaml::to_string(&Value::Mapping(mapping_from_map(map))).map_err(GrammarError::Emit)
}

fn node_from_value(value: Value) -> Result<Node, GrammarError> {
    Ok(match value {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Bool(b),
        Value::Number(n) => node_from_number(&n)?,
        Value::String(s) => Node::String(s),
        Value::Sequence(items) => Node::Sequence(
            items
                .into_iter()
                .map(node_from_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Mapping(mapping) => {
            let mut map = NodeMap::new();
            for (key, val) in mapping {
                map.insert(key_to_string(key)?, node_from_value(val)?);
            }
            Node::Map(map)
        }
        Value::Tagged(tagged) => {
            return Err(GrammarError::UnsupportedTag(tagged.tag.to_string()));
        }
    })
}

fn node_from_number(n: &Number) -> Result<Node, GrammarError> {
    if let Some(i) = n.as_i64() {
        return Ok(Node::Integer(i));
    }
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            return Ok(Node::Float(f));
        }
    }
    Err(GrammarError::IntegerOutOfRange(n.to_string()))
}

fn key_to_string(key: Value) -> Result<String, GrammarError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(GrammarError::UnsupportedKey("null")),
        Value::Sequence(_) => Err(GrammarError::UnsupportedKey("sequence")),
        Value::Mapping(_) => Err(GrammarError::UnsupportedKey("mapping")),
        Value::Tagged(_) => Err(GrammarError::UnsupportedKey("tagged")),
    }
}

fn value_from_node(node: &Node) -> Value {
    match node {
        Node::Null => Value::Null,
        Node::Bool(b) => Value::Bool(*b),
        Node::Integer(n) => Value::Number(Number::from(*n)),
        Node::Float(f) => Value::Number(Number::from(*f)),
        Node::String(s) => Value::String(s.clone()),
        Node::Sequence(items) => Value::Sequence(items.iter().map(value_from_node).collect()),
        Node::Map(map) => Value::Mapping(mapping_from_map(map)),
    }
}

fn mapping_from_map(map: &NodeMap) -> Mapping {
    let mut mapping = Mapping::with_capacity(map.len());
    for (key, val) in map.iter() {
        mapping.insert(Value::String(key.to_string()), value_from_node(val));
    }
    mapping
}
