//! Render shapes for response payloads
//!
//! Output formats never inspect concrete response types. Payloads are
//! lowered into a [`Node`] tree of mappings, sequences and labeled records,
//! and every renderer walks that tree. Any type implementing [`Shape`] can
//! be rendered in every output format.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Largest float magnitude that still converts to an exact integer
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// A generic view of a payload value
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Absent value
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    /// Ordered sequence of values
    Seq(Vec<Node>),
    /// Key/value mapping, in natural key order
    Map(Vec<(String, Node)>),
    /// Labeled record, in field declaration order
    Record(Vec<Field>),
}

/// Serialization name of a record field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireName {
    /// Serialized under the field identifier
    Ident,
    /// Serialized under an explicit name
    Renamed(String),
    /// Excluded from serialization, still shown as a column
    Suppressed,
}

/// A single field of a labeled record
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    ident: String,
    wire: WireName,
    hidden: bool,
    value: Node,
}

impl Field {
    /// Create a visible field serialized under its identifier
    pub fn new(ident: impl Into<String>, value: Node) -> Self {
        Self {
            ident: ident.into(),
            wire: WireName::Ident,
            hidden: false,
            value,
        }
    }

    /// Serialize the field under `name`
    pub fn wire(mut self, name: impl Into<String>) -> Self {
        self.wire = WireName::Renamed(name.into());
        self
    }

    /// Keep the field out of serialized output
    pub fn suppress_wire(mut self) -> Self {
        self.wire = WireName::Suppressed;
        self
    }

    /// Mark the field as not externally visible
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn value(&self) -> &Node {
        &self.value
    }

    pub fn is_visible(&self) -> bool {
        !self.hidden
    }

    /// Column name: the explicit wire name if any, else the identifier
    pub fn header_name(&self) -> &str {
        match &self.wire {
            WireName::Renamed(name) => name,
            WireName::Ident | WireName::Suppressed => &self.ident,
        }
    }

    fn serialized_name(&self) -> Option<&str> {
        if self.hidden || self.value == Node::Null {
            return None;
        }
        match &self.wire {
            WireName::Suppressed => None,
            WireName::Renamed(name) => Some(name),
            WireName::Ident => Some(&self.ident),
        }
    }
}

impl Node {
    /// Look up an entry by key (mappings) or column name (records)
    pub fn get(&self, name: &str) -> Option<&Node> {
        match self {
            Node::Map(entries) => entries
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
            Node::Record(fields) => fields
                .iter()
                .filter(|field| field.is_visible())
                .find(|field| field.header_name() == name)
                .map(Field::value),
            _ => None,
        }
    }

    /// Visible entries labeled by key (mappings) or identifier (records)
    pub fn entries(&self) -> Vec<(&str, &Node)> {
        match self {
            Node::Map(entries) => entries
                .iter()
                .map(|(key, value)| (key.as_str(), value))
                .collect(),
            Node::Record(fields) => fields
                .iter()
                .filter(|field| field.is_visible())
                .map(|field| (field.ident(), field.value()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The first sequence-valued entry of a mapping or record
    pub fn first_sequence(&self) -> Option<&[Node]> {
        self.entries().into_iter().find_map(|(_, value)| match value {
            Node::Seq(items) => Some(items.as_slice()),
            _ => None,
        })
    }
}

/// Default stringification: scalars print plainly, absent values print
/// nothing and composites print as compact JSON.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Null => Ok(()),
            Node::Bool(value) => write!(f, "{value}"),
            Node::Int(value) => write!(f, "{value}"),
            Node::UInt(value) => write!(f, "{value}"),
            Node::Float(value) => write!(f, "{value}"),
            Node::Str(value) => f.write_str(value),
            composite => {
                let json = serde_json::to_string(composite).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(value) => serializer.serialize_bool(*value),
            Node::Int(value) => serializer.serialize_i64(*value),
            Node::UInt(value) => serializer.serialize_u64(*value),
            Node::Float(value) => {
                if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_FLOAT {
                    serializer.serialize_i64(*value as i64)
                } else {
                    serializer.serialize_f64(*value)
                }
            }
            Node::Str(value) => serializer.serialize_str(value),
            Node::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Node::Record(fields) => {
                let mut map = serializer.serialize_map(None)?;
                for field in fields {
                    if let Some(name) = field.serialized_name() {
                        map.serialize_entry(name, field.value())?;
                    }
                }
                map.end()
            }
        }
    }
}

/// Lowering of a value into its render shape
pub trait Shape {
    fn shape(&self) -> Node;
}

impl Shape for Node {
    fn shape(&self) -> Node {
        self.clone()
    }
}

impl<T: Shape + ?Sized> Shape for &T {
    fn shape(&self) -> Node {
        (**self).shape()
    }
}

impl<T: Shape + ?Sized> Shape for Box<T> {
    fn shape(&self) -> Node {
        (**self).shape()
    }
}

macro_rules! shape_via {
    ($variant:ident as $target:ty => $($ty:ty),*) => {
        $(
            impl Shape for $ty {
                fn shape(&self) -> Node {
                    Node::$variant(<$target>::from(*self))
                }
            }
        )*
    };
}

shape_via!(Int as i64 => i8, i16, i32, i64);
shape_via!(UInt as u64 => u8, u16, u32, u64);
shape_via!(Float as f64 => f32, f64);
shape_via!(Bool as bool => bool);

impl Shape for isize {
    fn shape(&self) -> Node {
        Node::Int(*self as i64)
    }
}

impl Shape for usize {
    fn shape(&self) -> Node {
        Node::UInt(*self as u64)
    }
}

impl Shape for str {
    fn shape(&self) -> Node {
        Node::Str(self.to_string())
    }
}

impl Shape for String {
    fn shape(&self) -> Node {
        Node::Str(self.clone())
    }
}

impl<T: Shape> Shape for Option<T> {
    fn shape(&self) -> Node {
        self.as_ref().map_or(Node::Null, Shape::shape)
    }
}

impl<T: Shape> Shape for [T] {
    fn shape(&self) -> Node {
        Node::Seq(self.iter().map(Shape::shape).collect())
    }
}

impl<T: Shape> Shape for Vec<T> {
    fn shape(&self) -> Node {
        self.as_slice().shape()
    }
}

impl<K: fmt::Display, V: Shape> Shape for BTreeMap<K, V> {
    fn shape(&self) -> Node {
        Node::Map(
            self.iter()
                .map(|(key, value)| (key.to_string(), value.shape()))
                .collect(),
        )
    }
}

/// Hash maps have no natural order; entries are sorted by key.
impl<K: fmt::Display, V: Shape, S> Shape for HashMap<K, V, S> {
    fn shape(&self) -> Node {
        let mut entries: Vec<(String, Node)> = self
            .iter()
            .map(|(key, value)| (key.to_string(), value.shape()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Node::Map(entries)
    }
}

impl Shape for serde_json::Value {
    fn shape(&self) -> Node {
        use serde_json::Value;

        match self {
            Value::Null => Node::Null,
            Value::Bool(value) => Node::Bool(*value),
            Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    Node::Int(value)
                } else if let Some(value) = number.as_u64() {
                    Node::UInt(value)
                } else {
                    Node::Float(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(value) => Node::Str(value.clone()),
            Value::Array(items) => items.as_slice().shape(),
            Value::Object(object) => Node::Map(
                object
                    .iter()
                    .map(|(key, value)| (key.clone(), value.shape()))
                    .collect(),
            ),
        }
    }
}

/// Declare a response record.
///
/// Expands to a serde-enabled struct plus a [`Shape`] impl that lowers it
/// into a [`Node::Record`] in field declaration order. A field annotated
/// with `#[wire = "name"]` is serialized and shown as a column under
/// `name` instead of its identifier. Every field defaults when missing
/// from the wire.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[doc = $doc:literal])*
                $(#[wire = $wire:literal])?
                pub $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $name {
            $(
                $(#[doc = $doc])*
                $(#[serde(rename = $wire)])?
                #[serde(default)]
                pub $field: $ty,
            )*
        }

        impl $crate::shape::Shape for $name {
            fn shape(&self) -> $crate::shape::Node {
                $crate::shape::Node::Record(vec![
                    $(
                        $crate::shape::Field::new(
                            stringify!($field),
                            $crate::shape::Shape::shape(&self.$field),
                        )
                        $(.wire($wire))?,
                    )*
                ])
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    crate::record! {
        /// Test record
        pub struct Keyword {
            pub keyword: String,
            /// Monthly searches
            #[wire = "volume"]
            pub search_volume: i64,
            pub kd: Option<f64>,
        }
    }

    #[test]
    fn test_record_serializes_wire_names_in_declaration_order() {
        let keyword = Keyword {
            keyword: "rust".to_string(),
            search_volume: 1200,
            kd: Some(35.5),
        };
        let json = serde_json::to_string(&keyword.shape()).unwrap();
        assert_eq!(json, r#"{"keyword":"rust","volume":1200,"kd":35.5}"#);
    }

    #[test]
    fn test_record_omits_absent_optional_fields() {
        let keyword = Keyword {
            keyword: "rust".to_string(),
            search_volume: 10,
            kd: None,
        };
        let json = serde_json::to_string(&keyword.shape()).unwrap();
        assert_eq!(json, r#"{"keyword":"rust","volume":10}"#);
    }

    #[test]
    fn test_record_deserializes_from_wire_names() {
        let keyword: Keyword =
            serde_json::from_value(json!({"keyword": "seo", "volume": 5})).unwrap();
        assert_eq!(keyword.search_volume, 5);
        assert_eq!(keyword.kd, None);
    }

    #[test]
    fn test_integral_floats_serialize_as_integers() {
        assert_eq!(serde_json::to_string(&Node::Float(91.0)).unwrap(), "91");
        assert_eq!(serde_json::to_string(&Node::Float(0.25)).unwrap(), "0.25");
        assert_eq!(serde_json::to_string(&Node::Float(-3.0)).unwrap(), "-3");
    }

    #[test]
    fn test_hidden_and_suppressed_fields() {
        let record = Node::Record(vec![
            Field::new("name", Node::Str("a".into())),
            Field::new("secret", Node::Str("s".into())).hidden(),
            Field::new("internal", Node::Int(1)).suppress_wire(),
        ]);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":"a"}"#);

        // suppressed fields still show up as columns, hidden ones never do
        assert_eq!(record.get("internal"), Some(&Node::Int(1)));
        assert_eq!(record.get("secret"), None);
        let labels: Vec<&str> = record.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(labels, vec!["name", "internal"]);
    }

    #[test]
    fn test_get_uses_column_names() {
        let keyword = Keyword {
            keyword: "x".into(),
            search_volume: 3,
            kd: None,
        }
        .shape();
        assert_eq!(keyword.get("volume"), Some(&Node::Int(3)));
        assert_eq!(keyword.get("search_volume"), None);
        assert_eq!(keyword.get("kd"), Some(&Node::Null));
    }

    #[test]
    fn test_display() {
        assert_eq!(Node::Null.to_string(), "");
        assert_eq!(Node::Float(91.0).to_string(), "91");
        assert_eq!(Node::Float(1.5).to_string(), "1.5");
        assert_eq!(Node::Str("plain".into()).to_string(), "plain");
        assert_eq!(
            Node::Seq(vec![Node::Int(1), Node::Int(2)]).to_string(),
            "[1,2]"
        );
        assert_eq!(
            Node::Map(vec![("a".into(), Node::Bool(true))]).to_string(),
            r#"{"a":true}"#
        );
    }

    #[test]
    fn test_first_sequence_follows_natural_order() {
        let mut map = HashMap::new();
        map.insert("zeta".to_string(), vec![1u32]);
        map.insert("alpha".to_string(), vec![2u32, 3]);
        let node = map.shape();
        assert_eq!(
            node.first_sequence(),
            Some([Node::UInt(2), Node::UInt(3)].as_slice())
        );

        let record = Node::Record(vec![
            Field::new("total", Node::Int(2)),
            Field::new("rows", Node::Seq(vec![Node::Int(9)])),
            Field::new("more", Node::Seq(vec![])),
        ]);
        assert_eq!(record.first_sequence(), Some([Node::Int(9)].as_slice()));
        assert_eq!(Node::Int(1).first_sequence(), None);
    }

    #[test]
    fn test_json_value_shape() {
        let value = json!({"b": [1, -2, 2.5], "a": null, "c": "x"});
        let node = value.shape();
        assert_eq!(node.get("a"), Some(&Node::Null));
        assert_eq!(
            node.get("b"),
            Some(&Node::Seq(vec![
                Node::Int(1),
                Node::Int(-2),
                Node::Float(2.5)
            ]))
        );
        assert_eq!(serde_json::to_value(&node).unwrap(), value);
    }
}
