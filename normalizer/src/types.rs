use crate::ParseError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single normalized record: field name to value, in insertion order.
pub type Record = Map<String, Value>;

/// Result of one `parse` call.
///
/// `Ok` always carries at least one record. Every expected malformation
/// (bad JSON, wrong column count, regex miss, corrupt compression) comes back
/// as `Err` so a pipeline can move on to the next parser/schema candidate.
pub type ParseOutcome = Result<Vec<Record>, ParseError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Integer,
    Float,
    Boolean,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Float => "float",
            PrimitiveType::Boolean => "boolean",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(PrimitiveType::String),
            "integer" => Some(PrimitiveType::Integer),
            "float" => Some(PrimitiveType::Float),
            "boolean" => Some(PrimitiveType::Boolean),
            _ => None,
        }
    }
}

/// Declared type of a schema field.
///
/// In configuration a primitive is written as its tag (`"string"`), a list as
/// `[]` and a nested schema as an object of sub-fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum FieldType {
    Primitive(PrimitiveType),
    List,
    Nested(Schema),
}

impl FieldType {
    /// Value injected for an absent optional key of this type.
    pub fn default_value(&self) -> Value {
        match self {
            FieldType::Primitive(PrimitiveType::String) => Value::String(String::new()),
            FieldType::Primitive(PrimitiveType::Integer) => Value::from(0),
            FieldType::Primitive(PrimitiveType::Float) => Value::from(0.0),
            FieldType::Primitive(PrimitiveType::Boolean) => Value::Bool(false),
            FieldType::List => Value::Array(Vec::new()),
            FieldType::Nested(_) => Value::Object(Map::new()),
        }
    }
}

impl TryFrom<Value> for FieldType {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(tag) => PrimitiveType::from_tag(&tag)
                .map(FieldType::Primitive)
                .ok_or_else(|| format!("unknown field type {tag:?}")),
            Value::Array(_) => Ok(FieldType::List),
            Value::Object(fields) => fields
                .into_iter()
                .map(|(name, ty)| FieldType::try_from(ty).map(|ty| (name, ty)))
                .collect::<Result<Schema, _>>()
                .map(FieldType::Nested),
            other => Err(format!("invalid field type declaration: {other}")),
        }
    }
}

impl From<FieldType> for Value {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Primitive(primitive) => Value::String(primitive.as_str().to_string()),
            FieldType::List => Value::Array(Vec::new()),
            FieldType::Nested(schema) => Value::Object(
                schema
                    .0
                    .into_iter()
                    .map(|(name, ty)| (name, Value::from(ty)))
                    .collect(),
            ),
        }
    }
}

/// Ordered field contract a record must satisfy.
///
/// Order is positional for CSV and KV; for JSON only the key set matters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(IndexMap<String, FieldType>);

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Field name declared at `index`.
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.0.get_index(index).map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldType> {
        self.0.get(name)
    }

    /// Adds or replaces a field. A replaced field keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, field_type: FieldType) {
        self.0.insert(name.into(), field_type);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.0.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    /// True when the record has exactly this schema's key set.
    pub fn matches_keys(&self, record: &Record) -> bool {
        record.len() == self.0.len() && record.keys().all(|key| self.0.contains_key(key))
    }
}

impl<K: Into<String>> FromIterator<(K, FieldType)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, FieldType)>>(iter: I) -> Self {
        Schema(iter.into_iter().map(|(name, ty)| (name.into(), ty)).collect())
    }
}

/// Per-parser configuration. Absent keys take each parser's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Path query selecting nested records (JSON family).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    /// Root fields hoisted into every extracted record (JSON family).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope_keys: Option<Schema>,
    /// Fields that may be absent; defaults are injected (JSON family).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional_top_level_keys: Option<Schema>,
    /// Field separator (CSV, KV).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    /// Key/value separator within a field (KV).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    /// Patterns used to classify records produced by this parser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_patterns: Option<PatternSet>,
}

impl Options {
    pub fn is_empty(&self) -> bool {
        self.json_path.is_none()
            && self.envelope_keys.is_none()
            && self.optional_top_level_keys.is_none()
            && self.delimiter.is_none()
            && self.separator.is_none()
            && self.log_patterns.is_none()
    }
}

/// Pattern for one field: a glob list, a nested set, or anything else
/// (kept so it can be reported and skipped at match time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternRule {
    Globs(Vec<String>),
    Nested(PatternSet),
    Invalid(Value),
}

/// Per-field glob pattern lists used to classify parsed records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternSet(IndexMap<String, PatternRule>);

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn insert(&mut self, field: impl Into<String>, rule: PatternRule) {
        self.0.insert(field.into(), rule);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatternRule)> {
        self.0.iter().map(|(field, rule)| (field.as_str(), rule))
    }
}

impl<K: Into<String>> FromIterator<(K, PatternRule)> for PatternSet {
    fn from_iter<I: IntoIterator<Item = (K, PatternRule)>>(iter: I) -> Self {
        PatternSet(iter.into_iter().map(|(field, rule)| (field.into(), rule)).collect())
    }
}

/// Input handed to `Parser::parse`.
#[derive(Debug, Clone)]
pub enum Payload<'a> {
    /// Raw text or compressed bytes.
    Raw(&'a [u8]),
    /// An already-decoded structure (JSON family only).
    Decoded(Value),
}

impl<'a> Payload<'a> {
    /// Borrows the payload as UTF-8 text.
    pub fn text(&self) -> Result<&'a str, ParseError> {
        match *self {
            Payload::Raw(bytes) => Ok(std::str::from_utf8(bytes)?),
            Payload::Decoded(_) => Err(ParseError::MalformedInput(
                "expected raw text, got a decoded structure".to_string(),
            )),
        }
    }
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(text: &'a str) -> Self {
        Payload::Raw(text.as_bytes())
    }
}

impl<'a> From<&'a String> for Payload<'a> {
    fn from(text: &'a String) -> Self {
        Payload::Raw(text.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Payload::Raw(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Payload<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Payload::Raw(bytes.as_slice())
    }
}

impl From<Value> for Payload<'_> {
    fn from(value: Value) -> Self {
        Payload::Decoded(value)
    }
}
