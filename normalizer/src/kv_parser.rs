use crate::{
    base_parser::{Parser, ParserFactory},
    Options, ParseError, ParseOutcome, Payload, Record, Schema,
};
use serde_json::Value;
use tracing::{debug, warn};

const DEFAULT_DELIMITER: &str = " ";
const DEFAULT_SEPARATOR: &str = "=";

/// Key-value parser - turns `k1=v1 k2=v2` style text into a single record
///
/// The payload must hold exactly as many non-empty fields as the schema
/// declares. A field without a `key<separator>value` shape is skipped.
/// When a key repeats, the value is stored under the schema field declared
/// at that field's position instead.
pub struct KvParser {
    schema: Schema,
    options: Options,
}

impl KvParser {
    fn option<'a>(value: Option<&'a str>, default: &'static str, name: &str) -> Result<&'a str, ParseError> {
        match value {
            None => Ok(default),
            Some("") => Err(ParseError::Misconfigured(format!("kv {name} must not be empty"))),
            Some(value) => Ok(value),
        }
    }
}

impl ParserFactory for KvParser {
    const ID: &'static str = "kv";

    fn new(schema: Schema, options: Options) -> Self {
        Self { schema, options }
    }
}

impl Parser for KvParser {
    fn name(&self) -> &'static str {
        Self::ID
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn parse(&mut self, data: Payload<'_>) -> ParseOutcome {
        // delimiter sits between pairs, separator between key and value
        let delimiter = Self::option(self.options.delimiter.as_deref(), DEFAULT_DELIMITER, "delimiter")?;
        let separator = Self::option(self.options.separator.as_deref(), DEFAULT_SEPARATOR, "separator")?;

        let text = data.text()?;
        let fields: Vec<&str> = text.split(delimiter).filter(|field| !field.is_empty()).collect();
        if fields.len() != self.schema.len() {
            debug!("KV field length mismatch: {:?} vs {:?}", fields, self.schema.keys().collect::<Vec<_>>());
            return Err(ParseError::SchemaMismatch(format!(
                "payload has {} fields, schema declares {}",
                fields.len(),
                self.schema.len()
            )));
        }

        let mut record = Record::new();
        for (index, field) in fields.iter().enumerate() {
            let Some((key, value)) = field
                .split_once(separator)
                .filter(|(key, value)| !key.is_empty() && !value.is_empty())
            else {
                warn!("key/value split failure for {:?}", field);
                continue;
            };

            if record.contains_key(key) {
                if let Some(schema_key) = self.schema.key_at(index) {
                    debug!("duplicate key [{}], storing value under [{}]", key, schema_key);
                    record.insert(schema_key.to_string(), Value::String(value.to_string()));
                }
            } else {
                record.insert(key.to_string(), Value::String(value.to_string()));
            }
        }

        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ab() -> Schema {
        serde_json::from_value(json!({"a": "string", "b": "string"})).unwrap()
    }

    #[test]
    fn test_kv_parse_defaults() {
        let mut parser = KvParser::new(ab(), Options::default());
        let records = parser.parse("a=1 b=2".into()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(Value::Object(records[0].clone()), json!({"a": "1", "b": "2"}));
    }

    #[test]
    fn test_kv_empty_fields_discarded() {
        let mut parser = KvParser::new(ab(), Options::default());
        let records = parser.parse("  a=1    b=2 ".into()).unwrap();
        assert_eq!(records[0]["b"], json!("2"));
    }

    #[test]
    fn test_kv_field_count_mismatch() {
        let mut parser = KvParser::new(ab(), Options::default());
        assert!(matches!(parser.parse("a=1".into()), Err(ParseError::SchemaMismatch(_))));
        assert!(parser.parse("a=1 b=2 c=3".into()).is_err());
    }

    #[test]
    fn test_kv_duplicate_key_uses_schema_position() {
        let mut parser = KvParser::new(ab(), Options::default());
        let records = parser.parse("a=1 a=2".into()).unwrap();

        assert_eq!(Value::Object(records[0].clone()), json!({"a": "1", "b": "2"}));
    }

    #[test]
    fn test_kv_malformed_field_skipped() {
        let mut parser = KvParser::new(ab(), Options::default());
        let records = parser.parse("a=1 junk".into()).unwrap();

        assert_eq!(Value::Object(records[0].clone()), json!({"a": "1"}));

        let records = parser.parse("=1 b=".into()).unwrap();
        assert!(records[0].is_empty());
    }

    #[test]
    fn test_kv_custom_delimiter_and_separator() {
        let options = Options {
            delimiter: Some(",".to_string()),
            separator: Some(":".to_string()),
            ..Options::default()
        };
        let mut parser = KvParser::new(ab(), options);

        let records = parser.parse("a:x y,b:http://host".into()).unwrap();
        assert_eq!(records[0]["a"], json!("x y"));
        assert_eq!(records[0]["b"], json!("http://host"));
    }

    #[test]
    fn test_kv_empty_separator_is_misconfiguration() {
        let options = Options {
            separator: Some(String::new()),
            ..Options::default()
        };
        let mut parser = KvParser::new(ab(), options);
        assert!(matches!(parser.parse("a=1 b=2".into()), Err(ParseError::Misconfigured(_))));
    }

    #[test]
    fn test_kv_invalid_utf8() {
        let mut parser = KvParser::new(ab(), Options::default());
        let bytes = b"a=\xff b=2";
        assert!(matches!(parser.parse(Payload::from(&bytes[..])), Err(ParseError::Encoding(_))));
    }
}
