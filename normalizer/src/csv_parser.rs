use crate::{
    base_parser::{Parser, ParserFactory},
    Options, ParseError, ParseOutcome, Payload, Record, Schema,
};
use csv::ReaderBuilder;
use serde_json::Value;
use tracing::debug;

const DEFAULT_DELIMITER: u8 = b',';

/// CSV parser - maps each headerless row positionally onto the schema
///
/// All-or-nothing: one row with the wrong column count rejects the payload.
pub struct CsvParser {
    schema: Schema,
    options: Options,
}

impl CsvParser {
    fn delimiter(&self) -> Result<u8, ParseError> {
        match self.options.delimiter.as_deref() {
            None => Ok(DEFAULT_DELIMITER),
            Some(delimiter) if delimiter.len() == 1 => Ok(delimiter.as_bytes()[0]),
            Some(delimiter) => Err(ParseError::Misconfigured(format!(
                "csv delimiter must be a single byte, got {delimiter:?}"
            ))),
        }
    }
}

/// True when a line outside quoted fields is empty. Each such line is a
/// zero-field row; the csv reader would skip it silently. A single trailing
/// newline does not start a row.
fn has_blank_row(text: &str, delimiter: u8) -> bool {
    let bytes = text.as_bytes();
    let mut in_quotes = false;
    let mut field_start = true;
    let mut line_empty = true;

    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if in_quotes {
            if byte == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    in_quotes = false;
                }
            }
        } else if byte == b'\n' {
            if line_empty {
                return true;
            }
            line_empty = true;
            field_start = true;
        } else if !(byte == b'\r' && bytes.get(i + 1) == Some(&b'\n')) {
            line_empty = false;
            in_quotes = byte == b'"' && field_start;
            field_start = byte == delimiter;
        }
        i += 1;
    }

    false
}

impl ParserFactory for CsvParser {
    const ID: &'static str = "csv";

    fn new(schema: Schema, options: Options) -> Self {
        Self { schema, options }
    }
}

impl Parser for CsvParser {
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
        let text = data.text()?;
        let delimiter = self.delimiter()?;
        if !self.schema.is_empty() && has_blank_row(text, delimiter) {
            debug!("csv key mismatch: 0 vs. {}", self.schema.len());
            return Err(ParseError::SchemaMismatch(format!(
                "blank row has 0 fields, schema declares {}",
                self.schema.len()
            )));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            if row.len() != self.schema.len() {
                debug!("csv key mismatch: {} vs. {}", row.len(), self.schema.len());
                return Err(ParseError::SchemaMismatch(format!(
                    "row has {} fields, schema declares {}",
                    row.len(),
                    self.schema.len()
                )));
            }

            let record: Record = self
                .schema
                .keys()
                .zip(row.iter())
                .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                .collect();
            records.push(record);
        }

        if records.is_empty() {
            return Err(ParseError::SchemaMismatch("no csv rows".to_string()));
        }

        debug!("CSV parsing complete: {} rows", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn xyz() -> Schema {
        serde_json::from_value(json!({"x": "string", "y": "string", "z": "string"})).unwrap()
    }

    #[test]
    fn test_parse_basic_csv() {
        let mut parser = CsvParser::new(xyz(), Options::default());
        let records = parser.parse("a,b,c".into()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(Value::Object(records[0].clone()), json!({"x": "a", "y": "b", "z": "c"}));
        assert_eq!(records[0].keys().collect::<Vec<_>>(), ["x", "y", "z"]);
    }

    #[test]
    fn test_parse_multiple_rows_with_quotes() {
        let mut parser = CsvParser::new(xyz(), Options::default());
        let data = "a,b,c\n\"d, quoted\",e,f\n";
        let records = parser.parse(data.into()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["x"], json!("d, quoted"));
    }

    #[test]
    fn test_column_count_mismatch_fails_whole_payload() {
        let mut parser = CsvParser::new(xyz(), Options::default());

        assert!(matches!(parser.parse("a,b".into()), Err(ParseError::SchemaMismatch(_))));
        assert!(parser.parse("a,b,c\nd,e\n".into()).is_err());
        assert!(parser.parse("a,b,c\nd,e,f,g\n".into()).is_err());
    }

    #[test]
    fn test_blank_line_fails_whole_payload() {
        let mut parser = CsvParser::new(xyz(), Options::default());

        assert!(matches!(parser.parse("a,b,c\n\nd,e,f\n".into()), Err(ParseError::SchemaMismatch(_))));
        assert!(parser.parse("\na,b,c\n".into()).is_err());
        assert!(parser.parse("a,b,c\r\n\r\nd,e,f".into()).is_err());
        assert!(parser.parse("a,b,c\n\n".into()).is_err());
    }

    #[test]
    fn test_trailing_newline_and_quoted_newlines_accepted() {
        let mut parser = CsvParser::new(xyz(), Options::default());

        assert_eq!(parser.parse("a,b,c\n".into()).unwrap().len(), 1);
        assert_eq!(parser.parse("a,b,c\r\nd,e,f\r\n".into()).unwrap().len(), 2);

        let records = parser.parse("a,\"multi\n\nline\",c\nd,e,f\n".into()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["y"], json!("multi\n\nline"));

        let records = parser.parse("a,say \"hi\",c\n".into()).unwrap();
        assert_eq!(records[0]["y"], json!("say \"hi\""));
    }

    #[test]
    fn test_custom_delimiter() {
        let options = Options {
            delimiter: Some("|".to_string()),
            ..Options::default()
        };
        let mut parser = CsvParser::new(xyz(), options);

        let records = parser.parse("1|2|3".into()).unwrap();
        assert_eq!(records[0]["z"], json!("3"));
        assert!(parser.parse("1,2,3".into()).is_err());
    }

    #[test]
    fn test_multibyte_delimiter_is_misconfiguration() {
        let options = Options {
            delimiter: Some("::".to_string()),
            ..Options::default()
        };
        let mut parser = CsvParser::new(xyz(), options);
        assert!(matches!(parser.parse("a::b::c".into()), Err(ParseError::Misconfigured(_))));
    }

    #[test]
    fn test_empty_payload_fails() {
        let mut parser = CsvParser::new(xyz(), Options::default());
        assert!(parser.parse("".into()).is_err());
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let mut parser = CsvParser::new(xyz(), Options::default());
        let bytes = b"a,b,\xff";
        assert!(matches!(parser.parse(Payload::from(&bytes[..])), Err(ParseError::Encoding(_))));
    }
}
