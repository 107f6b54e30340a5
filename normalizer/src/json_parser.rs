use crate::record_extractor::{extract_envelope, extract_records, ENVELOPE_FIELD};
use crate::{
    base_parser::{Parser, ParserFactory},
    FieldType, Options, ParseError, ParseOutcome, Payload, Record, Schema,
};
use serde_json::Value;
use tracing::debug;

/// JSON parser - validates decoded objects against the schema's exact key set
///
/// With `json_path` set, nested records are pulled out of the payload, and
/// `envelope_keys` hoists root fields into each of them. With
/// `optional_top_level_keys` set, absent keys get type defaults.
///
/// Optional and envelope keys are merged into `schema` and stay there for the
/// life of the parser, so later calls validate against the extended schema.
pub struct JsonParser {
    schema: Schema,
    options: Options,
}

impl JsonParser {
    fn decode(data: Payload<'_>) -> Result<Value, ParseError> {
        match data {
            Payload::Raw(bytes) => serde_json::from_slice(bytes).map_err(|err| {
                debug!("JSON parse failed: {}", err);
                ParseError::from(err)
            }),
            Payload::Decoded(value) => Ok(value),
        }
    }

    /// Expand a decoded payload into candidate records.
    fn parse_records(&mut self, mut payload: Value) -> Result<Vec<Value>, ParseError> {
        if self.options.is_empty() {
            return Ok(vec![payload]);
        }

        if let Some(optional_keys) = self.options.optional_top_level_keys.as_ref() {
            for (name, field_type) in optional_keys.iter() {
                self.schema.insert(name, field_type.clone());
                if let Value::Object(fields) = &mut payload {
                    if !fields.contains_key(name) {
                        fields.insert(name.to_string(), field_type.default_value());
                    }
                }
            }
        }

        let mut records = Vec::new();
        if let Some(json_path) = self.options.json_path.as_deref().filter(|path| !path.is_empty()) {
            let mut envelope = Record::new();
            if let Some(envelope_keys) = self.options.envelope_keys.as_ref().filter(|keys| !keys.is_empty()) {
                self.schema.insert(ENVELOPE_FIELD, FieldType::Nested(envelope_keys.clone()));
                envelope = extract_envelope(&payload, envelope_keys);
            }

            for mut record in extract_records(&payload, json_path)? {
                if !envelope.is_empty() {
                    if let Value::Object(fields) = &mut record {
                        fields.insert(ENVELOPE_FIELD.to_string(), Value::Object(envelope.clone()));
                    }
                }
                records.push(record);
            }
        }

        if records.is_empty() {
            records.push(payload);
        }

        Ok(records)
    }

    /// Keep only candidates whose keys match the schema, one level deep.
    fn key_check(&self, candidates: Vec<Value>) -> Vec<Record> {
        candidates
            .into_iter()
            .filter_map(|candidate| match candidate {
                Value::Object(record) => Some(record),
                other => {
                    debug!("JSON candidate is not an object: {}", other);
                    None
                }
            })
            .filter(|record| self.matches_schema(record))
            .collect()
    }

    fn matches_schema(&self, record: &Record) -> bool {
        if !self.schema.matches_keys(record) {
            debug!(
                "JSON key mismatch: {:?} vs. {:?}",
                record.keys().collect::<Vec<_>>(),
                self.schema.keys().collect::<Vec<_>>()
            );
            return false;
        }

        // An empty nested schema leaves the sub-mapping unconstrained.
        self.schema.iter().all(|(key, field_type)| match field_type {
            FieldType::Nested(nested) if !nested.is_empty() => match record.get(key) {
                Some(Value::Object(sub_record)) if nested.matches_keys(sub_record) => true,
                _ => {
                    debug!("JSON nested key mismatch for [{}]", key);
                    false
                }
            },
            _ => true,
        })
    }
}

impl ParserFactory for JsonParser {
    const ID: &'static str = "json";

    fn new(schema: Schema, options: Options) -> Self {
        Self { schema, options }
    }
}

impl Parser for JsonParser {
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
        let payload = Self::decode(data)?;
        let candidates = self.parse_records(payload)?;
        let candidate_count = candidates.len();

        let records = self.key_check(candidates);
        if records.is_empty() {
            return Err(ParseError::SchemaMismatch(format!(
                "none of {candidate_count} JSON record(s) matched the schema"
            )));
        }

        debug!("JSON parsing complete: {} of {} records valid", records.len(), candidate_count);
        Ok(records)
    }
}
