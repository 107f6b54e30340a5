use crate::{
    base_parser::{Parser, ParserFactory},
    JsonParser, Options, ParseError, ParseOutcome, Payload, Schema,
};
use flate2::read::{GzDecoder, ZlibDecoder};
use std::io::Read;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Gzip-JSON parser - inflates the payload and hands it to a [`JsonParser`]
///
/// Accepts both gzip-wrapped and raw zlib streams. Records are labelled as
/// plain JSON so consumers treat them the same way.
pub struct GzipJsonParser {
    json: JsonParser,
}

/// Inflate a gzip or zlib stream, chosen by the gzip magic bytes.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, ParseError> {
    let mut buffer = Vec::new();
    if data.starts_with(&GZIP_MAGIC) {
        GzDecoder::new(data).read_to_end(&mut buffer)?;
    } else {
        ZlibDecoder::new(data).read_to_end(&mut buffer)?;
    }
    Ok(buffer)
}

impl ParserFactory for GzipJsonParser {
    const ID: &'static str = "gzip-json";

    fn new(schema: Schema, options: Options) -> Self {
        Self {
            json: JsonParser::new(schema, options),
        }
    }
}

impl Parser for GzipJsonParser {
    fn name(&self) -> &'static str {
        Self::ID
    }

    fn declared_type(&self) -> &'static str {
        self.json.declared_type()
    }

    fn schema(&self) -> &Schema {
        self.json.schema()
    }

    fn options(&self) -> &Options {
        self.json.options()
    }

    fn parse(&mut self, data: Payload<'_>) -> ParseOutcome {
        let compressed = match data {
            Payload::Raw(bytes) => bytes,
            Payload::Decoded(_) => {
                return Err(ParseError::MalformedInput(
                    "expected compressed bytes, got a decoded structure".to_string(),
                ))
            }
        };

        let inflated = decompress(compressed).map_err(|err| {
            debug!("gzip decompression failed: {}", err);
            err
        })?;
        debug!("Inflated {} bytes to {} bytes", compressed.len(), inflated.len());

        self.json.parse(Payload::Raw(&inflated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use serde_json::{json, Value};
    use std::io::Write;

    const PAYLOAD: &str = r#"{"Records": [{"eventName": "PutObject", "bucket": "logs"}]}"#;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn parsers() -> (GzipJsonParser, JsonParser) {
        let schema: Schema = serde_json::from_value(json!({"eventName": "string", "bucket": "string"})).unwrap();
        let options: Options = serde_json::from_value(json!({"json_path": "Records[*]"})).unwrap();
        (
            GzipJsonParser::new(schema.clone(), options.clone()),
            JsonParser::new(schema, options),
        )
    }

    #[test]
    fn test_gzip_matches_plain_json() {
        let (mut gzip_parser, mut json_parser) = parsers();

        let from_gzip = gzip_parser.parse(Payload::from(&gzip(PAYLOAD.as_bytes()))).unwrap();
        let from_json = json_parser.parse(PAYLOAD.into()).unwrap();

        assert_eq!(from_gzip, from_json);
        assert_eq!(from_gzip[0]["bucket"], Value::from("logs"));
    }

    #[test]
    fn test_zlib_stream_accepted() {
        let (mut gzip_parser, _) = parsers();
        let records = gzip_parser.parse(Payload::from(&zlib(PAYLOAD.as_bytes()))).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_uncompressed_input_rejected() {
        let (mut gzip_parser, _) = parsers();
        let err = gzip_parser.parse(PAYLOAD.into()).unwrap_err();
        assert!(matches!(err, ParseError::MalformedInput(_)));
    }

    #[test]
    fn test_truncated_gzip_rejected() {
        let (mut gzip_parser, _) = parsers();
        let compressed = gzip(PAYLOAD.as_bytes());
        let truncated = &compressed[..compressed.len() / 2];
        assert!(gzip_parser.parse(truncated.into()).is_err());
    }

    #[test]
    fn test_gzip_reports_json_type() {
        let (gzip_parser, _) = parsers();
        assert_eq!(gzip_parser.name(), "gzip-json");
        assert_eq!(gzip_parser.declared_type(), "json");
    }
}
