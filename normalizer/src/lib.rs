// Schema-driven record normalization for raw log payloads
// Parsers share one trait and are selected by id through the registry

pub mod types;
pub mod base_parser;
pub mod registry_parser;
pub mod parsers;
pub mod record_extractor;
pub mod pattern_matcher;

// Individual parser implementations
pub mod json_parser;
pub mod gzip_json_parser;
pub mod csv_parser;
pub mod kv_parser;
pub mod syslog_parser;

// Re-export main types
pub use types::*;
pub use base_parser::{Parser, ParserConstructor, ParserFactory};
pub use registry_parser::ParserRegistry;
pub use pattern_matcher::matches_patterns;

// Re-export parsers
pub use json_parser::JsonParser;
pub use gzip_json_parser::GzipJsonParser;
pub use csv_parser::CsvParser;
pub use kv_parser::KvParser;
pub use syslog_parser::SyslogParser;

/// Why a payload was rejected by a parser.
///
/// These are routine outcomes: a caller usually tries the next parser or
/// schema rather than treating them as faults.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("payload did not match the expected log pattern")]
    NoMatch,
    #[error("invalid text encoding: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("parser misconfigured: {0}")]
    Misconfigured(String),
}

impl ParseError {
    /// Stable label for logs and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::MalformedInput(_) => "malformed_input",
            ParseError::SchemaMismatch(_) => "schema_mismatch",
            ParseError::NoMatch => "no_match",
            ParseError::Encoding(_) => "encoding_error",
            ParseError::Misconfigured(_) => "misconfigured",
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::MalformedInput(format!("JSON: {err}"))
    }
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        ParseError::MalformedInput(format!("CSV: {err}"))
    }
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::MalformedInput(err.to_string())
    }
}

/// Registry lookups fail only on misconfiguration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown parser: {0}")]
    UnknownParser(String),
}
