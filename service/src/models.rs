use normalizer::{Options, Record, Schema};
use serde::{Deserialize, Serialize};

/// `config` part of a parse upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseConfig {
    pub schema: Schema,
    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub record: Record,
    /// Result of the `log_patterns` option, absent when none are configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResponse {
    pub parser: String,
    pub declared_type: String,
    pub records: Vec<ClassifiedRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserList {
    pub parsers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}
