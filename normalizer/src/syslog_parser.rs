use crate::{
    base_parser::{Parser, ParserFactory},
    Options, ParseError, ParseOutcome, Payload, Record, Schema,
};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

/// `Mon DD HH:MM:SS host application[pid]: message`, pid optional.
/// Word, digit and space classes are ASCII-only; the message may hold any text.
static SYSLOG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?-u)(?P<timestamp>^\w{3}\s\d{2}\s(\d{2}:?)+)\s(?P<host>(\w[-]*)+)\s(?P<application>\w+)(\[\w+\])*:\s(?P<message>(?u:.*)$)",
    )
    .expect("Invalid syslog regex pattern")
});

/// Syslog parser - projects the named capture groups requested by the schema
///
/// Examples:
///   Jan 10 19:35:33 vagrant-ubuntu-trusty-64 sudo: session opened for root
///   Jan 10 19:35:13 vagrant-ubuntu-precise-32 ssh[13941]: login for mike
///
/// Schema fields must be among `timestamp`, `host`, `application`, `message`.
pub struct SyslogParser {
    schema: Schema,
    options: Options,
}

impl ParserFactory for SyslogParser {
    const ID: &'static str = "syslog";

    fn new(schema: Schema, options: Options) -> Self {
        Self { schema, options }
    }
}

impl Parser for SyslogParser {
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
        let line = text.strip_suffix('\n').unwrap_or(text);

        let Some(captures) = SYSLOG_RE.captures(line) else {
            debug!("syslog regex did not match: {:?}", line);
            return Err(ParseError::NoMatch);
        };

        let mut record = Record::new();
        for key in self.schema.keys() {
            let group = captures.name(key).ok_or_else(|| {
                ParseError::Misconfigured(format!("syslog has no capture group for schema field [{key}]"))
            })?;
            record.insert(key.to_string(), Value::String(group.as_str().to_string()));
        }

        Ok(vec![record])
    }
}
