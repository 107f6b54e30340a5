use crate::{pattern_matcher, Options, ParseOutcome, PatternSet, Payload, Record, Schema};

/// Base trait that all parsers must implement
///
/// `parse` takes `&mut self` because the JSON family may extend its schema
/// while parsing; callers sharing one instance must serialize their calls.
pub trait Parser: Send + Sync {
    /// Returns the registry id of this parser (e.g., "json", "csv", "syslog")
    fn name(&self) -> &'static str;

    /// Type used to label downstream records. Wrapping parsers report the
    /// type of the format they unwrap to.
    fn declared_type(&self) -> &'static str {
        self.name()
    }

    fn schema(&self) -> &Schema;

    fn options(&self) -> &Options;

    /// Normalize one payload into records, or report why it does not fit.
    fn parse(&mut self, data: Payload<'_>) -> ParseOutcome;

    /// True if every patterned field present in `record` matches one of its globs.
    fn matches_patterns(&self, record: &Record, patterns: &PatternSet) -> bool {
        pattern_matcher::matches_patterns(self.declared_type(), record, patterns)
    }

    /// Classify `record` against the `log_patterns` option, false when unset.
    fn matched_log_patterns(&self, record: &Record) -> bool {
        self.options()
            .log_patterns
            .as_ref()
            .is_some_and(|patterns| self.matches_patterns(record, patterns))
    }
}

/// Builds a boxed parser from a schema and its options.
pub type ParserConstructor = fn(Schema, Options) -> Box<dyn Parser>;

/// Construction side of a parser, used to register it by id.
pub trait ParserFactory: Parser + Sized + 'static {
    const ID: &'static str;

    fn new(schema: Schema, options: Options) -> Self;

    fn boxed(schema: Schema, options: Options) -> Box<dyn Parser> {
        Box::new(Self::new(schema, options))
    }
}
