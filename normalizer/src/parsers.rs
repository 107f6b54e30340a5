//! Central parser registration module
//!
//! Every built-in format is listed once in `all_parsers()`. To add a format:
//! 1. Create the parser file (e.g., cef_parser.rs) implementing `Parser` and `ParserFactory`
//! 2. Export it in lib.rs: `pub mod cef_parser; pub use cef_parser::CefParser;`
//! 3. Add the type to the `register_parsers!` list below
//!
//! The registry picks the list up at startup; no other file needs to change.

use crate::base_parser::ParserConstructor;
use crate::{CsvParser, GzipJsonParser, JsonParser, KvParser, SyslogParser};

/// Expands parser types into `(id, constructor)` registry entries
///
/// Usage:
/// ```rust,ignore
/// register_parsers![
///     JsonParser,
///     CsvParser,
///     CefParser,     // <-- Just add parser type here
/// ]
/// ```
#[macro_export]
macro_rules! register_parsers {
    ($($parser:ty),* $(,)?) => {
        vec![
            $((
                <$parser as $crate::base_parser::ParserFactory>::ID,
                <$parser as $crate::base_parser::ParserFactory>::boxed as $crate::base_parser::ParserConstructor,
            )),*
        ]
    };
}

/// Returns the `(id, constructor)` pair of every built-in parser.
pub fn all_parsers() -> Vec<(&'static str, ParserConstructor)> {
    register_parsers![
        JsonParser,
        GzipJsonParser,
        CsvParser,
        KvParser,
        SyslogParser,
    ]
}
