//! Post-parse classification of records against glob pattern sets.

use crate::{PatternRule, PatternSet, Record};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// Returns true if every patterned field found in `record` matches at least
/// one of its globs.
///
/// Fields that are missing from the record, hold a non-string value, or whose
/// rule is not a glob list are skipped and do not vote. If nothing votes the
/// result is false. A nested pattern set decides the whole result on its own:
/// it is evaluated against the record's sub-mapping and returned as soon as
/// it is reached, ignoring sibling fields.
pub fn matches_patterns(parser_type: &str, record: &Record, patterns: &PatternSet) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let mut results = Vec::with_capacity(patterns.len());
    for (field, rule) in patterns.iter() {
        let globs = match rule {
            PatternRule::Nested(nested) => {
                return match record.get(field) {
                    Some(Value::Object(sub_record)) => matches_patterns(parser_type, sub_record, nested),
                    _ => {
                        debug!("nested log pattern field [{}] is not a mapping in this record", field);
                        false
                    }
                };
            }
            PatternRule::Globs(globs) => globs,
            PatternRule::Invalid(value) => {
                debug!("log patterns for [{}] should be a list, got: {}", field, value);
                continue;
            }
        };

        let value = match record.get(field) {
            Some(Value::String(value)) => value,
            Some(other) => {
                debug!("log pattern field [{}] holds a non-string value: {}", field, other);
                continue;
            }
            None => {
                debug!("declared log pattern field [{}] is not a valid field for this record", field);
                continue;
            }
        };

        results.push(globs.iter().any(|pattern| glob_match(pattern, value)));
    }

    debug!("{} pattern result: {:?}", parser_type, results);

    !results.is_empty() && results.iter().all(|matched| *matched)
}

fn glob_match(pattern: &str, value: &str) -> bool {
    match Regex::new(&translate(pattern)) {
        Ok(compiled) => compiled.is_match(value),
        Err(err) => {
            warn!("invalid log pattern {:?}: {}", pattern, err);
            false
        }
    }
}

/// Translates a shell glob into an anchored regex with fnmatch semantics.
///
/// `*` and `?` also match `/` and newlines, `[!...]` negates a set, and a `[`
/// without a closing `]` is a literal. Matching is case-sensitive.
fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("(?s)^");
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                while chars.get(i) == Some(&'*') {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => out.push('.'),
            '[' => {
                let mut j = i;
                if chars.get(j) == Some(&'!') {
                    j += 1;
                }
                if chars.get(j) == Some(&']') {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }

                if j >= chars.len() {
                    out.push_str(r"\[");
                    continue;
                }

                let set = &chars[i..j];
                i = j + 1;
                out.push('[');
                let members = match set.first() {
                    Some('!') => {
                        out.push('^');
                        &set[1..]
                    }
                    _ => set,
                };
                for &member in members {
                    // `-` stays a range operator; everything else is literal
                    match member {
                        '\\' | '[' | ']' | '^' | '&' | '~' => {
                            out.push('\\');
                            out.push(member);
                        }
                        _ => out.push(member),
                    }
                }
                out.push(']');
            }
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    out.push('$');
    out
}
