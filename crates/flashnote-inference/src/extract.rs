//! Extraction of a [`Directive`] from the model's tagged output.
//!
//! The classifier emits a pseudo-structured block: opening/closing
//! sentinel tags wrapping flat key/value child tags. Model output is not
//! guaranteed well-formed, so the parser distinguishes two failure
//! classes:
//!
//! - **Tolerated formatting noise** — a redundant echo of the opening
//!   sentinel, surrounding whitespace, children in any order, unknown
//!   child tags (ignored), empty optional values (treated as absent),
//!   repeated children (last occurrence wins).
//! - **Structural invalidity** — missing closing sentinel, unbalanced or
//!   nested tags, stray text between children, missing/garbled field
//!   values. These are `Error::Parse`; a partial or corrupt `Directive`
//!   is never produced.

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use flashnote_core::defaults::{OUTPUT_CLOSE_TAG, OUTPUT_OPEN_TAG};
use flashnote_core::{Direction, Directive, Error, RelativeDay, Result};

/// Parse the normalized reply content into a directive.
pub fn parse_directive(content: &str) -> Result<Directive> {
    let mut body = content.trim();

    if !body.starts_with(OUTPUT_OPEN_TAG) {
        return Err(Error::Parse("missing opening sentinel".to_string()));
    }
    // Some models echo the opening sentinel they were primed with.
    while let Some(stripped) = body.strip_prefix(OUTPUT_OPEN_TAG) {
        body = stripped.trim_start();
    }

    let Some(inner) = body.strip_suffix(OUTPUT_CLOSE_TAG) else {
        return Err(Error::Parse("missing closing sentinel".to_string()));
    };

    let fields = parse_children(inner.trim())?;
    directive_from_fields(fields)
}

/// Scan the flat `<key>value</key>` children inside the sentinel block.
fn parse_children(inner: &str) -> Result<Vec<(String, String)>> {
    let mut fields = Vec::new();
    let mut rest = inner.trim_start();

    while !rest.is_empty() {
        if !rest.starts_with('<') {
            return Err(Error::Parse("stray text between tags".to_string()));
        }
        let Some(end) = rest.find('>') else {
            return Err(Error::Parse("unterminated tag".to_string()));
        };
        let name = &rest[1..end];
        if let Some(closer) = name.strip_prefix('/') {
            return Err(Error::Parse(format!("unmatched closing tag </{}>", closer)));
        }
        if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c == '<') {
            return Err(Error::Parse(format!("malformed tag <{}>", name)));
        }
        rest = &rest[end + 1..];

        let Some(lt) = rest.find('<') else {
            return Err(Error::Parse(format!("unclosed tag <{}>", name)));
        };
        let value = rest[..lt].trim();
        rest = &rest[lt..];

        let closing = format!("</{}>", name);
        let Some(after) = rest.strip_prefix(closing.as_str()) else {
            return Err(Error::Parse(format!("unbalanced nesting inside <{}>", name)));
        };
        rest = after.trim_start();
        fields.push((name.to_string(), value.to_string()));
    }

    Ok(fields)
}

fn directive_from_fields(fields: Vec<(String, String)>) -> Result<Directive> {
    let mut directive = Directive::default();
    let mut direction = None;

    for (name, value) in fields {
        // Empty values read as "field absent" — models sometimes emit
        // placeholder tags.
        if value.is_empty() {
            continue;
        }
        match name.as_str() {
            "direction" => {
                direction = Some(match value.as_str() {
                    "0" => Direction::NoOp,
                    "1" => Direction::Schedule,
                    other => {
                        return Err(Error::Parse(format!("unrecognized direction '{}'", other)))
                    }
                });
            }
            "description" => directive.description = Some(value),
            "date" => {
                let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                    .map_err(|_| Error::Parse(format!("unparseable date '{}'", value)))?;
                directive.date = Some(date);
            }
            "time" => {
                let time = NaiveTime::parse_from_str(&value, "%H:%M")
                    .map_err(|_| Error::Parse(format!("unparseable time '{}'", value)))?;
                directive.time = Some(time);
            }
            "relativeDate" => {
                let day: RelativeDay = value
                    .parse()
                    .map_err(|_| Error::Parse(format!("unknown relative date '{}'", value)))?;
                directive.relative_date = Some(day);
            }
            "earlyMinute" => {
                let minutes: u32 = value
                    .parse()
                    .map_err(|_| Error::Parse(format!("unparseable earlyMinute '{}'", value)))?;
                directive.early_minute_offset = Some(minutes);
            }
            "laterHour" => {
                let hours: f64 = value
                    .parse()
                    .map_err(|_| Error::Parse(format!("unparseable laterHour '{}'", value)))?;
                directive.later_hour_offset = Some(hours);
            }
            other => {
                debug!(tag = other, "ignoring unknown child tag");
            }
        }
    }

    let Some(direction) = direction else {
        return Err(Error::Parse("missing direction".to_string()));
    };
    directive.direction = direction;
    Ok(directive)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
