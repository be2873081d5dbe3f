//! Resolve free-form date and time phrases to absolute instants.
//!
//! An expression is a sequence of items in any order, each supplying one
//! kind of fact:
//!
//! ```text
//! 10:30 pm
//! July 4, 1976
//! 7/4/76 est
//! next friday
//! 3 days ago
//! 10:30 july 4 1976 edt 2 weeks
//! ```
//!
//! At most one time, one named zone, one calendar date, and one weekday may
//! appear; relative offsets ("3 days", "2 weeks ago") may repeat and
//! accumulate. Missing pieces default from a caller-supplied [`Reference`]:
//! the date defaults to the reference's local date, the time to midnight,
//! the zone to the reference zone.
//!
//! ```
//! use datephrase::{resolve, Reference};
//!
//! // 2024-07-10 12:34:56 UTC.
//! let reference = Reference::new(1720614896, 0);
//!
//! let t = resolve("july 4, 1976", &reference).unwrap();
//! assert_eq!(t, 205286400);
//! ```

use chrono::{Offset, TimeZone};
use thiserror::Error;

mod convert;
mod lexer;
mod parser;

/// Reasons an expression fails to resolve.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A word in the input matched no known keyword.
    #[error("unrecognized word: {0}")]
    UnrecognizedWord(String),
    /// The input did not match the grammar.
    #[error("expression is not a valid date")]
    Syntax,
    /// More than one item of the named category appeared.
    #[error("more than one {0} item")]
    Ambiguous(&'static str),
    /// A date or time component was out of range, or the result fell
    /// before 1970.
    #[error("date or time component out of range")]
    Range,
}

/// How to decide whether daylight-saving time is in effect at an instant.
/// The rule is consulted both for reading the reference clock and for
/// instants the expression itself produces.
#[derive(Copy, Clone, Debug, Default)]
pub enum DaylightRule {
    /// Daylight time never applies.
    #[default]
    Never,
    /// Daylight time always applies.
    Always,
    /// Ask the supplied function, instant by instant.
    Lookup(fn(i64) -> bool),
}

impl DaylightRule {
    pub(crate) fn active(&self, instant: i64) -> bool {
        match self {
            DaylightRule::Never => false,
            DaylightRule::Always => true,
            DaylightRule::Lookup(f) => f(instant),
        }
    }
}

/// The instant and zone that anchor an expression: "now" for relative
/// offsets and weekdays, and the source of every defaulted field.
#[derive(Copy, Clone, Debug)]
pub struct Reference {
    /// Seconds since the Unix epoch.
    pub instant: i64,
    /// Standard-time minutes west of UTC. Eastern US is 300, central
    /// Europe is -60.
    pub zone_minutes: i64,
    /// Daylight-saving rule for this zone.
    pub daylight: DaylightRule,
}

impl Reference {
    /// A reference with no daylight-saving time.
    pub fn new(instant: i64, zone_minutes: i64) -> Self {
        Reference {
            instant,
            zone_minutes,
            daylight: DaylightRule::Never,
        }
    }

    pub fn with_daylight_rule(instant: i64, zone_minutes: i64, daylight: DaylightRule) -> Self {
        Reference {
            instant,
            zone_minutes,
            daylight,
        }
    }

    /// Anchor at a zone-aware [`chrono`] datetime. The datetime's own
    /// offset is taken as the standard offset, so daylight handling stays
    /// [`DaylightRule::Never`] unless overridden.
    pub fn from_datetime<Tz: TimeZone>(datetime: &chrono::DateTime<Tz>) -> Self {
        let west = -i64::from(datetime.offset().fix().local_minus_utc()) / 60;
        Reference::new(datetime.timestamp(), west)
    }
}

/// Resolve an expression to seconds since the Unix epoch.
///
/// An empty expression resolves to the reference's most recent local
/// midnight. A lone zone name does the same, read in that zone.
pub fn resolve(input: &str, reference: &Reference) -> Result<i64, Error> {
    let tokens = lexer::lex(input);
    let today = convert::civil(reference, reference.instant);
    let mut acc = parser::Accumulator::new(
        today.year,
        today.month,
        today.day,
        reference.zone_minutes,
    );
    parser::parse(&tokens, &mut acc)?;
    convert::resolve(&acc, reference)
}
