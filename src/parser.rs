use crate::lexer::{Meridian, Token};
use crate::Error;

/// Daylight-saving handling selected by the parsed expression.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DstMode {
    /// A daylight zone name was given; always apply the correction.
    Daylight,
    /// A standard zone name or explicit offset was given; never apply it.
    Standard,
    /// Nothing was given; whether the *computed* instant falls in daylight
    /// time decides, after the fact.
    Maybe,
}

/// One item of the grammar. An expression is zero or more items; each item
/// folds its facts into the [`Accumulator`] in input order.
#[derive(Debug, PartialEq, Eq)]
enum Item {
    /// A bare number: the year when a time and a date were already seen,
    /// otherwise a packed hhmm clock reading (1330 is 13:30).
    Number(i64),
    /// A clock reading, with an optional trailing zone offset written as a
    /// packed hhmm number ("10:30 500" is 10:30 five hours west).
    Time {
        hour: i64,
        minute: i64,
        second: i64,
        meridian: Meridian,
        zone: Option<i64>,
    },
    /// A named zone, standard or daylight.
    Zone { minutes: i64, mode: DstMode },
    /// A weekday with its occurrence ordinal ("next friday" is the second
    /// occurrence, counting the upcoming one as the first).
    Weekday { ordinal: i64, index: u32 },
    /// A calendar date; a missing year means the reference year.
    Date {
        month: i64,
        day: i64,
        year: Option<i64>,
    },
    /// A relative offset, with the number of trailing "ago" negations.
    Relative {
        seconds: i64,
        months: i64,
        negations: u32,
    },
}

impl Item {
    /// Parse one item from the front of the token stream, returning it and
    /// the number of tokens consumed. One token of lookahead at most, and
    /// no backtracking once a prefix commits: "july" with no day following
    /// is an error, not a bare word.
    fn parse(l: &[Token]) -> Option<(Self, usize)> {
        match *l.first()? {
            Token::Zone(minutes) => Some((
                Item::Zone {
                    minutes,
                    mode: DstMode::Standard,
                },
                1,
            )),
            Token::DayZone(minutes) => Some((
                Item::Zone {
                    minutes,
                    mode: DstMode::Daylight,
                },
                1,
            )),
            Token::Weekday(index) => {
                let tokens = if l.get(1) == Some(&Token::Comma) { 2 } else { 1 };
                Some((Item::Weekday { ordinal: 1, index }, tokens))
            }
            Token::Month(month) => Self::parse_month_first(l, i64::from(month)),
            Token::Unit(minutes) => Self::parse_relative(l, 1, 60 * minutes, 0),
            Token::MonthUnit(months) => Self::parse_relative(l, 1, 0, months),
            Token::SecUnit(_) => Self::parse_relative(l, 1, 1, 0),
            Token::Number(n) => Self::parse_number_first(l, n),
            _ => None,
        }
    }

    /// MONTH NUMBER [',' NUMBER] -- the comma commits to a year.
    fn parse_month_first(l: &[Token], month: i64) -> Option<(Self, usize)> {
        let Some(&Token::Number(day)) = l.get(1) else {
            return None;
        };
        let mut tokens = 2;
        let mut year = None;
        if l.get(tokens) == Some(&Token::Comma) {
            if let Some(&Token::Number(y)) = l.get(tokens + 1) {
                year = Some(y);
                tokens += 2;
            }
        }
        Some((Item::Date { month, day, year }, tokens))
    }

    fn parse_number_first(l: &[Token], n: i64) -> Option<(Self, usize)> {
        match l.get(1) {
            Some(&Token::Meridian(meridian)) => Some((
                Item::Time {
                    hour: n,
                    minute: 0,
                    second: 0,
                    meridian,
                    zone: None,
                },
                2,
            )),
            Some(Token::Colon) => Self::parse_clock(l, n),
            Some(Token::Slash) => {
                // NUMBER '/' NUMBER ['/' NUMBER]
                let Some(&Token::Number(day)) = l.get(2) else {
                    return None;
                };
                let mut tokens = 3;
                let mut year = None;
                if l.get(tokens) == Some(&Token::Slash) {
                    let Some(&Token::Number(y)) = l.get(tokens + 1) else {
                        return None;
                    };
                    year = Some(y);
                    tokens += 2;
                }
                Some((
                    Item::Date {
                        month: n,
                        day,
                        year,
                    },
                    tokens,
                ))
            }
            Some(&Token::Weekday(index)) => Some((Item::Weekday { ordinal: n, index }, 2)),
            Some(&Token::Month(month)) => {
                // NUMBER MONTH [NUMBER] -- day-first dates take the year
                // without a comma.
                let mut tokens = 2;
                let mut year = None;
                if let Some(&Token::Number(y)) = l.get(tokens) {
                    year = Some(y);
                    tokens += 1;
                }
                Some((
                    Item::Date {
                        month: i64::from(month),
                        day: n,
                        year,
                    },
                    tokens,
                ))
            }
            Some(&Token::Unit(minutes)) => {
                Self::parse_relative(l, 2, 60i64.wrapping_mul(n).wrapping_mul(minutes), 0)
            }
            Some(&Token::MonthUnit(months)) => {
                Self::parse_relative(l, 2, 0, n.wrapping_mul(months))
            }
            Some(&Token::SecUnit(seconds)) => {
                Self::parse_relative(l, 2, n.wrapping_mul(seconds), 0)
            }
            _ => Some((Item::Number(n), 1)),
        }
    }

    /// NUMBER ':' NUMBER [':' NUMBER] followed by an optional meridian, or
    /// an optional bare number naming a zone offset.
    fn parse_clock(l: &[Token], hour: i64) -> Option<(Self, usize)> {
        let Some(&Token::Number(minute)) = l.get(2) else {
            return None;
        };
        let mut tokens = 3;
        let mut second = 0;
        let mut meridian = Meridian::Hour24;
        let mut zone = None;

        if l.get(tokens) == Some(&Token::Colon) {
            let Some(&Token::Number(s)) = l.get(tokens + 1) else {
                return None;
            };
            second = s;
            tokens += 2;
        }

        match l.get(tokens) {
            Some(&Token::Meridian(m)) => {
                meridian = m;
                tokens += 1;
            }
            // A trailing number is a zone offset only when it does not
            // open another clock reading.
            Some(&Token::Number(z)) if l.get(tokens + 1) != Some(&Token::Colon) => {
                zone = Some(z);
                tokens += 1;
            }
            _ => {}
        }

        Some((
            Item::Time {
                hour,
                minute,
                second,
                meridian,
                zone,
            },
            tokens,
        ))
    }

    /// Consume any trailing "ago" repetitions of a relative item; each one
    /// negates the running totals again.
    fn parse_relative(
        l: &[Token],
        mut tokens: usize,
        seconds: i64,
        months: i64,
    ) -> Option<(Self, usize)> {
        let mut negations = 0;
        while l.get(tokens) == Some(&Token::Ago) {
            tokens += 1;
            negations += 1;
        }
        Some((
            Item::Relative {
                seconds,
                months,
                negations,
            },
            tokens,
        ))
    }
}

/// Parse-time record of the facts an expression has supplied. The category
/// counters count occurrences rather than flagging them; more than one item
/// in a category is rejected after the parse completes, not during it.
#[derive(Debug)]
pub struct Accumulator {
    pub time_seen: u32,
    pub zone_seen: u32,
    pub date_seen: u32,
    pub day_seen: u32,
    pub rel_seen: u32,

    pub hour: i64,
    pub minute: i64,
    pub second: i64,
    pub meridian: Meridian,

    pub month: i64,
    pub day: i64,
    pub year: i64,

    /// Minutes west of UTC, defaulting to the reference zone.
    pub zone_minutes: i64,
    pub dst: DstMode,

    pub day_ordinal: i64,
    pub day_index: u32,

    pub rel_seconds: i64,
    pub rel_months: i64,
}

impl Accumulator {
    /// Fresh per-call state: the reference's local civil date and zone,
    /// midnight on the 24-hour clock, daylight handling undecided.
    pub fn new(year: i64, month: i64, day: i64, zone_minutes: i64) -> Self {
        Accumulator {
            time_seen: 0,
            zone_seen: 0,
            date_seen: 0,
            day_seen: 0,
            rel_seen: 0,
            hour: 0,
            minute: 0,
            second: 0,
            meridian: Meridian::Hour24,
            month,
            day,
            year,
            zone_minutes,
            dst: DstMode::Maybe,
            day_ordinal: 0,
            day_index: 0,
            rel_seconds: 0,
            rel_months: 0,
        }
    }

    /// Fold one item's facts in. Each item bumps its category counter
    /// exactly once; a bare number is the only production whose meaning
    /// depends on what came before it.
    fn apply(&mut self, item: &Item) {
        match *item {
            Item::Number(n) => {
                if self.time_seen > 0 && self.date_seen > 0 && self.rel_seen == 0 {
                    self.year = n;
                } else {
                    self.time_seen += 1;
                    self.hour = n / 100;
                    self.minute = n % 100;
                    self.second = 0;
                    self.meridian = Meridian::Hour24;
                }
            }
            Item::Time {
                hour,
                minute,
                second,
                meridian,
                zone,
            } => {
                self.time_seen += 1;
                self.hour = hour;
                self.minute = minute;
                self.second = second;
                self.meridian = meridian;
                if let Some(z) = zone {
                    self.zone_minutes = z % 100 + 60 * (z / 100);
                    self.dst = DstMode::Standard;
                }
            }
            Item::Zone { minutes, mode } => {
                self.zone_seen += 1;
                self.zone_minutes = minutes;
                self.dst = mode;
            }
            Item::Weekday { ordinal, index } => {
                self.day_seen += 1;
                self.day_ordinal = ordinal;
                self.day_index = index;
            }
            Item::Date { month, day, year } => {
                self.date_seen += 1;
                self.month = month;
                self.day = day;
                if let Some(y) = year {
                    self.year = y;
                }
            }
            Item::Relative {
                seconds,
                months,
                negations,
            } => {
                self.rel_seen += 1;
                self.rel_seconds = self.rel_seconds.wrapping_add(seconds);
                self.rel_months = self.rel_months.wrapping_add(months);
                for _ in 0..negations {
                    self.rel_seconds = self.rel_seconds.wrapping_neg();
                    self.rel_months = self.rel_months.wrapping_neg();
                }
            }
        }
    }

    /// At most one time, zone, date, and weekday item per expression; the
    /// relative category may repeat ("1 day 2 weeks").
    fn check(&self) -> Result<(), Error> {
        let counts = [
            (self.time_seen, "time"),
            (self.zone_seen, "zone"),
            (self.date_seen, "date"),
            (self.day_seen, "weekday"),
        ];
        for (count, category) in counts {
            if count > 1 {
                return Err(Error::Ambiguous(category));
            }
        }
        Ok(())
    }
}

/// Run the full token stream through the grammar, folding each item into
/// the accumulator in input order, and check the category counts.
pub fn parse(tokens: &[Token], acc: &mut Accumulator) -> Result<(), Error> {
    let mut pos = 0;
    while pos < tokens.len() {
        match Item::parse(&tokens[pos..]) {
            Some((item, used)) => {
                acc.apply(&item);
                pos += used;
            }
            None => {
                return Err(match &tokens[pos] {
                    Token::Ident(word) => Error::UnrecognizedWord(word.clone()),
                    _ => Error::Syntax,
                });
            }
        }
    }
    acc.check()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn fresh() -> Accumulator {
        // Reference date 2024-07-10, zone UTC.
        Accumulator::new(2024, 7, 10, 0)
    }

    #[test]
    fn test_clock_with_zone_number() {
        let mut acc = fresh();
        parse(&lex("10:30 500"), &mut acc).unwrap();

        assert_eq!(acc.time_seen, 1);
        assert_eq!(acc.zone_seen, 0);
        assert_eq!((acc.hour, acc.minute, acc.second), (10, 30, 0));
        assert_eq!(acc.zone_minutes, 300);
        assert_eq!(acc.dst, DstMode::Standard);
    }

    #[test]
    fn test_clock_with_seconds_and_meridian() {
        let mut acc = fresh();
        parse(&lex("10:30:15 pm"), &mut acc).unwrap();

        assert_eq!((acc.hour, acc.minute, acc.second), (10, 30, 15));
        assert_eq!(acc.meridian, Meridian::Pm);
    }

    #[test]
    fn test_bare_number_is_packed_time() {
        let mut acc = fresh();
        parse(&lex("1330"), &mut acc).unwrap();

        assert_eq!(acc.time_seen, 1);
        assert_eq!((acc.hour, acc.minute), (13, 30));
        assert_eq!(acc.meridian, Meridian::Hour24);
    }

    #[test]
    fn test_bare_number_is_year_after_time_and_date() {
        let mut acc = fresh();
        parse(&lex("10:30 july 4 1976"), &mut acc).unwrap();

        assert_eq!(acc.time_seen, 1);
        assert_eq!(acc.date_seen, 1);
        assert_eq!((acc.month, acc.day, acc.year), (7, 4, 1976));
    }

    #[test]
    fn test_month_day_comma_year() {
        let mut acc = fresh();
        parse(&lex("july 4, 1976"), &mut acc).unwrap();

        assert_eq!(acc.date_seen, 1);
        assert_eq!((acc.month, acc.day, acc.year), (7, 4, 1976));
    }

    #[test]
    fn test_day_first_date() {
        let mut acc = fresh();
        parse(&lex("4 july 1976"), &mut acc).unwrap();

        assert_eq!((acc.month, acc.day, acc.year), (7, 4, 1976));
    }

    #[test]
    fn test_slash_date_defaults_year() {
        let mut acc = fresh();
        parse(&lex("7/4"), &mut acc).unwrap();

        assert_eq!((acc.month, acc.day, acc.year), (7, 4, 2024));
    }

    #[test]
    fn test_weekday_with_comma() {
        let mut acc = fresh();
        parse(&lex("friday, 10:30"), &mut acc).unwrap();

        assert_eq!(acc.day_seen, 1);
        assert_eq!(acc.time_seen, 1);
        assert_eq!((acc.day_ordinal, acc.day_index), (1, 5));
    }

    #[test]
    fn test_ordinal_weekday() {
        let mut acc = fresh();
        parse(&lex("next friday"), &mut acc).unwrap();

        assert_eq!((acc.day_ordinal, acc.day_index), (2, 5));

        let mut acc = fresh();
        parse(&lex("last friday"), &mut acc).unwrap();

        assert_eq!((acc.day_ordinal, acc.day_index), (-1, 5));
    }

    #[test]
    fn test_relative_accumulates() {
        let mut acc = fresh();
        parse(&lex("1 day 2 weeks"), &mut acc).unwrap();

        assert_eq!(acc.rel_seen, 2);
        assert_eq!(acc.rel_seconds, 86400 + 2 * 7 * 86400);
    }

    #[test]
    fn test_ago_negates_running_total() {
        let mut acc = fresh();
        parse(&lex("1 day 2 weeks ago"), &mut acc).unwrap();

        assert_eq!(acc.rel_seconds, -(86400 + 2 * 7 * 86400));
    }

    #[test]
    fn test_double_ago_cancels() {
        let mut acc = fresh();
        parse(&lex("3 days ago ago"), &mut acc).unwrap();

        assert_eq!(acc.rel_seconds, 3 * 86400);
    }

    #[test]
    fn test_year_unit_counts_months() {
        let mut acc = fresh();
        parse(&lex("2 years"), &mut acc).unwrap();

        assert_eq!(acc.rel_months, 24);
        assert_eq!(acc.rel_seconds, 0);
    }

    #[test]
    fn test_two_times_is_ambiguous() {
        let mut acc = fresh();
        assert_eq!(
            parse(&lex("10:00 11:00"), &mut acc),
            Err(Error::Ambiguous("time"))
        );

        // The second clock must not read as a zone offset.
        let mut acc = fresh();
        assert_eq!(
            parse(&lex("10:30:15 11:00"), &mut acc),
            Err(Error::Ambiguous("time"))
        );
    }

    #[test]
    fn test_two_zones_is_ambiguous() {
        let mut acc = fresh();
        assert_eq!(
            parse(&lex("est edt"), &mut acc),
            Err(Error::Ambiguous("zone"))
        );
    }

    #[test]
    fn test_month_without_day_is_syntax_error() {
        let mut acc = fresh();
        assert_eq!(parse(&lex("july"), &mut acc), Err(Error::Syntax));
    }

    #[test]
    fn test_dangling_slash_is_syntax_error() {
        let mut acc = fresh();
        assert_eq!(parse(&lex("7/4/"), &mut acc), Err(Error::Syntax));
    }

    #[test]
    fn test_unknown_word_is_reported() {
        let mut acc = fresh();
        assert_eq!(
            parse(&lex("breakfast"), &mut acc),
            Err(Error::UnrecognizedWord("breakfast".to_string()))
        );
    }

    #[test]
    fn test_empty_input_is_accepted() {
        let mut acc = fresh();
        parse(&[], &mut acc).unwrap();

        assert_eq!(acc.time_seen + acc.zone_seen + acc.date_seen + acc.day_seen, 0);
    }
}
