use lazy_static::lazy_static;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

/// AM/PM marker attached to an hour, or the 24-hour clock when the
/// expression gave none.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Meridian {
    Am,
    Pm,
    Hour24,
}

/// Enum for all valid tokens in the input string.
///
/// Zone offsets are in minutes *west* of UTC, so zones behind UTC carry
/// positive values. The stored constants are added directly to the computed
/// instant; do not reinterpret them as `UTC+N` offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Decimal number, possibly signed. "next" and "last" also lex as
    /// numbers (2 and -1) so that "next friday" is an ordinal weekday.
    Number(i64),
    /// A word the vocabulary does not know; always rejected downstream.
    Ident(String),
    /// Month of year, 1 = January.
    Month(u32),
    /// Day of week, 0 = Sunday.
    Weekday(u32),
    Meridian(Meridian),
    /// Relative unit counted in minutes ("day" is 1440).
    Unit(i64),
    /// Relative unit counted in months ("year" is 12).
    MonthUnit(i64),
    /// Relative unit counted in seconds.
    SecUnit(i64),
    /// Named timezone on standard time, minutes west of UTC.
    Zone(i64),
    /// Named timezone on daylight time, minutes west of UTC.
    DayZone(i64),
    Ago,
    Comma,
    Colon,
    Slash,
    Other(char),
}

/// Month and weekday names in lookup order: months are tried before
/// weekdays, and the first entry whose full name or three-letter prefix
/// matches wins. The short entries ("Sept", "Tues", "Thur"...) pin down the
/// longer conventional abbreviations.
static MONTHS_AND_WEEKDAYS: &[(&str, Token)] = &[
    ("January", Token::Month(1)),
    ("February", Token::Month(2)),
    ("March", Token::Month(3)),
    ("April", Token::Month(4)),
    ("May", Token::Month(5)),
    ("June", Token::Month(6)),
    ("July", Token::Month(7)),
    ("August", Token::Month(8)),
    ("September", Token::Month(9)),
    ("Sept", Token::Month(9)),
    ("October", Token::Month(10)),
    ("November", Token::Month(11)),
    ("December", Token::Month(12)),
    ("Sunday", Token::Weekday(0)),
    ("Monday", Token::Weekday(1)),
    ("Tuesday", Token::Weekday(2)),
    ("Tues", Token::Weekday(2)),
    ("Wednesday", Token::Weekday(3)),
    ("Wednes", Token::Weekday(3)),
    ("Thursday", Token::Weekday(4)),
    ("Thur", Token::Weekday(4)),
    ("Thurs", Token::Weekday(4)),
    ("Friday", Token::Weekday(5)),
    ("Saturday", Token::Weekday(6)),
];

const HR: i64 = 60;

lazy_static! {
    /// Meridian markers and named timezones, standard/daylight pairs.
    /// Offsets are minutes west of UTC; the European and Australian values
    /// are kept exactly as the vocabulary has always had them, wrong or not.
    static ref ZONES: HashMap<&'static str, Token> = {
        let mut map = HashMap::new();

        map.insert("am", Token::Meridian(Meridian::Am));
        map.insert("a.m.", Token::Meridian(Meridian::Am));
        map.insert("pm", Token::Meridian(Meridian::Pm));
        map.insert("p.m.", Token::Meridian(Meridian::Pm));

        map.insert("nst", Token::Zone(3 * HR + 30)); // Newfoundland
        map.insert("n.s.t.", Token::Zone(3 * HR + 30));
        map.insert("ast", Token::Zone(4 * HR)); // Atlantic
        map.insert("a.s.t.", Token::Zone(4 * HR));
        map.insert("adt", Token::DayZone(4 * HR));
        map.insert("a.d.t.", Token::DayZone(4 * HR));
        map.insert("est", Token::Zone(5 * HR)); // Eastern
        map.insert("e.s.t.", Token::Zone(5 * HR));
        map.insert("edt", Token::DayZone(5 * HR));
        map.insert("e.d.t.", Token::DayZone(5 * HR));
        map.insert("cst", Token::Zone(6 * HR)); // Central
        map.insert("c.s.t.", Token::Zone(6 * HR));
        map.insert("cdt", Token::DayZone(6 * HR));
        map.insert("c.d.t.", Token::DayZone(6 * HR));
        map.insert("mst", Token::Zone(7 * HR)); // Mountain
        map.insert("m.s.t.", Token::Zone(7 * HR));
        map.insert("mdt", Token::DayZone(7 * HR));
        map.insert("m.d.t.", Token::DayZone(7 * HR));
        map.insert("pst", Token::Zone(8 * HR)); // Pacific
        map.insert("p.s.t.", Token::Zone(8 * HR));
        map.insert("pdt", Token::DayZone(8 * HR));
        map.insert("p.d.t.", Token::DayZone(8 * HR));
        map.insert("yst", Token::Zone(9 * HR)); // Yukon
        map.insert("y.s.t.", Token::Zone(9 * HR));
        map.insert("ydt", Token::DayZone(9 * HR));
        map.insert("y.d.t.", Token::DayZone(9 * HR));
        map.insert("hst", Token::Zone(10 * HR)); // Hawaii
        map.insert("h.s.t.", Token::Zone(10 * HR));
        map.insert("hdt", Token::DayZone(10 * HR));
        map.insert("h.d.t.", Token::DayZone(10 * HR));

        map.insert("gmt", Token::Zone(0));
        map.insert("g.m.t.", Token::Zone(0));
        map.insert("ut", Token::Zone(0));
        map.insert("u.t.", Token::Zone(0));
        map.insert("bst", Token::DayZone(0)); // British Summer Time
        map.insert("b.s.t.", Token::DayZone(0));
        map.insert("eet", Token::Zone(0)); // European Eastern Time
        map.insert("e.e.t.", Token::Zone(0));
        map.insert("eest", Token::DayZone(0)); // European Eastern Summer Time
        map.insert("e.e.s.t.", Token::DayZone(0));
        map.insert("met", Token::Zone(-HR)); // Middle European Time
        map.insert("m.e.t.", Token::Zone(-HR));
        map.insert("mest", Token::DayZone(-HR)); // Middle European Summer Time
        map.insert("m.e.s.t.", Token::DayZone(-HR));
        map.insert("wet", Token::Zone(-2 * HR)); // Western European Time
        map.insert("w.e.t.", Token::Zone(-2 * HR));
        map.insert("west", Token::DayZone(-2 * HR)); // Western European Summer Time
        map.insert("w.e.s.t.", Token::DayZone(-2 * HR));

        map.insert("jst", Token::Zone(-9 * HR)); // Japan, no daylight time
        map.insert("j.s.t.", Token::Zone(-9 * HR));

        map.insert("aest", Token::Zone(-10 * HR)); // Australian Eastern Time
        map.insert("a.e.s.t.", Token::Zone(-10 * HR));
        map.insert("aesst", Token::DayZone(-10 * HR)); // Australian Eastern Summer Time
        map.insert("a.e.s.s.t.", Token::DayZone(-10 * HR));
        map.insert("acst", Token::Zone(-(9 * HR + 30))); // Australian Central Time
        map.insert("a.c.s.t.", Token::Zone(-(9 * HR + 30)));
        map.insert("acsst", Token::DayZone(-(9 * HR + 30))); // Australian Central Summer
        map.insert("a.c.s.s.t.", Token::DayZone(-(9 * HR + 30)));
        map.insert("awst", Token::Zone(-8 * HR)); // Australian Western Time
        map.insert("a.w.s.t.", Token::Zone(-8 * HR));

        map
    };

    /// Relative units: value is the minute, month, or second weight of one
    /// count. Looked up lower-cased, then retried with a trailing "s"
    /// stripped, so plural forms come for free.
    static ref UNITS: HashMap<&'static str, Token> = {
        let mut map = HashMap::new();

        map.insert("year", Token::MonthUnit(12));
        map.insert("month", Token::MonthUnit(1));
        map.insert("fortnight", Token::Unit(14 * 24 * 60));
        map.insert("week", Token::Unit(7 * 24 * 60));
        map.insert("day", Token::Unit(24 * 60));
        map.insert("hour", Token::Unit(60));
        map.insert("minute", Token::Unit(1));
        map.insert("min", Token::Unit(1));
        map.insert("second", Token::SecUnit(1));
        map.insert("sec", Token::SecUnit(1));

        map
    };

    /// Relative keyword phrases. "next" is 2 because the first occurrence
    /// of a weekday is already "this" one; "tomorrow" and friends are bare
    /// units carrying their own day counts.
    static ref OTHERS: HashMap<&'static str, Token> = {
        let mut map = HashMap::new();

        map.insert("tomorrow", Token::Unit(24 * 60));
        map.insert("yesterday", Token::Unit(-24 * 60));
        map.insert("today", Token::Unit(0));
        map.insert("now", Token::Unit(0));
        map.insert("last", Token::Number(-1));
        map.insert("this", Token::Unit(0));
        map.insert("next", Token::Number(2));
        map.insert("first", Token::Number(1));
        // "second" the ordinal is claimed by the units table
        map.insert("third", Token::Number(3));
        map.insert("fourth", Token::Number(4));
        map.insert("fifth", Token::Number(5));
        map.insert("sixth", Token::Number(6));
        map.insert("seventh", Token::Number(7));
        map.insert("eighth", Token::Number(8));
        map.insert("ninth", Token::Number(9));
        map.insert("tenth", Token::Number(10));
        map.insert("eleventh", Token::Number(11));
        map.insert("twelfth", Token::Number(12));
        map.insert("ago", Token::Ago);

        map
    };
}

/// Single-letter NATO zone designators, minutes west. 'j' is reserved for
/// local time and deliberately absent; 'z' is UTC.
fn military_zone(letter: char) -> Option<i64> {
    let minutes = match letter {
        'a' => HR,
        'b' => 2 * HR,
        'c' => 3 * HR,
        'd' => 4 * HR,
        'e' => 5 * HR,
        'f' => 6 * HR,
        'g' => 7 * HR,
        'h' => 8 * HR,
        'i' => 9 * HR,
        'k' => 10 * HR,
        'l' => 11 * HR,
        'm' => 12 * HR,
        'n' => -HR,
        'o' => -2 * HR,
        'p' => -3 * HR,
        'q' => -4 * HR,
        'r' => -5 * HR,
        's' => -6 * HR,
        't' => -7 * HR,
        'u' => -8 * HR,
        'v' => -9 * HR,
        'w' => -10 * HR,
        'x' => -11 * HR,
        'y' => -12 * HR,
        'z' => 0,
        _ => return None,
    };
    Some(minutes)
}

/// Resolve an identifier through the vocabulary. Lookup order matters and
/// must stay fixed: month/weekday names (first letter upper-cased, with
/// 3-letter and dotted 4-character abbreviations), then zones (as written,
/// then lower-cased), then units (lower-cased, plural stripped), then the
/// relative keywords, then single-letter military zones.
fn lookup(id: &str) -> Token {
    // A 3-letter word, or a 4-character word ending in '.', may abbreviate
    // a month or weekday name.
    let (stem, abbrev) = if id.len() == 3 {
        (id, true)
    } else if id.len() == 4 && id.ends_with('.') {
        (&id[..3], true)
    } else {
        (id, false)
    };

    let mut key = String::with_capacity(stem.len());
    let mut chars = stem.chars();
    if let Some(first) = chars.next() {
        key.push(first.to_ascii_uppercase());
    }
    key.extend(chars);

    for (name, token) in MONTHS_AND_WEEKDAYS {
        if key == *name || (abbrev && name.get(..3) == Some(key.as_str())) {
            return token.clone();
        }
    }

    if let Some(token) = ZONES.get(id) {
        return token.clone();
    }
    let lower = id.to_ascii_lowercase();
    if let Some(token) = ZONES.get(lower.as_str()) {
        return token.clone();
    }

    if let Some(token) = UNITS.get(lower.as_str()) {
        return token.clone();
    }
    if let Some(singular) = lower.strip_suffix('s') {
        if let Some(token) = UNITS.get(singular) {
            return token.clone();
        }
    }

    if let Some(token) = OTHERS.get(lower.as_str()) {
        return token.clone();
    }

    let mut letters = lower.chars();
    if let (Some(letter), None) = (letters.next(), letters.next()) {
        if let Some(minutes) = military_zone(letter) {
            return Token::Zone(minutes);
        }
    }

    Token::Ident(id.to_string())
}

/// Lex an input string into tokens. Lexing itself never fails: words the
/// vocabulary does not know come back as [`Token::Ident`] and fall out as
/// grammar errors instead.
pub fn lex(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '-' || c == '+' {
            chars.next();
            // A sign not followed by a digit is silently dropped, a quirk
            // kept for compatibility with the inputs this vocabulary has
            // always accepted.
            if !chars.peek().is_some_and(|n| n.is_ascii_digit()) {
                continue;
            }
            let sign = if c == '-' { -1 } else { 1 };
            tokens.push(Token::Number(read_number(&mut chars).wrapping_mul(sign)));
            continue;
        }

        if c.is_ascii_digit() {
            tokens.push(Token::Number(read_number(&mut chars)));
            continue;
        }

        if c.is_alphabetic() {
            let mut word = String::new();
            while let Some(&n) = chars.peek() {
                if n.is_alphabetic() || n == '.' {
                    word.push(n);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(lookup(&word));
            continue;
        }

        chars.next();
        match c {
            '(' => {
                // Parenthesized comments are discarded, nesting tracked.
                // Input ending inside a comment simply ends the stream.
                let mut depth = 1;
                for n in chars.by_ref() {
                    match n {
                        '(' => depth += 1,
                        ')' => depth -= 1,
                        _ => {}
                    }
                    if depth == 0 {
                        break;
                    }
                }
            }
            ',' => tokens.push(Token::Comma),
            ':' => tokens.push(Token::Colon),
            '/' => tokens.push(Token::Slash),
            other => tokens.push(Token::Other(other)),
        }
    }

    tokens
}

/// Decimal accumulation wraps on overflow rather than erroring, so absurdly
/// long digit runs stay lexable and die later as range errors.
fn read_number(chars: &mut Peekable<Chars<'_>>) -> i64 {
    let mut value: i64 = 0;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        value = value.wrapping_mul(10).wrapping_add(digit as i64);
        chars.next();
    }
    value
}

#[test]
fn test_time_and_zone() {
    assert_eq!(
        lex("10:30 est"),
        vec![
            Token::Number(10),
            Token::Colon,
            Token::Number(30),
            Token::Zone(300)
        ]
    );
}

#[test]
fn test_slash_date() {
    assert_eq!(
        lex("7/4/1976"),
        vec![
            Token::Number(7),
            Token::Slash,
            Token::Number(4),
            Token::Slash,
            Token::Number(1976)
        ]
    );
}

#[test]
fn test_month_abbreviations() {
    assert_eq!(lex("jan"), vec![Token::Month(1)]);
    assert_eq!(lex("jan."), vec![Token::Month(1)]);
    assert_eq!(lex("sep"), vec![Token::Month(9)]);
    assert_eq!(lex("sept"), vec![Token::Month(9)]);
    assert_eq!(lex("may"), vec![Token::Month(5)]);
    assert_eq!(lex("wed"), vec![Token::Weekday(3)]);
    assert_eq!(lex("thurs"), vec![Token::Weekday(4)]);
}

#[test]
fn test_dotted_zones_and_meridians() {
    assert_eq!(lex("e.s.t."), vec![Token::Zone(300)]);
    assert_eq!(lex("p.d.t."), vec![Token::DayZone(480)]);
    assert_eq!(
        lex("10 a.m."),
        vec![Token::Number(10), Token::Meridian(Meridian::Am)]
    );
}

#[test]
fn test_units_pluralized() {
    assert_eq!(lex("3 weeks"), vec![Token::Number(3), Token::Unit(10080)]);
    assert_eq!(lex("Days"), vec![Token::Unit(1440)]);
    assert_eq!(lex("fortnight"), vec![Token::Unit(20160)]);
    assert_eq!(lex("5 secs"), vec![Token::Number(5), Token::SecUnit(1)]);
}

#[test]
fn test_relative_keywords() {
    assert_eq!(lex("next friday"), vec![Token::Number(2), Token::Weekday(5)]);
    assert_eq!(lex("last"), vec![Token::Number(-1)]);
    assert_eq!(lex("tomorrow"), vec![Token::Unit(1440)]);
    assert_eq!(lex("yesterday"), vec![Token::Unit(-1440)]);
    assert_eq!(
        lex("3 weeks ago"),
        vec![Token::Number(3), Token::Unit(10080), Token::Ago]
    );
}

#[test]
fn test_sign_handling() {
    assert_eq!(lex("-3"), vec![Token::Number(-3)]);
    assert_eq!(lex("+12"), vec![Token::Number(12)]);
    // A stranded sign is skipped, not an error.
    assert_eq!(lex("- 3"), vec![Token::Number(3)]);
}

#[test]
fn test_number_then_word() {
    assert_eq!(
        lex("3pm"),
        vec![Token::Number(3), Token::Meridian(Meridian::Pm)]
    );
}

#[test]
fn test_comments() {
    assert_eq!(
        lex("(the (nested) launch window) 5pm"),
        vec![Token::Number(5), Token::Meridian(Meridian::Pm)]
    );
    // Unterminated comment swallows the rest of the input.
    assert_eq!(lex("5pm (oops 6pm"), lex("5pm"));
}

#[test]
fn test_military_zones() {
    assert_eq!(lex("z"), vec![Token::Zone(0)]);
    assert_eq!(lex("m"), vec![Token::Zone(720)]);
    assert_eq!(lex("n"), vec![Token::Zone(-60)]);
    // 'j' is the reserved letter.
    assert_eq!(lex("j"), vec![Token::Ident("j".to_string())]);
}

#[test]
fn test_unknown_word() {
    assert_eq!(
        lex("5 bananas"),
        vec![Token::Number(5), Token::Ident("bananas".to_string())]
    );
    // Only the first letter is case-folded for month names.
    assert_eq!(lex("July"), vec![Token::Month(7)]);
    assert_eq!(lex("JULY"), vec![Token::Ident("JULY".to_string())]);
}
