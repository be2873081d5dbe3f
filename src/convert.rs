use crate::lexer::Meridian;
use crate::parser::{Accumulator, DstMode};
use crate::{Error, Reference};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

const EPOCH_YEAR: i64 = 1970;

/// Days in each month; February is patched per year.
const MONTH_DAYS: [i64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// A local civil reading of an instant, under a reference's zone and
/// daylight rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Civil {
    pub year: i64,
    pub month: i64,
    pub day: i64,
    pub hour: i64,
    pub minute: i64,
    pub second: i64,
    /// 0 is Sunday.
    pub weekday: i64,
}

fn february_days(year: i64) -> i64 {
    if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) {
        29
    } else {
        28
    }
}

fn month_days(year: i64, month: i64) -> i64 {
    if month == 2 {
        february_days(year)
    } else {
        MONTH_DAYS[(month - 1) as usize]
    }
}

/// Break an instant into the local civil date and time it reads as under
/// the reference's zone and daylight rule.
pub(crate) fn civil(reference: &Reference, instant: i64) -> Civil {
    let mut wall = instant - reference.zone_minutes * MINUTE;
    if reference.daylight.active(instant) {
        wall += HOUR;
    }

    let days = wall.div_euclid(DAY);
    let rem = wall.rem_euclid(DAY);
    // The epoch fell on a Thursday.
    let weekday = (days + 4).rem_euclid(7);

    // Under the every-fourth-year rule a leap cycle is a fixed 1461 days;
    // 1972 opens the first cycle after the epoch.
    let from_cycle = days - 730;
    let cycle = from_cycle.div_euclid(1461);
    let in_cycle = from_cycle.rem_euclid(1461);
    let year_in_cycle = if in_cycle < 366 {
        0
    } else {
        (in_cycle - 366) / 365 + 1
    };
    let year = 1972 + 4 * cycle + year_in_cycle;
    let mut days = in_cycle
        - if year_in_cycle == 0 {
            0
        } else {
            366 + 365 * (year_in_cycle - 1)
        };

    let mut month = 1;
    while month < 12 && days >= month_days(year, month) {
        days -= month_days(year, month);
        month += 1;
    }

    Civil {
        year,
        month,
        day: days + 1,
        hour: rem / HOUR,
        minute: rem % HOUR / MINUTE,
        second: rem % MINUTE,
        weekday,
    }
}

/// Seconds past local midnight for a clock reading, validating the fields
/// against the meridian in effect.
pub(crate) fn time_to_seconds(
    hour: i64,
    minute: i64,
    second: i64,
    meridian: Meridian,
) -> Result<i64, Error> {
    if !(0..=59).contains(&minute) || !(0..=59).contains(&second) {
        return Err(Error::Range);
    }
    let hour = match meridian {
        Meridian::Am | Meridian::Pm => {
            if !(1..=12).contains(&hour) {
                return Err(Error::Range);
            }
            hour % 12 + if meridian == Meridian::Pm { 12 } else { 0 }
        }
        Meridian::Hour24 => {
            if !(0..=23).contains(&hour) {
                return Err(Error::Range);
            }
            hour
        }
    };
    Ok(hour * HOUR + minute * MINUTE + second)
}

/// Absolute instant of a civil date and clock reading in a given zone.
/// Years below 1900 are taken as offsets from 1900, so "76" means 1976;
/// anything resolving before 1970 is out of range.
#[allow(clippy::too_many_arguments)]
pub(crate) fn date_to_instant(
    month: i64,
    day: i64,
    year: i64,
    hour: i64,
    minute: i64,
    second: i64,
    meridian: Meridian,
    zone_minutes: i64,
    dst: DstMode,
    reference: &Reference,
) -> Result<i64, Error> {
    let mut year = year.checked_abs().ok_or(Error::Range)?;
    if year < 1900 {
        year += 1900;
    }
    if year < EPOCH_YEAR || !(1..=12).contains(&month) || !(1..=month_days(year, month)).contains(&day)
    {
        return Err(Error::Range);
    }

    let mut days = day - 1;
    for m in 1..month {
        days += month_days(year, m);
    }
    // Whole years counted arithmetically, leap years by the
    // every-fourth-year rule.
    let leaps = (year - 1).div_euclid(4) - (EPOCH_YEAR - 1).div_euclid(4);
    let days = (year - EPOCH_YEAR)
        .checked_mul(365)
        .and_then(|d| d.checked_add(leaps))
        .and_then(|d| d.checked_add(days))
        .ok_or(Error::Range)?;

    let clock = time_to_seconds(hour, minute, second, meridian)?;
    let mut instant = days
        .checked_mul(DAY)
        .and_then(|s| zone_minutes.checked_mul(MINUTE).and_then(|z| s.checked_add(z)))
        .and_then(|s| s.checked_add(clock))
        .ok_or(Error::Range)?;

    let daylight = match dst {
        DstMode::Daylight => true,
        DstMode::Standard => false,
        DstMode::Maybe => reference.daylight.active(instant),
    };
    if daylight {
        instant -= HOUR;
    }
    Ok(instant)
}

/// Keep the local wall-clock hour of `now` when stepping to `future`, even
/// when the two instants straddle a daylight transition.
fn daylight_correction(future: i64, now: i64, reference: &Reference) -> i64 {
    (future - now)
        + HOUR * ((civil(reference, now).hour + 1) % 24 - (civil(reference, future).hour + 1) % 24)
}

/// Offset from `base` to the requested occurrence of a weekday. Ordinal 1
/// is the next occurrence counting today, 2 the one after, 0 and negatives
/// step backward a week each.
pub(crate) fn weekday_offset(ordinal: i64, index: u32, base: i64, reference: &Reference) -> i64 {
    let today = civil(reference, base).weekday;
    let mut target = base + DAY * (i64::from(index) - today).rem_euclid(7);
    target += 7 * DAY * if ordinal <= 0 { ordinal } else { ordinal - 1 };
    daylight_correction(target, base, reference)
}

/// Offset from `start` after stepping `delta` calendar months, keeping the
/// day of month and wall-clock time.
pub(crate) fn month_offset(
    start: i64,
    delta: i64,
    zone_minutes: i64,
    reference: &Reference,
) -> Result<i64, Error> {
    if delta == 0 {
        return Ok(0);
    }
    let here = civil(reference, start);
    let total = 12 * here.year + (here.month - 1) + delta;
    let future = date_to_instant(
        total.rem_euclid(12) + 1,
        here.day,
        total.div_euclid(12),
        here.hour,
        here.minute,
        here.second,
        Meridian::Hour24,
        zone_minutes,
        DstMode::Maybe,
        reference,
    )?;
    Ok(daylight_correction(future, start, reference))
}

/// Combine the accumulated facts into an absolute instant.
pub(crate) fn resolve(acc: &Accumulator, reference: &Reference) -> Result<i64, Error> {
    let mut instant = if acc.date_seen > 0 || acc.time_seen > 0 {
        date_to_instant(
            acc.month,
            acc.day,
            acc.year,
            acc.hour,
            acc.minute,
            acc.second,
            acc.meridian,
            acc.zone_minutes,
            acc.dst,
            reference,
        )?
    } else {
        let mut base = reference.instant;
        if acc.rel_seen == 0 && acc.day_seen == 0 {
            // A lone zone, or nothing at all: local midnight today.
            let here = civil(reference, base);
            base -= here.hour * HOUR + here.minute * MINUTE + here.second;
        }
        base
    };

    instant = instant.wrapping_add(acc.rel_seconds);
    instant = instant.wrapping_add(month_offset(
        instant,
        acc.rel_months,
        acc.zone_minutes,
        reference,
    )?);

    if acc.day_seen > 0 {
        instant += weekday_offset(acc.day_ordinal, acc.day_index, instant, reference);
    }

    Ok(instant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DaylightRule;
    use test_case::test_case;

    // 2024-07-10 12:34:56 UTC, a Wednesday.
    const REF: i64 = 1720614896;

    fn utc() -> Reference {
        Reference::new(REF, 0)
    }

    #[test]
    fn test_civil_breakdown() {
        let c = civil(&utc(), REF);
        assert_eq!((c.year, c.month, c.day), (2024, 7, 10));
        assert_eq!((c.hour, c.minute, c.second), (12, 34, 56));
        assert_eq!(c.weekday, 3);
    }

    #[test]
    fn test_civil_respects_zone() {
        let eastern = Reference::new(REF, 300);
        let c = civil(&eastern, REF);
        assert_eq!((c.hour, c.minute), (7, 34));
    }

    #[test]
    fn test_civil_before_epoch() {
        let c = civil(&utc(), -1);
        assert_eq!((c.year, c.month, c.day), (1969, 12, 31));
        assert_eq!((c.hour, c.minute, c.second), (23, 59, 59));
        assert_eq!(c.weekday, 3);
    }

    #[test_case(12, 0, 0, Meridian::Am => 0; "twelve am is midnight")]
    #[test_case(12, 0, 0, Meridian::Pm => 12 * 3600; "twelve pm is noon")]
    #[test_case(3, 0, 0, Meridian::Pm => 15 * 3600; "three pm")]
    #[test_case(13, 30, 0, Meridian::Hour24 => 13 * 3600 + 30 * 60; "half past one")]
    fn test_time_to_seconds(h: i64, m: i64, s: i64, meridian: Meridian) -> i64 {
        time_to_seconds(h, m, s, meridian).unwrap()
    }

    #[test_case(13, 0, 0, Meridian::Pm; "pm hour too large")]
    #[test_case(0, 0, 0, Meridian::Am; "am hour zero")]
    #[test_case(24, 0, 0, Meridian::Hour24; "hour twenty four")]
    #[test_case(10, 60, 0, Meridian::Hour24; "minute sixty")]
    fn test_time_out_of_range(h: i64, m: i64, s: i64, meridian: Meridian) {
        assert_eq!(time_to_seconds(h, m, s, meridian), Err(Error::Range));
    }

    #[test]
    fn test_date_to_instant_epoch() {
        let t = date_to_instant(
            1, 1, 1970, 0, 0, 0, Meridian::Hour24, 0, DstMode::Standard, &utc(),
        );
        assert_eq!(t, Ok(0));
    }

    #[test]
    fn test_date_to_instant_bicentennial() {
        let t = date_to_instant(
            7, 4, 1976, 0, 0, 0, Meridian::Hour24, 0, DstMode::Standard, &utc(),
        );
        assert_eq!(t, Ok(205286400));
    }

    #[test]
    fn test_two_digit_year() {
        let with_century = date_to_instant(
            7, 4, 1976, 0, 0, 0, Meridian::Hour24, 0, DstMode::Standard, &utc(),
        );
        let two_digit = date_to_instant(
            7, 4, 76, 0, 0, 0, Meridian::Hour24, 0, DstMode::Standard, &utc(),
        );
        assert_eq!(two_digit, with_century);
    }

    #[test]
    fn test_zone_minutes_shift_west() {
        let t = date_to_instant(
            1, 1, 1970, 0, 0, 0, Meridian::Hour24, 300, DstMode::Standard, &utc(),
        );
        assert_eq!(t, Ok(300 * 60));
    }

    #[test]
    fn test_daylight_subtracts_an_hour() {
        let std = date_to_instant(
            7, 4, 1976, 10, 0, 0, Meridian::Hour24, 300, DstMode::Standard, &utc(),
        )
        .unwrap();
        let dst = date_to_instant(
            7, 4, 1976, 10, 0, 0, Meridian::Hour24, 300, DstMode::Daylight, &utc(),
        )
        .unwrap();
        assert_eq!(std - dst, 3600);
    }

    #[test_case(2, 30, 1970; "february thirtieth")]
    #[test_case(13, 1, 1970; "month thirteen")]
    #[test_case(2, 29, 1971; "leap day off year")]
    #[test_case(1, 1, 1969; "before nineteen seventy")]
    fn test_date_out_of_range(month: i64, day: i64, year: i64) {
        let t = date_to_instant(
            month, day, year, 0, 0, 0, Meridian::Hour24, 0, DstMode::Standard, &utc(),
        );
        assert_eq!(t, Err(Error::Range));
    }

    #[test]
    fn test_far_future_year_is_out_of_range() {
        let t = date_to_instant(
            1,
            1,
            3_000_000_000_000_000_000,
            0,
            0,
            0,
            Meridian::Hour24,
            0,
            DstMode::Standard,
            &utc(),
        );
        assert_eq!(t, Err(Error::Range));
    }

    #[test]
    fn test_leap_day_by_year() {
        let leap_ok = |year| {
            date_to_instant(
                2, 29, year, 0, 0, 0, Meridian::Hour24, 0, DstMode::Standard, &utc(),
            )
            .is_ok()
        };
        assert!(leap_ok(2024));
        assert!(leap_ok(2000));
        assert!(!leap_ok(2023));
        assert!(!leap_ok(2100));
    }

    #[test]
    fn test_weekday_offset_upcoming() {
        // Friday from a Wednesday base is two days out.
        assert_eq!(weekday_offset(1, 5, REF, &utc()), 2 * 86400);
    }

    #[test]
    fn test_weekday_offset_today_counts() {
        assert_eq!(weekday_offset(1, 3, REF, &utc()), 0);
        assert_eq!(weekday_offset(2, 3, REF, &utc()), 7 * 86400);
    }

    #[test]
    fn test_weekday_offset_backward() {
        // Last Friday from a Wednesday is five days back.
        assert_eq!(weekday_offset(-1, 5, REF, &utc()), -5 * 86400);
    }

    #[test]
    fn test_month_offset_forward() {
        // Three months from 2024-07-10 12:34:56 is 2024-10-10 12:34:56.
        let delta = month_offset(REF, 3, 0, &utc()).unwrap();
        let c = civil(&utc(), REF + delta);
        assert_eq!((c.year, c.month, c.day), (2024, 10, 10));
        assert_eq!((c.hour, c.minute, c.second), (12, 34, 56));
    }

    #[test]
    fn test_month_offset_across_year() {
        let delta = month_offset(REF, -8, 0, &utc()).unwrap();
        let c = civil(&utc(), REF + delta);
        assert_eq!((c.year, c.month, c.day), (2023, 11, 10));
    }

    #[test]
    fn test_month_offset_invalid_day() {
        // 2024-07-31 plus two months lands on a thirty day month.
        let july31 = date_to_instant(
            7, 31, 2024, 0, 0, 0, Meridian::Hour24, 0, DstMode::Standard, &utc(),
        )
        .unwrap();
        assert_eq!(month_offset(july31, 2, 0, &utc()), Err(Error::Range));
    }

    #[test]
    fn test_daylight_rule_changes_clock_reading() {
        let summer = Reference::with_daylight_rule(REF, 300, DaylightRule::Always);
        let c = civil(&summer, REF);
        assert_eq!((c.hour, c.minute), (8, 34));
    }

    // Daylight time begins 2024-07-11 00:00 UTC under this rule, the day
    // after the reference instant.
    fn summer_after(instant: i64) -> bool {
        instant >= 1720656000
    }

    #[test]
    fn test_weekday_step_keeps_wall_clock_across_transition() {
        let reference = Reference::with_daylight_rule(REF, 0, DaylightRule::Lookup(summer_after));

        // Friday lands past the transition, one absolute hour closer.
        let offset = weekday_offset(1, 5, REF, &reference);
        assert_eq!(offset, 2 * 86400 - 3600);

        let c = civil(&reference, REF + offset);
        assert_eq!((c.year, c.month, c.day), (2024, 7, 12));
        assert_eq!((c.hour, c.minute, c.second), (12, 34, 56));
    }

    #[test]
    fn test_month_step_keeps_wall_clock_across_transition() {
        let reference = Reference::with_daylight_rule(REF, 0, DaylightRule::Lookup(summer_after));

        let delta = month_offset(REF, 3, 0, &reference).unwrap();
        assert_eq!(delta, 92 * 86400 - 3600);

        let c = civil(&reference, REF + delta);
        assert_eq!((c.year, c.month, c.day), (2024, 10, 10));
        assert_eq!((c.hour, c.minute, c.second), (12, 34, 56));
    }
}
