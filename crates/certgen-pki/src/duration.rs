//! Parser for `expires` duration strings.
//!
//! The accepted grammar is `[-+]?([0-9]*(\.[0-9]*)?[a-zµμ]+)+`, e.g. `"8760h"`,
//! `"1h30m"`, `"1.5h"` or `"300ms"`. A bare `"0"` is also accepted.

use chrono::Duration;

use crate::error::{Error, Result};

const NANOSECOND: u64 = 1;
const MICROSECOND: u64 = 1_000 * NANOSECOND;
const MILLISECOND: u64 = 1_000 * MICROSECOND;
const SECOND: u64 = 1_000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

/// Largest magnitude a duration may reach, in nanoseconds.
const LIMIT: u64 = 1 << 63;

/// Parses a duration string into a [`chrono::Duration`].
///
/// # Errors
///
/// Returns [`Error::Config`] if the string is empty, lacks a unit, names an
/// unknown unit, or overflows.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || Error::Config(format!("invalid duration \"{input}\""));
    let overflow = || Error::Config(format!("duration \"{input}\" is out of range"));

    let mut rest = input;
    let mut negative = false;
    if let Some(stripped) = rest.strip_prefix('-') {
        negative = true;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    if rest == "0" {
        return Ok(Duration::zero());
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    while !rest.is_empty() {
        if !rest.starts_with(|c: char| c == '.' || c.is_ascii_digit()) {
            return Err(invalid());
        }

        let (whole, after_whole, whole_len) = leading_int(rest).ok_or_else(overflow)?;
        rest = after_whole;

        let mut fraction = 0u64;
        let mut scale = 1.0f64;
        let mut fraction_len = 0;
        if let Some(after_dot) = rest.strip_prefix('.') {
            (fraction, scale, rest, fraction_len) = leading_fraction(after_dot);
        }
        if whole_len == 0 && fraction_len == 0 {
            return Err(invalid());
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        if unit_len == 0 {
            return Err(Error::Config(format!("missing unit in duration \"{input}\"")));
        }
        let (unit_name, after_unit) = rest.split_at(unit_len);
        rest = after_unit;
        let unit = unit_nanos(unit_name).ok_or_else(|| {
            Error::Config(format!(
                "unknown unit \"{unit_name}\" in duration \"{input}\""
            ))
        })?;

        if whole > LIMIT / unit {
            return Err(overflow());
        }
        let mut value = whole * unit;
        if fraction > 0 {
            value += (fraction as f64 * (unit as f64 / scale)) as u64;
            if value > LIMIT {
                return Err(overflow());
            }
        }
        total = total.checked_add(value).filter(|t| *t <= LIMIT).ok_or_else(overflow)?;
    }

    let nanos = if negative {
        if total == LIMIT {
            i64::MIN
        } else {
            -(total as i64)
        }
    } else {
        i64::try_from(total).map_err(|_| overflow())?
    };

    Ok(Duration::nanoseconds(nanos))
}

fn unit_nanos(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(NANOSECOND),
        "us" | "µs" | "μs" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

/// Consumes leading decimal digits. Returns `None` on overflow.
fn leading_int(s: &str) -> Option<(u64, &str, usize)> {
    let len = s.bytes().take_while(u8::is_ascii_digit).count();
    let mut value: u64 = 0;
    for digit in s[..len].bytes() {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(digit - b'0')))
            .filter(|v| *v <= LIMIT)?;
    }
    Some((value, &s[len..], len))
}

/// Consumes leading fractional digits, dropping precision past what fits.
fn leading_fraction(s: &str) -> (u64, f64, &str, usize) {
    let len = s.bytes().take_while(u8::is_ascii_digit).count();
    let mut value: u64 = 0;
    let mut scale = 1.0f64;
    let mut saturated = false;
    for digit in s[..len].bytes() {
        if saturated {
            continue;
        }
        match value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(digit - b'0')))
            .filter(|v| *v <= LIMIT)
        {
            Some(next) => {
                value = next;
                scale *= 10.0;
            }
            None => saturated = true,
        }
    }
    (value, scale, &s[len..], len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("8760h", Duration::hours(8760) ; "one year in hours")]
    #[test_case("87600h", Duration::hours(87600) ; "ten years in hours")]
    #[test_case("720h", Duration::hours(720) ; "thirty days")]
    #[test_case("1h30m", Duration::minutes(90) ; "compound")]
    #[test_case("1.5h", Duration::minutes(90) ; "fractional hours")]
    #[test_case("300ms", Duration::milliseconds(300) ; "milliseconds")]
    #[test_case("2us", Duration::microseconds(2) ; "ascii micro")]
    #[test_case("2µs", Duration::microseconds(2) ; "micro sign")]
    #[test_case("2μs", Duration::microseconds(2) ; "greek mu")]
    #[test_case("15ns", Duration::nanoseconds(15) ; "nanoseconds")]
    #[test_case("+45s", Duration::seconds(45) ; "explicit plus")]
    #[test_case("-1h", Duration::hours(-1) ; "negative")]
    #[test_case("0", Duration::zero() ; "bare zero")]
    #[test_case(".5s", Duration::milliseconds(500) ; "leading dot")]
    #[test_case("1.s", Duration::seconds(1) ; "trailing dot")]
    fn parses(input: &str, expected: Duration) {
        assert_eq!(parse_duration(input).unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("not-a-duration" ; "garbage")]
    #[test_case("10" ; "missing unit")]
    #[test_case("10d" ; "unknown unit")]
    #[test_case("-" ; "sign only")]
    #[test_case(".h" ; "no digits")]
    #[test_case("1h 30m" ; "embedded space")]
    #[test_case("99999999999999999999h" ; "overflow")]
    fn rejects(input: &str) {
        let err = parse_duration(input).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "unexpected error: {err}");
    }

    #[test]
    fn error_message_quotes_input() {
        let err = parse_duration("not-a-duration").unwrap_err();
        assert!(err.to_string().contains("\"not-a-duration\""));
    }

    proptest! {
        #[test]
        fn prop_hours_minutes_seconds(h in 0i64..100_000, m in 0i64..60, s in 0i64..60) {
            let parsed = parse_duration(&format!("{h}h{m}m{s}s")).unwrap();
            prop_assert_eq!(parsed, Duration::hours(h) + Duration::minutes(m) + Duration::seconds(s));
        }

        #[test]
        fn prop_never_panics(input in "\\PC{0,16}") {
            let _ = parse_duration(&input);
        }
    }
}
