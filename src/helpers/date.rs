//! Date helper functions

use chrono::{DateTime, Datelike, TimeZone};

use crate::i18n::I18n;

/// Format a date using a Moment.js-compatible format string. Month names
/// come from the i18n tables.
///
/// # Examples
/// ```ignore
/// format_date(&date, "DD MMM YYYY", &I18n::new("pt-BR")) // -> "15 mar 2021"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str, i18n: &I18n) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let chrono_format = moment_to_chrono_format(format, date.month(), i18n);
    date.format(&chrono_format).to_string()
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

enum Token {
    Spec(&'static str),
    MonthShort,
    MonthLong,
}

/// Longest patterns first so `MMMM` wins over `MMM` and `MM`
const TOKENS: &[(&str, Token)] = &[
    ("YYYY", Token::Spec("%Y")),
    ("YY", Token::Spec("%y")),
    ("MMMM", Token::MonthLong),
    ("MMM", Token::MonthShort),
    ("MM", Token::Spec("%m")),
    ("DD", Token::Spec("%d")),
    ("D", Token::Spec("%-d")),
    ("HH", Token::Spec("%H")),
    ("hh", Token::Spec("%I")),
    ("mm", Token::Spec("%M")),
    ("ss", Token::Spec("%S")),
    ("ZZ", Token::Spec("%z")),
];

/// Convert a Moment.js format to a chrono format, inlining month names
fn moment_to_chrono_format(format: &str, month: u32, i18n: &I18n) -> String {
    let mut result = String::with_capacity(format.len() * 2);
    let mut rest = format;

    'outer: while let Some(c) = rest.chars().next() {
        for (pattern, token) in TOKENS {
            if let Some(tail) = rest.strip_prefix(pattern) {
                match token {
                    Token::Spec(spec) => result.push_str(spec),
                    Token::MonthShort => push_literal(&mut result, &i18n.month_name(month, false)),
                    Token::MonthLong => push_literal(&mut result, &i18n.month_name(month, true)),
                }
                rest = tail;
                continue 'outer;
            }
        }

        push_literal(&mut result, c.encode_utf8(&mut [0; 4]));
        rest = &rest[c.len_utf8()..];
    }

    result
}

fn push_literal(out: &mut String, literal: &str) {
    out.push_str(&literal.replace('%', "%%"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_date_localized() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        let pt = I18n::new("pt-BR");
        assert_eq!(format_date(&date, "DD MMM YYYY", &pt), "15 mar 2021");
        assert_eq!(format_date(&date, "D MMMM", &pt), "15 março");

        let en = I18n::default();
        assert_eq!(format_date(&date, "MMM DD, YYYY", &en), "Mar 15, 2021");
        assert_eq!(format_date(&date, "YYYY-MM-DD HH:mm:ss", &en), "2021-03-15 19:25:28");
    }

    #[test]
    fn test_percent_is_literal() {
        let date = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        assert_eq!(format_date(&date, "100% DD", &I18n::default()), "100% 05");
    }

    #[test]
    fn test_timezone_shift() {
        let date = Utc.with_ymd_and_hms(2021, 3, 1, 1, 0, 0).unwrap();
        let local = date.with_timezone(&chrono_tz::America::Sao_Paulo);
        assert_eq!(format_date(&local, "DD MMM", &I18n::new("pt-BR")), "28 fev");
    }

    #[test]
    fn test_date_xml() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        assert_eq!(date_xml(&date), "2021-03-15T19:25:28+00:00");
    }
}
