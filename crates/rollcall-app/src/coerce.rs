// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use regex::Regex;
use std::sync::LazyLock;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime};

use crate::{ColumnKind, DisplayValue, EM_DASH, ProgressBar, RawValue};

// Spreadsheet-style date token; month is zero-based and a trailing time
// part (hours, minutes, seconds, millis) is tolerated and ignored.
static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Date\((\d+),(\d+),(\d+)(?:,\d+){0,4}\)$").expect("date token pattern is valid")
});

static DISPLAY_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("display date pattern is valid")
});

/// Formats a raw date-column value as `DD/MM/YYYY`.
///
/// Missing and falsy values yield the em-dash. Text that is already in
/// `D/M/YYYY` form is returned untouched, and text that cannot be parsed
/// at all is returned as-is. Numbers are epoch milliseconds.
pub fn coerce_date(raw: Option<&RawValue>) -> String {
    let Some(raw) = raw.filter(|value| value.is_truthy()) else {
        return EM_DASH.to_owned();
    };

    match raw {
        RawValue::Text(text) => coerce_date_text(text),
        RawValue::Number(millis) => date_from_epoch_millis(*millis)
            .and_then(format_display_date)
            .unwrap_or_else(|| raw.display()),
    }
}

/// Numeric value of a progress cell, or `None` when there is no usable
/// number. Zero is a real value here, unlike in plain columns.
pub fn coerce_progress(raw: Option<&RawValue>) -> Option<f64> {
    let value = match raw? {
        RawValue::Text(text) => {
            let trimmed = text.trim();
            parse_leading_decimal(trimmed.strip_suffix('%').unwrap_or(trimmed))?
        }
        RawValue::Number(value) => *value,
    };
    (!value.is_nan()).then_some(value)
}

/// Display text of a plain cell. Falsy values, including the number zero,
/// render as the em-dash.
pub fn coerce_plain(raw: Option<&RawValue>) -> String {
    raw.filter(|value| value.is_truthy())
        .map_or_else(|| EM_DASH.to_owned(), RawValue::display)
}

/// Coerces a value for any column kind that needs no image resolution.
/// Image columns passed here are rendered as plain text.
pub fn coerce_value(kind: ColumnKind, raw: Option<&RawValue>) -> DisplayValue {
    match kind {
        ColumnKind::Date => DisplayValue::FormattedDate(coerce_date(raw)),
        ColumnKind::Progress => {
            DisplayValue::Progress(coerce_progress(raw).map(ProgressBar::from_value))
        }
        ColumnKind::Plain | ColumnKind::Image => DisplayValue::Text(coerce_plain(raw)),
    }
}

pub fn format_display_date(date: Date) -> Option<String> {
    date.format(&format_description!("[day]/[month]/[year]"))
        .ok()
}

fn coerce_date_text(text: &str) -> String {
    if let Some(date) = parse_date_token(text.trim())
        && let Some(formatted) = format_display_date(date)
    {
        return formatted;
    }

    if DISPLAY_DATE.is_match(text) {
        return text.to_owned();
    }

    parse_general_date(text)
        .and_then(format_display_date)
        .unwrap_or_else(|| text.to_owned())
}

fn parse_date_token(text: &str) -> Option<Date> {
    let captures = DATE_TOKEN.captures(text)?;
    let year = captures[1].parse::<i32>().ok()?;
    let month_index = captures[2].parse::<u8>().ok()?;
    let day = captures[3].parse::<u8>().ok()?;
    let month = Month::try_from(month_index.checked_add(1)?).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

fn parse_general_date(text: &str) -> Option<Date> {
    let input = text.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(value) = OffsetDateTime::parse(input, &Rfc3339) {
        return Some(value.date());
    }

    let datetime_layouts = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ];
    if let Some(date) = datetime_layouts.iter().find_map(|layout| {
        PrimitiveDateTime::parse(input, layout)
            .ok()
            .map(PrimitiveDateTime::date)
    }) {
        return Some(date);
    }

    let date_layouts = [
        format_description!("[year]-[month]-[day]"),
        format_description!("[year]/[month]/[day]"),
        format_description!(
            "[month repr:long case_sensitive:false] [day padding:none], [year]"
        ),
        format_description!(
            "[month repr:short case_sensitive:false] [day padding:none], [year]"
        ),
        format_description!(
            "[day padding:none] [month repr:long case_sensitive:false] [year]"
        ),
    ];
    date_layouts
        .iter()
        .find_map(|layout| Date::parse(input, layout).ok())
}

fn date_from_epoch_millis(millis: f64) -> Option<Date> {
    if !millis.is_finite() {
        return None;
    }
    let nanos = (millis.trunc() as i128).checked_mul(1_000_000)?;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .map(OffsetDateTime::date)
}

// Parses the longest decimal prefix of `input`, ignoring whatever follows
// ("45.5 pts" is 45.5). Leading whitespace is skipped.
fn parse_leading_decimal(input: &str) -> Option<f64> {
    let input = input.trim_start();
    let bytes = input.as_bytes();
    let mut index = 0usize;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        index += 1;
    }

    if input[index..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = index;
    skip_ascii_digits(bytes, &mut index);
    let mut digits = index - int_start;

    if bytes.get(index) == Some(&b'.') {
        let frac_start = index + 1;
        let mut frac_end = frac_start;
        skip_ascii_digits(bytes, &mut frac_end);
        digits += frac_end - frac_start;
        if digits > 0 {
            index = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(index), Some(b'e' | b'E')) {
        let mut exp_end = index + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        skip_ascii_digits(bytes, &mut exp_end);
        if exp_end > exp_digits_start {
            index = exp_end;
        }
    }

    input[..index].parse::<f64>().ok()
}

fn skip_ascii_digits(bytes: &[u8], index: &mut usize) {
    while *index < bytes.len() && bytes[*index].is_ascii_digit() {
        *index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        coerce_date, coerce_plain, coerce_progress, coerce_value, format_display_date,
        parse_leading_decimal,
    };
    use crate::{ColumnKind, DisplayValue, ProgressBar, RawValue};
    use time::{Date, Month};

    fn text(value: &str) -> RawValue {
        RawValue::text(value)
    }

    #[test]
    fn coerce_date_formats_spreadsheet_token() {
        assert_eq!(coerce_date(Some(&text("Date(2023,0,15)"))), "15/01/2023");
        assert_eq!(coerce_date(Some(&text("Date(2024,11,31)"))), "31/12/2024");
        assert_eq!(
            coerce_date(Some(&text("Date(2024,1,29,13,45,0)"))),
            "29/02/2024"
        );
    }

    #[test]
    fn coerce_date_token_tolerates_surrounding_whitespace() {
        for input in ["Date(2023,0,15) ", "  Date(2023,0,15)", "\tDate(2023,0,15)\n"] {
            assert_eq!(coerce_date(Some(&text(input))), "15/01/2023", "input {input:?}");
        }
    }

    #[test]
    fn coerce_date_invalid_token_falls_through_to_raw_text() {
        for input in ["Date(2023,12,1)", "Date(2023,1,30)", "Date(2023,0,0)"] {
            assert_eq!(coerce_date(Some(&text(input))), input, "input {input}");
        }
    }

    #[test]
    fn coerce_date_empty_values_render_em_dash() {
        assert_eq!(coerce_date(None), "—");
        assert_eq!(coerce_date(Some(&text(""))), "—");
        assert_eq!(coerce_date(Some(&RawValue::Number(0.0))), "—");
    }

    #[test]
    fn coerce_date_keeps_display_form_unchanged() {
        for input in ["31/12/2024", "1/2/2024", "07/3/1999"] {
            assert_eq!(coerce_date(Some(&text(input))), input, "input {input}");
        }
    }

    #[test]
    fn coerce_date_parses_general_forms() {
        let cases = [
            ("2024-03-05", "05/03/2024"),
            (" 2024-03-05 ", "05/03/2024"),
            ("2024/03/05", "05/03/2024"),
            ("2024-03-05T10:30:00", "05/03/2024"),
            ("2024-03-05 10:30:00", "05/03/2024"),
            ("2024-03-05T23:30:00Z", "05/03/2024"),
            ("March 5, 2024", "05/03/2024"),
            ("mar 5, 2024", "05/03/2024"),
            ("5 March 2024", "05/03/2024"),
        ];
        for (input, expected) in cases {
            assert_eq!(coerce_date(Some(&text(input))), expected, "input {input}");
        }
    }

    #[test]
    fn coerce_date_unparseable_text_is_returned_unchanged() {
        for input in ["soon", "Q3", "2024-13-40", "Date(x,y,z)"] {
            assert_eq!(coerce_date(Some(&text(input))), input, "input {input}");
        }
    }

    #[test]
    fn coerce_date_treats_numbers_as_epoch_millis() {
        assert_eq!(
            coerce_date(Some(&RawValue::Number(1_704_067_200_000.0))),
            "01/01/2024"
        );
        assert_eq!(
            coerce_date(Some(&RawValue::Number(f64::INFINITY))),
            "Infinity"
        );
    }

    #[test]
    fn coerce_progress_test() {
        let cases = [
            ("-45%", -45.0),
            ("45%", 45.0),
            ("12.5", 12.5),
            (" 80 %", 80.0),
            ("0", 0.0),
            ("45.5% done", 45.5),
            ("1e2%", 100.0),
        ];
        for (input, expected) in cases {
            assert_eq!(coerce_progress(Some(&text(input))), Some(expected), "input {input}");
        }
    }

    #[test]
    fn coerce_progress_missing_or_non_numeric_is_none() {
        assert_eq!(coerce_progress(None), None);
        for input in ["", "   ", "%", "n/a", "-", "."] {
            assert_eq!(coerce_progress(Some(&text(input))), None, "input {input}");
        }
        assert_eq!(coerce_progress(Some(&RawValue::Number(f64::NAN))), None);
    }

    #[test]
    fn coerce_progress_keeps_numeric_zero() {
        assert_eq!(coerce_progress(Some(&RawValue::Number(0.0))), Some(0.0));
        assert_eq!(coerce_progress(Some(&RawValue::Number(-3.0))), Some(-3.0));
    }

    #[test]
    fn negative_progress_renders_magnitude() {
        let value = coerce_progress(Some(&text("-45%"))).expect("progress should parse");
        let bar = ProgressBar::from_value(value);
        assert!(bar.is_negative);
        assert_eq!(bar.label(), "45%");
        assert_eq!(bar.bar_width(), 45.0);
    }

    #[test]
    fn coerce_plain_test() {
        assert_eq!(coerce_plain(Some(&text("Ops"))), "Ops");
        assert_eq!(coerce_plain(Some(&RawValue::Number(42.0))), "42");
        assert_eq!(coerce_plain(Some(&text(""))), "—");
        assert_eq!(coerce_plain(None), "—");
    }

    #[test]
    fn coerce_plain_renders_zero_as_em_dash() {
        assert_eq!(coerce_plain(Some(&RawValue::Number(0.0))), "—");
        assert_eq!(coerce_plain(Some(&text("0"))), "0");
    }

    #[test]
    fn coerce_value_dispatches_by_kind() {
        let raw = text("Date(2023,0,15)");
        assert_eq!(
            coerce_value(ColumnKind::Date, Some(&raw)),
            DisplayValue::FormattedDate("15/01/2023".to_owned())
        );
        assert_eq!(
            coerce_value(ColumnKind::Plain, Some(&raw)),
            DisplayValue::Text("Date(2023,0,15)".to_owned())
        );
        assert_eq!(
            coerce_value(ColumnKind::Progress, None),
            DisplayValue::Progress(None)
        );
    }

    #[test]
    fn parse_leading_decimal_test() {
        assert_eq!(parse_leading_decimal("3.25abc"), Some(3.25));
        assert_eq!(parse_leading_decimal(".5"), Some(0.5));
        assert_eq!(parse_leading_decimal("7."), Some(7.0));
        assert_eq!(parse_leading_decimal("2e"), Some(2.0));
        assert_eq!(parse_leading_decimal("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_leading_decimal("abc"), None);
    }

    #[test]
    fn format_display_date_pads_day_and_month() {
        let date = Date::from_calendar_date(2025, Month::June, 1).expect("valid date");
        assert_eq!(format_display_date(date).as_deref(), Some("01/06/2025"));
    }
}
