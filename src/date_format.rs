//! Translation of `DATE(pattern)` type tokens into chrono layouts.
//!
//! A schema's third field may carry a token such as `DATE(MM/DD/YYYY)`. The
//! bracketed pattern is rewritten into a strftime layout by replacing the
//! first `YYYY`, then the first `MM`, then the first `DD`. Anything else in
//! the pattern is kept literally, so a malformed pattern surfaces later as a
//! per-field parse failure rather than here.

use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use chrono::{
    Local, NaiveDate, TimeZone,
    format::{self, Parsed, StrftimeItems},
};
use regex::Regex;

pub const DEFAULT_DATE_LAYOUT: &str = "%Y-%m-%d";

/// Marker that flags a type token as a date conversion.
pub const DATE_TYPE_MARKER: &str = "DATE";

static DATE_TOKEN: OnceLock<Regex> = OnceLock::new();

fn date_token_regex() -> &'static Regex {
    DATE_TOKEN.get_or_init(|| Regex::new(r"DATE\(([A-Za-z\-/:]+)\)").expect("valid date regex"))
}

pub fn is_date_type(column_type: &str) -> bool {
    column_type.contains(DATE_TYPE_MARKER)
}

pub fn parse_date_format(column_type: &str) -> String {
    let Some(captures) = date_token_regex().captures(column_type) else {
        return DEFAULT_DATE_LAYOUT.to_string();
    };
    let pattern = &captures[1];
    pattern
        .replacen("YYYY", "%Y", 1)
        .replacen("MM", "%m", 1)
        .replacen("DD", "%d", 1)
}

/// Parses `field` with `layout` as a local midnight and renders it with
/// chrono's default `DateTime<Local>` formatting.
pub fn convert_date(field: &str, layout: &str) -> Result<String> {
    let date = parse_date(field, layout)?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid midnight for {date}"))?;
    let local = Local
        .from_local_datetime(&midnight)
        .earliest()
        .ok_or_else(|| anyhow!("Local time {midnight} does not exist in this time zone"))?;
    Ok(local.to_string())
}

/// Month and day absent from the layout default to 1; the year is required.
/// Fields must be zero-padded to the layout's width with nothing around them.
fn parse_date(field: &str, layout: &str) -> Result<NaiveDate> {
    let fail = |reason: String| {
        anyhow!("Failed to parse '{field}' with layout '{layout}': {reason}")
    };
    let mut parsed = Parsed::new();
    format::parse(&mut parsed, field, StrftimeItems::new(layout))
        .map_err(|err| fail(err.to_string()))?;
    if !layout.contains("%m") {
        parsed.set_month(1).map_err(|err| fail(err.to_string()))?;
    }
    if !layout.contains("%d") {
        parsed.set_day(1).map_err(|err| fail(err.to_string()))?;
    }
    let date = parsed.to_naive_date().map_err(|err| fail(err.to_string()))?;
    if date.format(layout).to_string() != field {
        return Err(fail("fields are not zero-padded to the layout".to_string()));
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_midnight(year: i32, month: u32, day: u32) -> String {
        let naive = NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap()
            .to_string()
    }

    #[test]
    fn parse_date_format_translates_placeholders() {
        assert_eq!(parse_date_format("DATE(YYYY-MM-DD)"), "%Y-%m-%d");
        assert_eq!(parse_date_format("DATE(MM/DD/YYYY)"), "%m/%d/%Y");
        assert_eq!(parse_date_format("DATE(DD:MM:YYYY)"), "%d:%m:%Y");
    }

    #[test]
    fn parse_date_format_defaults_without_brackets() {
        assert_eq!(parse_date_format("DATE"), DEFAULT_DATE_LAYOUT);
        assert_eq!(parse_date_format(""), DEFAULT_DATE_LAYOUT);
        assert_eq!(parse_date_format("DATE()"), DEFAULT_DATE_LAYOUT);
        assert_eq!(parse_date_format("DATE(YYYY.MM.DD)"), DEFAULT_DATE_LAYOUT);
    }

    #[test]
    fn parse_date_format_passes_unknown_pattern_through() {
        assert_eq!(parse_date_format("DATE(YMD)"), "YMD");
    }

    #[test]
    fn parse_date_format_replaces_only_first_occurrence() {
        assert_eq!(parse_date_format("DATE(YYYY-MM-MM)"), "%Y-%m-MM");
        assert_eq!(parse_date_format("DATE(DD-DD-YYYYYYYY)"), "%d-DD-%YYYYY");
    }

    #[test]
    fn parse_date_format_uses_first_bracketed_match() {
        assert_eq!(
            parse_date_format("text DATE(YYYY/MM/DD) DATE(DD-MM-YYYY)"),
            "%Y/%m/%d"
        );
    }

    #[test]
    fn convert_date_renders_local_midnight() {
        assert_eq!(
            convert_date("2021-01-02", "%Y-%m-%d").unwrap(),
            local_midnight(2021, 1, 2)
        );
        assert_eq!(
            convert_date("2021/01/02", "%Y/%m/%d").unwrap(),
            local_midnight(2021, 1, 2)
        );
        assert_eq!(
            convert_date("12/31/1999", "%m/%d/%Y").unwrap(),
            local_midnight(1999, 12, 31)
        );
    }

    #[test]
    fn convert_date_defaults_missing_month_and_day() {
        let layout = parse_date_format("DATE(YYYY/MM)");
        assert_eq!(layout, "%Y/%m");
        assert_eq!(convert_date("2021/03", &layout).unwrap(), local_midnight(2021, 3, 1));
        let layout = parse_date_format("DATE(YYYY)");
        assert_eq!(convert_date("2021", &layout).unwrap(), local_midnight(2021, 1, 1));
    }

    #[test]
    fn convert_date_requires_a_year() {
        assert!(convert_date("03/04", "%m/%d").is_err());
    }

    #[test]
    fn convert_date_rejects_unpadded_or_padded_input() {
        assert!(convert_date(" 2021-01-02", DEFAULT_DATE_LAYOUT).is_err());
        assert!(convert_date("2021-01-02 ", DEFAULT_DATE_LAYOUT).is_err());
        assert!(convert_date("2021-1-2", DEFAULT_DATE_LAYOUT).is_err());
        assert!(convert_date("21-01-02", DEFAULT_DATE_LAYOUT).is_err());
    }

    #[test]
    fn convert_date_rejects_mismatched_values() {
        assert!(convert_date("not-a-date", "%Y/%m/%d").is_err());
        assert!(convert_date("2021-01-02", "%Y/%m/%d").is_err());
        assert!(convert_date("", "%Y-%m-%d").is_err());
        assert!(convert_date("YMD", "YMD").is_err());
    }
}
