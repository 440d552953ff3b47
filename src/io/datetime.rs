//! Parsers for the timestamp formats that appear in CEOS records.
//!
//! Three formats show up in practice: the compact scene time
//! `YYYYMMDDhhmmssttt` of the dataset summary, the azimuth time strings
//! `dd-MMM-yyyy hh:mm:ss.ttt`, and the ALOS workreport form
//! `YYYYMMDD hh:mm:ss.ttt`.

use crate::types::{CeosError, CeosResult};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Parse the dataset summary scene time (`inp_sctim`), format
/// `YYYYMMDDhhmmssttt`. Trailing blanks and a truncated millisecond field
/// are tolerated since some facilities pad the field.
pub fn parse_scene_time(raw: &str) -> CeosResult<NaiveDateTime> {
    let s = raw.trim();
    if s.len() < 14 {
        return Err(CeosError::InvalidFormat(format!(
            "scene time '{}' shorter than YYYYMMDDhhmmss",
            raw
        )));
    }
    let millis: u32 = if s.len() > 14 {
        let frac = &s[14..s.len().min(17)];
        // right-pad a short fraction: "9" means 900 ms
        let padded = format!("{:0<3}", frac);
        padded
            .parse()
            .map_err(|_| CeosError::InvalidFormat(format!("bad scene time fraction '{}'", raw)))?
    } else {
        0
    };
    let dt = NaiveDateTime::parse_from_str(&s[..14], "%Y%m%d%H%M%S")
        .map_err(|e| CeosError::InvalidFormat(format!("bad scene time '{}': {}", raw, e)))?;
    dt.with_nanosecond(millis * 1_000_000)
        .ok_or_else(|| CeosError::InvalidFormat(format!("bad scene time '{}'", raw)))
}

/// Parse an azimuth time string (`az_time_first` / `az_time_center`),
/// format `dd-MMM-yyyy hh:mm:ss.ttt`, returning seconds of day. Only the
/// time-of-day part participates in azimuth timing arithmetic.
pub fn parse_azimuth_seconds(raw: &str) -> CeosResult<f64> {
    let s = raw.trim();
    let time_part = s
        .split_whitespace()
        .last()
        .ok_or_else(|| CeosError::InvalidFormat(format!("empty azimuth time '{}'", raw)))?;
    let t = NaiveTime::parse_from_str(time_part, "%H:%M:%S%.f")
        .map_err(|e| CeosError::InvalidFormat(format!("bad azimuth time '{}': {}", raw, e)))?;
    Ok(time_seconds(t))
}

/// Parse an ALOS workreport timestamp, format `YYYYMMDD hh:mm:ss.ttt`.
pub fn parse_workreport_time(raw: &str) -> CeosResult<NaiveDateTime> {
    let s = raw.trim();
    NaiveDateTime::parse_from_str(s, "%Y%m%d %H:%M:%S%.f")
        .map_err(|e| CeosError::InvalidFormat(format!("bad workreport time '{}': {}", raw, e)))
}

/// Seconds since midnight, fractional.
pub fn time_seconds(t: NaiveTime) -> f64 {
    t.num_seconds_from_midnight() as f64 + t.nanosecond() as f64 * 1e-9
}

/// Seconds since midnight of a full timestamp.
pub fn seconds_of_day(dt: &NaiveDateTime) -> f64 {
    time_seconds(dt.time())
}

/// Day-of-year (1-based) of a date.
pub fn julian_day(d: &NaiveDate) -> i32 {
    d.ordinal() as i32
}

/// Render a timestamp in the `DD-Mon-YYYY, hh:mm` form used for the
/// acquisition date field.
pub fn format_acquisition_date(dt: &NaiveDateTime) -> String {
    dt.format("%d-%b-%Y, %H:%M").to_string()
}

/// Parse a scene header acquisition date (`YYYYMMDD`) and render it in the
/// `DD-Mon-YYYY` form. Optical products with a blank scene time only carry
/// this field.
pub fn format_acquisition_day(raw: &str) -> CeosResult<String> {
    let d = NaiveDate::parse_from_str(raw.trim(), "%Y%m%d")
        .map_err(|e| CeosError::InvalidFormat(format!("bad acquisition date '{}': {}", raw, e)))?;
    Ok(d.format("%d-%b-%Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn scene_time_with_milliseconds() {
        let dt = parse_scene_time("19950817104133999").unwrap();
        assert_eq!(dt.year(), 1995);
        assert_eq!(dt.month(), 8);
        assert_eq!(dt.day(), 17);
        assert_relative_eq!(seconds_of_day(&dt), 10.0 * 3600.0 + 41.0 * 60.0 + 33.999);
    }

    #[test]
    fn scene_time_padded_field() {
        let dt = parse_scene_time("20060304120000   ").unwrap();
        assert_relative_eq!(seconds_of_day(&dt), 12.0 * 3600.0);
    }

    #[test]
    fn scene_time_too_short_is_an_error() {
        assert!(parse_scene_time("1995081").is_err());
    }

    #[test]
    fn azimuth_time_uses_time_of_day_only() {
        let s = parse_azimuth_seconds("17-AUG-1995 10:41:33.500").unwrap();
        assert_relative_eq!(s, 10.0 * 3600.0 + 41.0 * 60.0 + 33.5);
        // bare time strings also occur
        let s = parse_azimuth_seconds("00:00:01.250").unwrap();
        assert_relative_eq!(s, 1.25);
    }

    #[test]
    fn acquisition_day_rendering() {
        assert_eq!(format_acquisition_day("20060304  ").unwrap(), "04-Mar-2006");
        assert!(format_acquisition_day("        ").is_err());
    }

    #[test]
    fn workreport_time() {
        let dt = parse_workreport_time("20060304 12:00:01.750").unwrap();
        assert_eq!(julian_day(&dt.date()), 63);
        assert_relative_eq!(seconds_of_day(&dt), 12.0 * 3600.0 + 1.75);
    }
}
