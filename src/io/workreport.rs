//! ALOS workreport summary files.
//!
//! ALOS deliveries ship a plain-text summary next to the CEOS files, either
//! as `<base>.txt` or as a file literally named `workreport` in the same
//! directory. It is the only reliable source for the scene duration of
//! ALOS products, so the SAR normalizer consults it when computing azimuth
//! timing. A missing or non-matching summary is not an error; the caller
//! falls back to an unset azimuth time.

use crate::io::datetime::{parse_scene_time, parse_workreport_time};
use crate::types::CeosResult;
use chrono::NaiveDateTime;
use log::{info, warn};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Scene timing read from a workreport summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTiming {
    pub start: NaiveDateTime,
    pub center: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl SceneTiming {
    /// Scene duration in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }
}

/// Locate the summary file for `base` (the CEOS basename, no extension).
fn find_summary_file(base: &Path) -> Option<PathBuf> {
    let mut txt = base.as_os_str().to_owned();
    txt.push(".txt");
    let txt = PathBuf::from(txt);
    if txt.is_file() {
        return Some(txt);
    }
    warn!(
        "Summary file '{}' not found. Will try 'workreport'",
        txt.display()
    );
    let report = match base.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join("workreport"),
        _ => PathBuf::from("workreport"),
    };
    if report.is_file() {
        info!("Summary file 'workreport' found.");
        Some(report)
    } else {
        warn!(
            "Summary file '{}' does not exist. If you received a 'workreport' file \
             with this data please make sure it is in the same directory as the data file.",
            report.display()
        );
        None
    }
}

/// Scene duration for an ALOS product, from its workreport summary.
///
/// `scene_time` is the dataset summary scene center time (`YYYYMMDDhhmmssttt`);
/// a summary whose center time disagrees with it belongs to a different
/// scene and is rejected with a warning. Returns `Ok(None)` when no usable
/// summary exists.
pub fn alos_scene_duration(base: &Path, scene_time: &str) -> CeosResult<Option<f64>> {
    let Some(summary) = find_summary_file(base) else {
        return Ok(None);
    };
    let dssr_center = parse_scene_time(scene_time)?;
    let text = fs::read_to_string(&summary)?;

    // lines look like: Img_SceneStartDateTime="20060304 12:00:01.750"
    let quoted = Regex::new(r#""([^"]*)""#).unwrap();
    let value_of = |line: &str| -> Option<String> {
        quoted
            .captures(line)
            .map(|c| c.get(1).unwrap().as_str().to_string())
    };

    let mut start = None;
    let mut end = None;
    for line in text.lines() {
        if line.contains("Img_SceneCenterDateTime") {
            let Some(v) = value_of(line) else { continue };
            let center = parse_workreport_time(&v)?;
            if center != dssr_center {
                warn!(
                    "Summary file does not correspond to leader file. DSSR: {} Summary: {}",
                    scene_time, v
                );
                return Ok(None);
            }
        } else if line.contains("Img_SceneStartDateTime") {
            if let Some(v) = value_of(line) {
                start = Some(parse_workreport_time(&v)?);
            }
        } else if line.contains("Img_SceneEndDateTime") {
            if let Some(v) = value_of(line) {
                end = Some(parse_workreport_time(&v)?);
            }
        }
    }

    match (start, end) {
        (Some(s), Some(e)) => Ok(Some(
            SceneTiming {
                start: s,
                center: dssr_center,
                end: e,
            }
            .duration(),
        )),
        _ => {
            warn!(
                "Summary file '{}' is missing scene start/end times.",
                summary.display()
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const SCENE_TIME: &str = "20060304120000750";

    fn write_summary(path: &Path, center: &str, start: &str, end: &str) {
        let mut f = File::create(path).unwrap();
        writeln!(f, "Img_SceneCenterDateTime=\"{}\"", center).unwrap();
        writeln!(f, "Img_SceneStartDateTime=\"{}\"", start).unwrap();
        writeln!(f, "Img_SceneEndDateTime=\"{}\"", end).unwrap();
        writeln!(f, "Brs_ImageFileName=\"dummy.jpg\"").unwrap();
    }

    #[test]
    fn duration_from_base_txt() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("ALPSRP012345678");
        write_summary(
            &dir.path().join("ALPSRP012345678.txt"),
            "20060304 12:00:00.750",
            "20060304 11:59:56.000",
            "20060304 12:00:05.500",
        );
        let d = alos_scene_duration(&base, SCENE_TIME)
            .expect("summary should parse")
            .expect("duration should be present");
        assert_relative_eq!(d, 9.5);
    }

    #[test]
    fn falls_back_to_workreport_in_directory() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("scene");
        write_summary(
            &dir.path().join("workreport"),
            "20060304 12:00:00.750",
            "20060304 11:59:50.000",
            "20060304 12:00:10.000",
        );
        let d = alos_scene_duration(&base, SCENE_TIME).unwrap().unwrap();
        assert_relative_eq!(d, 20.0);
    }

    #[test]
    fn missing_summary_is_not_an_error() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("scene");
        assert!(alos_scene_duration(&base, SCENE_TIME).unwrap().is_none());
    }

    #[test]
    fn mismatched_center_time_is_rejected() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("scene");
        write_summary(
            &dir.path().join("scene.txt"),
            "20070101 00:00:00.000",
            "20070101 00:00:00.000",
            "20070101 00:00:09.000",
        );
        assert!(alos_scene_duration(&base, SCENE_TIME).unwrap().is_none());
    }
}
