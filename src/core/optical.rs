//! The optical normalizer for ALOS AVNIR-2 and PRISM products.
//!
//! Optical CEOS is much simpler than SAR: everything of interest lives in
//! the scene header plus, for map-corrected products, the optical map
//! projection record. Processing level is encoded in the product id
//! (`1A`, `1B1`, `1B2R` georeferenced, `1B2G` geocoded) and most of the
//! decode branches on it.

use crate::core::classify::{CeosDescription, Sensor};
use crate::core::geometry::GeoCollaborator;
use crate::core::proj::init_optical_projection;
use crate::io::datetime::{format_acquisition_date, format_acquisition_day, parse_scene_time};
use crate::io::names::CeosFileSet;
use crate::io::records::{AlosMapProjection, RecordReader, SceneHeader};
use crate::types::{
    CeosError, CeosResult, DataType, LocationBlock, OpticalBlock, TransformBlock, UnifiedMetadata,
};
use log::warn;

fn first_token(s: &str) -> &str {
    s.split_whitespace().next().unwrap_or("")
}

/// Leading integer of a string slice, `atoi` style: digits up to the first
/// non-digit, zero when there are none.
fn leading_int(s: &str) -> i32 {
    let t = s.trim_start();
    let digits: String = t.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Processing level from the product id, e.g. `"O1B2R_U"` is `1B2R`.
fn processing_level(product_id: &str) -> &'static str {
    let Some(rest) = product_id.get(1..) else {
        return "";
    };
    if rest.starts_with("1B2R") {
        "1B2R"
    } else if rest.starts_with("1B2G") {
        "1B2G"
    } else if rest.starts_with("1B1") {
        "1B1"
    } else if rest.starts_with("1A") {
        "1A"
    } else {
        ""
    }
}

/// Normalize an AVNIR-2 or PRISM product.
pub fn normalize_optical(
    reader: &dyn RecordReader,
    geo: Option<&dyn GeoCollaborator>,
    files: &CeosFileSet,
    ceos: &CeosDescription,
) -> CeosResult<UnifiedMetadata> {
    let shr = ceos
        .shr
        .clone()
        .ok_or_else(|| CeosError::Metadata("optical product without scene header".to_string()))?;
    let ampr = reader.alos_map_projection(&files.leader)?;

    let mut meta = UnifiedMetadata::default();
    let mode = processing_level(&shr.product_id);

    fill_general(files, ceos, &shr, ampr.as_ref(), mode, &mut meta);
    meta.optical = Some(build_optical_block(ceos, &shr, mode));
    meta.location = Some(LocationBlock {
        lat_start_near_range: shr.lat_ul,
        lon_start_near_range: shr.lon_ul,
        lat_start_far_range: shr.lat_ur,
        lon_start_far_range: shr.lon_ur,
        lat_end_near_range: shr.lat_ll,
        lon_end_near_range: shr.lon_ll,
        lat_end_far_range: shr.lat_lr,
        lon_end_far_range: shr.lon_lr,
    });

    // geocoded products get a full projection block; georeferenced ones
    // only get the corner transform below
    if shr.product_id.chars().nth(4) == Some('G')
        && matches!(shr.product_id.chars().nth(6), Some('U') | Some('P'))
    {
        if let Some(ampr) = &ampr {
            finish_projection(geo, ampr, &shr, &mut meta)?;
        } else {
            warn!("geocoded product without a map projection record; projection block omitted");
        }
    }

    if mode == "1B2R" {
        if let Some(ampr) = &ampr {
            meta.transform = Some(TransformBlock {
                parameter_count: 10,
                x: ampr.coeff_lambda.to_vec(),
                y: ampr.coeff_phi.to_vec(),
                l: ampr.coeff_j.to_vec(),
                s: ampr.coeff_i.to_vec(),
            });
        }
    }

    Ok(meta)
}

fn fill_general(
    files: &CeosFileSet,
    ceos: &CeosDescription,
    shr: &SceneHeader,
    ampr: Option<&AlosMapProjection>,
    mode: &str,
    meta: &mut UnifiedMetadata,
) {
    let general = &mut meta.general;
    general.sensor = first_token(&shr.mission_id).to_string();
    general.sensor_name = match ceos.sensor {
        Sensor::Avnir => "AVNIR".to_string(),
        Sensor::Prism => "PRISM".to_string(),
        _ => String::new(),
    };
    general.mode = mode.to_string();
    general.data_type = DataType::Byte;

    // level 1B2 centers are given in the corrected geometry
    if mode.starts_with("1B2") {
        general.center_latitude = shr.center_latitude2;
        general.center_longitude = shr.center_longitude2;
    } else {
        general.center_latitude = shr.center_latitude;
        general.center_longitude = shr.center_longitude;
    }

    // a blank scene time means only the acquisition date field was filled
    if shr.scene_time.starts_with(' ') || shr.scene_time.trim().is_empty() {
        if let Ok(day) = format_acquisition_day(&shr.acq_date) {
            general.acquisition_date = day;
        }
    } else if let Ok(dt) = parse_scene_time(&shr.scene_time) {
        general.acquisition_date = format_acquisition_date(&dt);
    }

    general.orbit = shr.orbit;
    general.orbit_direction = match shr.orbit_direction.chars().next() {
        Some('A') => crate::types::OrbitDirection::Ascending,
        Some('D') => crate::types::OrbitDirection::Descending,
        _ => crate::types::OrbitDirection::Unknown,
    };
    general.frame = shr.work_scene_id.get(11..).map_or(0, leading_int);
    general.band_count = files.band_count;
    general.line_count = shr.lines;
    general.sample_count = shr.samples;
    general.start_line = 0;
    general.start_sample = 0;

    if let Some(ampr) = ampr {
        if mode.starts_with("1B2") {
            general.x_pixel_size = ampr.x_pixel_size2;
            general.y_pixel_size = ampr.y_pixel_size2;
        } else {
            general.x_pixel_size = ampr.x_pixel_size;
            general.y_pixel_size = ampr.y_pixel_size;
        }
        general.re_major = ampr.ref_major_axis;
        general.re_minor = ampr.ref_minor_axis;
    }
}

fn build_optical_block(ceos: &CeosDescription, shr: &SceneHeader, mode: &str) -> OpticalBlock {
    let mut optical = OpticalBlock {
        off_nadir_angle: shr.off_nadir_angle,
        ..Default::default()
    };

    match ceos.sensor {
        Sensor::Prism => {
            // PRISM carries three fixed telescopes
            optical.pointing_direction = match shr.product_id.chars().nth(7) {
                Some('F') => "Forward".to_string(),
                Some('B') => "Backward".to_string(),
                _ => "Nadir".to_string(),
            };
        }
        Sensor::Avnir => {
            optical.pointing_direction = if optical.off_nadir_angle > 0.0 {
                "Off-nadir".to_string()
            } else {
                "Nadir".to_string()
            };
        }
        _ => {}
    }

    optical.correction_level = if mode == "1A" {
        "N".to_string()
    } else {
        shr.proc_code.get(6..9).unwrap_or("").trim().to_string()
    };

    // sun angle field layout: "UA=xxx.x SUN EL35 AZ120" style, elevation at
    // offset 6 and azimuth at offset 11
    optical.sun_elevation_angle = shr
        .sun_angle
        .get(6..9)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0.0);
    optical.sun_azimuth_angle = shr
        .sun_angle
        .get(11..14)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0.0);
    optical
}

/// Geocoded (1B2G) products: projection parameters from the optical map
/// projection record, anchored at the upper-left corner.
fn finish_projection(
    geo: Option<&dyn GeoCollaborator>,
    ampr: &AlosMapProjection,
    shr: &SceneHeader,
    meta: &mut UnifiedMetadata,
) -> CeosResult<()> {
    init_optical_projection(meta, shr, ampr);
    let Some(proj) = meta.projection.as_mut() else {
        return Ok(());
    };
    proj.per_x = ampr.x_pixel_size2;
    proj.per_y = -ampr.y_pixel_size2;

    match geo {
        Some(geo) => {
            let (x, y) = geo.latlon_to_proj(proj, shr.lat_ul, shr.lon_ul)?;
            proj.start_x = x;
            proj.start_y = y;
        }
        None => warn!("no geometry collaborator; projection start coordinates left unset"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::{Facility, Processor, Product, Satellite};
    use crate::io::records::{
        AsfFacility, DatasetSummary, EsaFacility, FileDescriptor, ImageFileDescriptor,
        LinePolarization, MapProjection, PositionData, ProcessingParameters,
        RadiometricCompensation,
    };
    use crate::types::{is_unset, OrbitDirection, ProjectionParams};
    use approx::assert_relative_eq;
    use std::path::{Path, PathBuf};

    struct StubReader {
        ampr: Option<AlosMapProjection>,
    }

    impl RecordReader for StubReader {
        fn dataset_summary(&self, _: &Path) -> CeosResult<Option<DatasetSummary>> {
            Ok(None)
        }
        fn scene_header(&self, _: &Path) -> CeosResult<Option<SceneHeader>> {
            Ok(None)
        }
        fn file_descriptor(&self, _: &Path) -> CeosResult<Option<FileDescriptor>> {
            Ok(None)
        }
        fn image_file_descriptor(&self, _: &Path) -> CeosResult<Option<ImageFileDescriptor>> {
            Ok(None)
        }
        fn map_projection(&self, _: &Path) -> CeosResult<Option<MapProjection>> {
            Ok(None)
        }
        fn alos_map_projection(&self, _: &Path) -> CeosResult<Option<AlosMapProjection>> {
            Ok(self.ampr.clone())
        }
        fn position_data(&self, _: &Path) -> CeosResult<Option<PositionData>> {
            Ok(None)
        }
        fn processing_parameters(&self, _: &Path) -> CeosResult<Option<ProcessingParameters>> {
            Ok(None)
        }
        fn asf_facility(&self, _: &Path) -> CeosResult<Option<AsfFacility>> {
            Ok(None)
        }
        fn esa_facility(&self, _: &Path) -> CeosResult<Option<EsaFacility>> {
            Ok(None)
        }
        fn radiometric_compensation(
            &self,
            _: &Path,
        ) -> CeosResult<Option<RadiometricCompensation>> {
            Ok(None)
        }
        fn first_line_time(&self, _: &Path) -> CeosResult<Option<f64>> {
            Ok(None)
        }
        fn alos_line_polarization(&self, _: &Path) -> CeosResult<Option<LinePolarization>> {
            Ok(None)
        }
    }

    fn file_set() -> CeosFileSet {
        CeosFileSet {
            data: vec![PathBuf::from("IMG-01-scene")],
            leader: PathBuf::from("LED-scene"),
            trailer: None,
            band_count: 4,
            rule_index: 0,
        }
    }

    fn description(sensor: Sensor, shr: SceneHeader) -> CeosDescription {
        CeosDescription {
            satellite: Satellite::Alos,
            sensor,
            facility: Facility::Eoc,
            processor: Processor::Unknown,
            product: Product::Unknown,
            version: 1.0,
            dssr: None,
            shr: Some(shr),
        }
    }

    fn avnir_header(product_id: &str) -> SceneHeader {
        SceneHeader {
            mission_id: "ALOS ".to_string(),
            sensor_id: "AVNIR".to_string(),
            product_id: product_id.to_string(),
            proc_code: "LEVEL 1B2".to_string(),
            work_scene_id: "ALPSMW0000-5123".to_string(),
            scene_time: "20060304120000000".to_string(),
            acq_date: "20060304".to_string(),
            orbit: 1234,
            orbit_direction: "A".to_string(),
            center_latitude: 34.5,
            center_longitude: 135.0,
            center_latitude2: 34.6,
            center_longitude2: 135.1,
            lines: 7000,
            samples: 7100,
            sun_angle: "SUNANG 35.0120.5".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn processing_levels_from_product_id() {
        assert_eq!(processing_level("O1A___U"), "1A");
        assert_eq!(processing_level("O1B1__U"), "1B1");
        assert_eq!(processing_level("O1B2R_U"), "1B2R");
        assert_eq!(processing_level("O1B2G_U"), "1B2G");
        assert_eq!(processing_level(""), "");
    }

    #[test]
    fn geocoded_product_gets_a_projection_block() {
        let reader = StubReader {
            ampr: Some(AlosMapProjection {
                x_pixel_size2: 10.0,
                y_pixel_size2: 10.0,
                ref_major_axis: 6_378_137.0,
                ref_minor_axis: 6_356_752.3,
                hemisphere: 0,
                utm_zone: 54,
                ref_ellipsoid: "GRS80".to_string(),
                geod_coord_name: "ITRF97".to_string(),
                ..Default::default()
            }),
        };
        let ceos = description(Sensor::Avnir, avnir_header("O1B2G_U"));
        let meta = normalize_optical(&reader, None, &file_set(), &ceos)
            .expect("normalize geocoded product");
        let proj = meta.projection.expect("projection block");
        assert!(matches!(proj.param, ProjectionParams::Utm { zone: 54, .. }));
        assert_relative_eq!(proj.per_x, 10.0);
        assert_relative_eq!(proj.per_y, -10.0);
        // no collaborator was supplied, so the anchor stays unset
        assert!(is_unset(proj.start_x));
        assert!(meta.transform.is_none());
    }

    #[test]
    fn georeferenced_product_gets_a_transform_not_a_projection() {
        let mut ampr = AlosMapProjection::default();
        ampr.coeff_lambda[0] = 1.5;
        ampr.coeff_i[9] = -2.5;
        let reader = StubReader { ampr: Some(ampr) };
        let ceos = description(Sensor::Avnir, avnir_header("O1B2R_U"));
        let meta = normalize_optical(&reader, None, &file_set(), &ceos)
            .expect("normalize georeferenced product");
        assert!(meta.projection.is_none());
        let transform = meta.transform.expect("transform block");
        assert_eq!(transform.parameter_count, 10);
        assert_relative_eq!(transform.x[0], 1.5);
        assert_relative_eq!(transform.s[9], -2.5);
        // corrected-geometry center coordinates
        assert_relative_eq!(meta.general.center_latitude, 34.6);
    }

    #[test]
    fn level_1a_uses_raw_center_and_n_correction() {
        let reader = StubReader { ampr: None };
        let mut shr = avnir_header("O1A___U");
        shr.scene_time = "                 ".to_string();
        let ceos = description(Sensor::Avnir, shr);
        let meta =
            normalize_optical(&reader, None, &file_set(), &ceos).expect("normalize level 1A");
        assert_relative_eq!(meta.general.center_latitude, 34.5);
        assert_eq!(meta.general.acquisition_date, "04-Mar-2006");
        let optical = meta.optical.expect("optical block");
        assert_eq!(optical.correction_level, "N");
    }

    #[test]
    fn prism_pointing_comes_from_the_product_id() {
        let reader = StubReader { ampr: None };
        let mut shr = avnir_header("O1B1__UF");
        shr.sensor_id = "PRISM".to_string();
        let ceos = description(Sensor::Prism, shr);
        let meta = normalize_optical(&reader, None, &file_set(), &ceos).expect("normalize PRISM");
        let optical = meta.optical.expect("optical block");
        assert_eq!(optical.pointing_direction, "Forward");
        assert_eq!(optical.correction_level, "1B2");
    }

    #[test]
    fn avnir_pointing_follows_the_off_nadir_angle() {
        let reader = StubReader { ampr: None };
        let mut shr = avnir_header("O1B1__U");
        shr.off_nadir_angle = 12.5;
        let ceos = description(Sensor::Avnir, shr);
        let meta = normalize_optical(&reader, None, &file_set(), &ceos).expect("normalize AVNIR");
        let optical = meta.optical.expect("optical block");
        assert_eq!(optical.pointing_direction, "Off-nadir");
        assert_relative_eq!(optical.off_nadir_angle, 12.5);
    }

    #[test]
    fn sun_angles_and_frame_are_sliced_from_fixed_offsets() {
        let reader = StubReader { ampr: None };
        let ceos = description(Sensor::Avnir, avnir_header("O1B2G_U"));
        let meta = normalize_optical(&reader, None, &file_set(), &ceos).expect("normalize");
        let optical = meta.optical.expect("optical block");
        assert_relative_eq!(optical.sun_elevation_angle, 35.0);
        assert_relative_eq!(optical.sun_azimuth_angle, 120.0);
        assert_eq!(meta.general.frame, 5123);
        assert_eq!(meta.general.orbit, 1234);
        assert_eq!(meta.general.orbit_direction, OrbitDirection::Ascending);
        assert_eq!(meta.general.band_count, 4);
        assert_eq!(meta.general.line_count, 7000);
    }
}
