//! Typed CEOS record structures and the record-reader collaborator trait.
//!
//! Binary record extraction (fixed-width fields, byte swapping, the
//! facility-specific layouts) lives behind [`RecordReader`]; this crate
//! only ever sees fully decoded, owned structs. `Ok(None)` from any reader
//! method means "that record is not in this product", which is normal for
//! most record types and must be tolerated by callers.

use crate::types::CeosResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Facility-record length that marks the ASF flavor of the facility data
/// record.
pub const ASF_FACDR_LEN: i64 = 1717;
/// Facility-record length that marks the ESA flavor.
pub const ESA_FACDR_LEN: i64 = 12288;

/// Dataset summary record (DSSR) — the primary SAR metadata record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub mission_id: String,
    pub sensor_id: String,
    /// Beam identifiers; `beam1` doubles as the mode field, `beam3`
    /// distinguishes RADARSAT ScanSAR variants.
    pub beam1: String,
    pub beam3: String,
    pub facility_id: String,
    pub system_id: String,
    pub version_id: String,
    pub product_type: String,
    pub product_id: String,
    pub level_code: String,
    /// Orbit number, kept as the raw field text.
    pub revolution: String,
    /// Ascending/descending flag field; first character is the flag.
    pub asc_des: String,
    /// Scene time `YYYYMMDDhhmmssmmm`.
    pub scene_time: String,
    pub azimuth_time_first: String,
    pub azimuth_time_center: String,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub scene_center_line: i64,
    pub scene_center_pixel: i64,
    pub wavelength: f64,
    pub prf: f64,
    pub range_sampling_rate: f64,
    pub range_gate: f64,
    pub pulse_length: f64,
    pub azimuth_bandwidth: f64,
    pub phase_coefficients: [f64; 3],
    /// Two-way slant range times to near/mid/far edge, seconds.
    pub range_time: [f64; 3],
    pub pixel_spacing: f64,
    pub line_spacing: f64,
    pub ellipsoid_major: f64,
    pub ellipsoid_minor: f64,
    pub ellipsoid_name: String,
    /// Cross-track (range) Doppler centroid polynomial.
    pub cross_track_doppler: [f64; 3],
    /// Cross-track Doppler rate polynomial. CDPF stores centroid values
    /// here instead.
    pub cross_track_rate: [f64; 3],
    /// Along-track (azimuth) Doppler centroid polynomial.
    pub along_track_doppler: [f64; 3],
    pub azimuth_looks: f64,
    pub range_looks: f64,
    pub antenna_beam_number: i32,
    pub clock_angle: f64,
    pub satellite_binary_time: String,
    pub satellite_clock_time: String,
}

/// Scene header record (SHR) — the primary optical metadata record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneHeader {
    pub mission_id: String,
    pub sensor_id: String,
    pub product_id: String,
    pub proc_code: String,
    pub work_scene_id: String,
    /// Scene center time; blank first character means only `acq_date` is
    /// usable.
    pub scene_time: String,
    pub acq_date: String,
    pub orbit: i32,
    pub orbit_direction: String,
    pub center_latitude: f64,
    pub center_longitude: f64,
    /// Center coordinates of the geocoded (1B2) representation.
    pub center_latitude2: f64,
    pub center_longitude2: f64,
    pub lines: i64,
    pub samples: i64,
    pub lat_ul: f64,
    pub lon_ul: f64,
    pub lat_ur: f64,
    pub lon_ur: f64,
    pub lat_ll: f64,
    pub lon_ll: f64,
    pub lat_lr: f64,
    pub lon_lr: f64,
    pub off_nadir_angle: f64,
    /// Raw sun angle field, e.g. `"SUN EL45 AZ120"` layout with elevation
    /// at offset 6 and azimuth 5 further on.
    pub sun_angle: String,
}

/// File descriptor record; only the facility-record length matters here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub facility_record_length: i64,
}

/// Image file descriptor record (lives in the data file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageFileDescriptor {
    pub bits_per_sample: i64,
    pub samples_per_group: i64,
    pub bytes_per_group: i64,
    pub format_id: String,
    pub record_count: i64,
    pub record_length: i64,
    pub prefix_bytes: i64,
    pub suffix_bytes: i64,
    pub left_border_pixels: i64,
    pub right_border_pixels: i64,
    pub sar_data_bytes: i64,
    pub data_groups: i64,
}

/// Map projection data record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapProjection {
    /// Free-text map projection description.
    pub description: String,
    /// Map projection designator; drives the projection-type dispatch.
    pub designator: String,
    pub lines: i64,
    pub pixels: i64,
    pub tlc_northing: f64,
    pub tlc_easting: f64,
    pub trc_northing: f64,
    pub trc_easting: f64,
    pub blc_northing: f64,
    pub blc_easting: f64,
    pub tlc_lat: f64,
    pub tlc_lon: f64,
    pub trc_lat: f64,
    pub trc_lon: f64,
    pub blc_lat: f64,
    pub blc_lon: f64,
    pub brc_lat: f64,
    pub brc_lon: f64,
    /// Lambert standard parallels.
    pub std_parallel1: f64,
    pub std_parallel2: f64,
    /// Polar stereographic reference point.
    pub ups_lat: f64,
    pub ups_lon: f64,
    pub utm_zone: String,
    pub utm_false_easting: f64,
    pub utm_false_northing: f64,
    pub utm_lat0: f64,
    pub utm_lon0: f64,
    pub utm_scale_factor: f64,
    /// Nominal inter-line / inter-pixel distance (ALOS, meters).
    pub nominal_line_spacing: f64,
    pub nominal_pixel_spacing: f64,
    /// ALOS map-coordinate-to-image polynomial coefficients.
    pub a: [f64; 8],
    pub b: [f64; 8],
}

/// ALOS optical map projection record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlosMapProjection {
    pub x_pixel_size: f64,
    pub y_pixel_size: f64,
    pub x_pixel_size2: f64,
    pub y_pixel_size2: f64,
    pub ref_major_axis: f64,
    pub ref_minor_axis: f64,
    /// 0 = northern hemisphere.
    pub hemisphere: i32,
    pub utm_zone: i32,
    pub ref_ellipsoid: String,
    pub geod_coord_name: String,
    pub lat_map_origin: f64,
    pub lon_map_origin: f64,
    pub coeff_lambda: [f64; 10],
    pub coeff_phi: [f64; 10],
    pub coeff_j: [f64; 10],
    pub coeff_i: [f64; 10],
}

/// Platform position data record: raw state vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionData {
    pub year: i32,
    pub julian_day: i32,
    /// Seconds of day of the first sample.
    pub gmt_second: f64,
    /// Sample spacing, seconds.
    pub interval: f64,
    pub positions: Vec<[f64; 3]>,
    pub velocities: Vec<[f64; 3]>,
}

/// Processing parameter record (RADARSAT-era facilities).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingParameters {
    pub beam_type: String,
}

/// ASF facility data record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AsfFacility {
    /// "GROUND..." or "SLANT..." image geometry flag.
    pub ground_slant_flag: String,
    /// 'Y' when deskewed.
    pub deskew_flag: String,
    pub lines: i64,
    pub pixels: i64,
    pub actual_lines: i64,
    pub actual_pixels: i64,
    pub bit_error_rate: f64,
    /// Earth radius at scene center, km.
    pub earth_radius_center: f64,
    /// Spacecraft altitude, km.
    pub spacecraft_altitude: f64,
    /// Swath (ground track) velocity, m/s.
    pub swath_velocity: f64,
    /// Slant range to the first pixel, km.
    pub slant_range_first_pixel: f64,
    pub near_start_lat: f64,
    pub near_start_lon: f64,
    pub far_start_lat: f64,
    pub far_start_lon: f64,
    pub near_end_lat: f64,
    pub near_end_lon: f64,
    pub far_end_lat: f64,
    pub far_end_lon: f64,
}

/// ESA facility data record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EsaFacility {
    pub bit_error_rate: f64,
}

/// Radiometric compensation data record (RADARSAT ScanSAR).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadiometricCompensation {
    pub record_count: i32,
    pub beam_types: [String; 4],
    pub look_angles: [f64; 4],
}

/// Polarization flags from the first ALOS signal-line header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinePolarization {
    /// 0 = H, 1 = V.
    pub transmit: i32,
    /// 0 = H, 1 = V.
    pub receive: i32,
    /// 1 = single, 2 = dual, 4 = quad.
    pub channels: i32,
    /// Linear chirp coefficient, kHz units as stored.
    pub chirp_linear: f64,
}

/// Binary record reader collaborator.
///
/// Leader records take the leader file path; the image file descriptor and
/// the per-line probes take a data file path. Implementations decode
/// fields (including endianness) once at this boundary.
pub trait RecordReader {
    fn dataset_summary(&self, leader: &Path) -> CeosResult<Option<DatasetSummary>>;
    fn scene_header(&self, leader: &Path) -> CeosResult<Option<SceneHeader>>;
    fn file_descriptor(&self, leader: &Path) -> CeosResult<Option<FileDescriptor>>;
    fn image_file_descriptor(&self, data: &Path) -> CeosResult<Option<ImageFileDescriptor>>;
    fn map_projection(&self, leader: &Path) -> CeosResult<Option<MapProjection>>;
    fn alos_map_projection(&self, leader: &Path) -> CeosResult<Option<AlosMapProjection>>;
    fn position_data(&self, leader: &Path) -> CeosResult<Option<PositionData>>;
    fn processing_parameters(&self, leader: &Path) -> CeosResult<Option<ProcessingParameters>>;
    fn asf_facility(&self, leader: &Path) -> CeosResult<Option<AsfFacility>>;
    fn esa_facility(&self, leader: &Path) -> CeosResult<Option<EsaFacility>>;
    fn radiometric_compensation(&self, leader: &Path)
        -> CeosResult<Option<RadiometricCompensation>>;

    /// Acquisition time of the first image line, seconds of day, read from
    /// the data file's line headers.
    fn first_line_time(&self, data: &Path) -> CeosResult<Option<f64>>;

    /// Transmit/receive polarization and chirp slope from the first ALOS
    /// signal-line header.
    fn alos_line_polarization(&self, data: &Path) -> CeosResult<Option<LinePolarization>>;
}
