use serde::{Deserialize, Serialize};

/// Sentinel for numeric fields that were never populated.
///
/// Zero is a legal measured value for almost every field in this model, so
/// "unset" needs its own reserved value. Compare with [`is_unset`] rather
/// than `==` at call sites.
pub const UNSET_VALUE: f64 = -999_999_999.0;

/// Frame numbers use -1 as "not populated".
pub const UNSET_FRAME: i32 = -1;

/// Speed of light in m/s, as used by the legacy CEOS decoders.
pub const SPEED_OF_LIGHT: f64 = 2.997_924_562e8;

/// True if `value` carries the unset sentinel.
pub fn is_unset(value: f64) -> bool {
    value == UNSET_VALUE
}

/// Pixel sample representation of the image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Byte,
    Integer16,
    Integer32,
    ComplexByte,
    ComplexInteger16,
    ComplexReal32,
}

impl Default for DataType {
    fn default() -> Self {
        DataType::Byte
    }
}

/// SAR image geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageType {
    /// Slant range ('S')
    Slant,
    /// Ground range ('G')
    Ground,
    /// Map projected ('P')
    Projected,
    /// Georeferenced, corners only ('R')
    Georeferenced,
    Unknown,
}

impl ImageType {
    pub fn as_char(&self) -> char {
        match self {
            ImageType::Slant => 'S',
            ImageType::Ground => 'G',
            ImageType::Projected => 'P',
            ImageType::Georeferenced => 'R',
            ImageType::Unknown => '?',
        }
    }
}

impl Default for ImageType {
    fn default() -> Self {
        ImageType::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrbitDirection {
    Ascending,
    Descending,
    Unknown,
}

impl OrbitDirection {
    pub fn as_char(&self) -> char {
        match self {
            OrbitDirection::Ascending => 'A',
            OrbitDirection::Descending => 'D',
            OrbitDirection::Unknown => '?',
        }
    }
}

impl Default for OrbitDirection {
    fn default() -> Self {
        OrbitDirection::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookDirection {
    Right,
    Left,
}

impl Default for LookDirection {
    fn default() -> Self {
        LookDirection::Right
    }
}

/// Reference spheroid named in the CEOS ellipsoid descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spheroid {
    Grs1980,
    Gem6,
    Wgs84,
    Unknown,
}

impl Default for Spheroid {
    fn default() -> Self {
        Spheroid::Unknown
    }
}

/// Geodetic datum. The CEOS records never state one directly; these are
/// inferred from the spheroid (see the projection initializer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Datum {
    Nad83,
    Wgs84,
    Itrf97,
    Unknown,
}

impl Default for Datum {
    fn default() -> Self {
        Datum::Unknown
    }
}

/// Projection-specific parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectionParams {
    Utm {
        zone: i32,
        false_easting: f64,
        false_northing: f64,
        lat0: f64,
        lon0: f64,
        scale_factor: f64,
    },
    PolarStereo {
        slat: f64,
        slon: f64,
        is_north_pole: bool,
        false_easting: f64,
        false_northing: f64,
    },
    LambertConformalConic {
        plat1: f64,
        plat2: f64,
        lat0: f64,
        lon0: f64,
        false_easting: f64,
        false_northing: f64,
        scale_factor: f64,
    },
    LambertAzimuthal {
        center_lat: f64,
        center_lon: f64,
        false_easting: f64,
        false_northing: f64,
    },
    Albers {
        std_parallel1: f64,
        std_parallel2: f64,
        center_meridian: f64,
        orig_latitude: f64,
        false_easting: f64,
        false_northing: f64,
    },
    /// ScanSAR along-track/cross-track frame centered under the satellite.
    AlongTrackCrossTrack {
        rlocal: f64,
        alpha1: f64,
        alpha2: f64,
        alpha3: f64,
    },
    /// Projection block present but no usable parameter set (slant or
    /// ground range images whose facility wrote a projection record anyway).
    None,
}

impl ProjectionParams {
    pub fn kind(&self) -> &'static str {
        match self {
            ProjectionParams::Utm { .. } => "UTM",
            ProjectionParams::PolarStereo { .. } => "POLAR_STEREOGRAPHIC",
            ProjectionParams::LambertConformalConic { .. } => "LAMBERT_CONFORMAL_CONIC",
            ProjectionParams::LambertAzimuthal { .. } => "LAMBERT_AZIMUTHAL",
            ProjectionParams::Albers { .. } => "ALBERS",
            ProjectionParams::AlongTrackCrossTrack { .. } => "SCANSAR",
            ProjectionParams::None => "UNKNOWN",
        }
    }
}

impl Default for ProjectionParams {
    fn default() -> Self {
        ProjectionParams::None
    }
}

/// Sensor-independent general metadata. Always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct General {
    pub sensor: String,
    pub sensor_name: String,
    pub mode: String,
    pub processor: String,
    pub data_type: DataType,
    pub acquisition_date: String,
    pub orbit: i32,
    pub orbit_direction: OrbitDirection,
    pub frame: i32,
    pub band_count: usize,
    pub bands: String,
    pub line_count: i64,
    pub sample_count: i64,
    pub start_line: i64,
    pub start_sample: i64,
    pub x_pixel_size: f64,
    pub y_pixel_size: f64,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub re_major: f64,
    pub re_minor: f64,
    pub bit_error_rate: f64,
    pub no_data: f64,
}

impl Default for General {
    fn default() -> Self {
        General {
            sensor: String::new(),
            sensor_name: String::new(),
            mode: String::new(),
            processor: String::new(),
            data_type: DataType::default(),
            acquisition_date: String::new(),
            orbit: 0,
            orbit_direction: OrbitDirection::default(),
            frame: UNSET_FRAME,
            band_count: 1,
            bands: String::new(),
            line_count: 0,
            sample_count: 0,
            start_line: 0,
            start_sample: 0,
            x_pixel_size: UNSET_VALUE,
            y_pixel_size: UNSET_VALUE,
            center_latitude: UNSET_VALUE,
            center_longitude: UNSET_VALUE,
            re_major: UNSET_VALUE,
            re_minor: UNSET_VALUE,
            bit_error_rate: 0.0,
            no_data: UNSET_VALUE,
        }
    }
}

/// SAR-specific metadata. Present iff the product is a SAR product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarBlock {
    pub polarization: String,
    pub image_type: ImageType,
    pub look_direction: LookDirection,
    pub look_count: i32,
    pub deskewed: bool,
    pub original_line_count: i64,
    pub original_sample_count: i64,
    pub line_increment: f64,
    pub sample_increment: f64,
    pub range_time_per_pixel: f64,
    pub azimuth_time_per_pixel: f64,
    pub slant_shift: f64,
    pub time_shift: f64,
    pub slant_range_first_pixel: f64,
    pub wavelength: f64,
    pub prf: f64,
    pub earth_radius: f64,
    pub satellite_height: f64,
    pub range_doppler_coefficients: [f64; 3],
    pub azimuth_doppler_coefficients: [f64; 3],
    pub azimuth_processing_bandwidth: f64,
    pub chirp_rate: f64,
    pub pulse_duration: f64,
    pub range_sampling_rate: f64,
    pub satellite_binary_time: String,
    pub satellite_clock_time: String,
}

impl Default for SarBlock {
    fn default() -> Self {
        SarBlock {
            polarization: String::new(),
            image_type: ImageType::default(),
            look_direction: LookDirection::default(),
            look_count: 1,
            deskewed: false,
            original_line_count: 0,
            original_sample_count: 0,
            line_increment: 1.0,
            sample_increment: 1.0,
            range_time_per_pixel: UNSET_VALUE,
            azimuth_time_per_pixel: UNSET_VALUE,
            slant_shift: UNSET_VALUE,
            time_shift: UNSET_VALUE,
            slant_range_first_pixel: UNSET_VALUE,
            wavelength: UNSET_VALUE,
            prf: UNSET_VALUE,
            earth_radius: UNSET_VALUE,
            satellite_height: UNSET_VALUE,
            range_doppler_coefficients: [UNSET_VALUE; 3],
            azimuth_doppler_coefficients: [UNSET_VALUE; 3],
            azimuth_processing_bandwidth: UNSET_VALUE,
            chirp_rate: UNSET_VALUE,
            pulse_duration: UNSET_VALUE,
            range_sampling_rate: UNSET_VALUE,
            satellite_binary_time: String::new(),
            satellite_clock_time: String::new(),
        }
    }
}

/// Optical (AVNIR/PRISM) metadata. Mutually exclusive with [`SarBlock`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticalBlock {
    pub pointing_direction: String,
    pub off_nadir_angle: f64,
    pub correction_level: String,
    pub sun_azimuth_angle: f64,
    pub sun_elevation_angle: f64,
}

impl Default for OpticalBlock {
    fn default() -> Self {
        OpticalBlock {
            pointing_direction: String::new(),
            off_nadir_angle: UNSET_VALUE,
            correction_level: String::new(),
            sun_azimuth_angle: UNSET_VALUE,
            sun_elevation_angle: UNSET_VALUE,
        }
    }
}

/// Map projection block. Present iff the image is projected or
/// georeferenced (plus the slant/ground-range facilities that write a
/// projection record anyway).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionBlock {
    pub param: ProjectionParams,
    pub start_x: f64,
    pub start_y: f64,
    pub per_x: f64,
    pub per_y: f64,
    pub units: String,
    pub hemisphere: char,
    pub spheroid: Spheroid,
    pub datum: Datum,
    pub re_major: f64,
    pub re_minor: f64,
    pub height: f64,
}

impl Default for ProjectionBlock {
    fn default() -> Self {
        ProjectionBlock {
            param: ProjectionParams::None,
            start_x: UNSET_VALUE,
            start_y: UNSET_VALUE,
            per_x: UNSET_VALUE,
            per_y: UNSET_VALUE,
            units: "meters".to_string(),
            hemisphere: 'N',
            spheroid: Spheroid::default(),
            datum: Datum::default(),
            re_major: UNSET_VALUE,
            re_minor: UNSET_VALUE,
            height: 0.0,
        }
    }
}

/// One satellite position/velocity sample, earth-fixed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    /// Seconds relative to the set's reference epoch.
    pub time: f64,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
}

/// Ordered state vector samples with their reference epoch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateVectorSet {
    pub year: i32,
    pub julian_day: i32,
    pub second: f64,
    pub vectors: Vec<StateVector>,
}

/// Corner coordinates: near/far range at the start/end of the image,
/// degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationBlock {
    pub lat_start_near_range: f64,
    pub lon_start_near_range: f64,
    pub lat_start_far_range: f64,
    pub lon_start_far_range: f64,
    pub lat_end_near_range: f64,
    pub lon_end_near_range: f64,
    pub lat_end_far_range: f64,
    pub lon_end_far_range: f64,
}

impl Default for LocationBlock {
    fn default() -> Self {
        LocationBlock {
            lat_start_near_range: UNSET_VALUE,
            lon_start_near_range: UNSET_VALUE,
            lat_start_far_range: UNSET_VALUE,
            lon_start_far_range: UNSET_VALUE,
            lat_end_near_range: UNSET_VALUE,
            lon_end_near_range: UNSET_VALUE,
            lat_end_far_range: UNSET_VALUE,
            lon_end_far_range: UNSET_VALUE,
        }
    }
}

/// Polynomial coefficients mapping map coordinates to line/sample and back
/// (ALOS georeferenced products only).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformBlock {
    pub parameter_count: usize,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub l: Vec<f64>,
    pub s: Vec<f64>,
}

/// The normalized, sensor-agnostic metadata record.
///
/// `general` is always populated; every other section is present only when
/// it applies to the product. `sar` and `optical` are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnifiedMetadata {
    pub general: General,
    pub sar: Option<SarBlock>,
    pub optical: Option<OpticalBlock>,
    pub projection: Option<ProjectionBlock>,
    pub state_vectors: Option<StateVectorSet>,
    pub location: Option<LocationBlock>,
    pub transform: Option<TransformBlock>,
}

/// Error types for CEOS ingest.
#[derive(Debug, thiserror::Error)]
pub enum CeosError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid record format: {0}")]
    InvalidFormat(String),

    /// A required file pair or required record could not be located. The
    /// message lists everything that was tried.
    #[error("{0}")]
    RequiredResourceMissing(String),

    /// The map projection designator matched no known projection; downstream
    /// geometry would be meaningless.
    #[error("cannot match projection '{0}' in map projection data record")]
    UnmappableProjection(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Geometry error: {0}")]
    Geometry(String),
}

/// Result type for CEOS operations.
pub type CeosResult<T> = Result<T, CeosError>;
