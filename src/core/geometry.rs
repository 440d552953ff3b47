//! Orbital and geodetic helpers shared by the normalizers.
//!
//! Vector math operates directly on `[f64; 3]` in the earth-fixed frame.
//! The along-track/cross-track rotation angles follow the JPL convention:
//! a latitude/longitude-style coordinate system centered under the
//! satellite at the start of imaging, which requires the earth's spin to be
//! removed from the state vector first.

use crate::types::{
    is_unset, CeosResult, ProjectionBlock, StateVector, StateVectorSet, UnifiedMetadata,
};

/// Earth rotation rate, rad/s.
pub const EARTH_ROTATION_RATE: f64 = 7.292_115_855_3e-5;

/// Reference magnitudes for unit normalization: facilities disagree on the
/// units of these fields, so values are rescaled by decades toward the
/// expected magnitude.
pub const EXPECTED_WAVELENGTH: f64 = 0.1; // m
pub const EXPECTED_PRF: f64 = 2000.0; // Hz
pub const EXPECTED_RSR_MHZ: f64 = 20.0; // MHz
pub const EXPECTED_FS_HZ: f64 = 2.0e7; // Hz
pub const EXPECTED_RANGE_GATE: f64 = 5.0e-3; // s

pub fn vec_dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn vec_cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn vec_magnitude(a: [f64; 3]) -> f64 {
    vec_dot(a, a).sqrt()
}

pub fn vec_normalize(a: [f64; 3]) -> [f64; 3] {
    let m = vec_magnitude(a);
    if m == 0.0 {
        a
    } else {
        [a[0] / m, a[1] / m, a[2] / m]
    }
}

/// Decade factor that brings `value` to the order of magnitude of
/// `expected`. Returns 1.0 for non-positive values.
pub fn decade_scale(value: f64, expected: f64) -> f64 {
    if value <= 0.0 || expected <= 0.0 {
        return 1.0;
    }
    10f64.powi((expected / value).log10().round() as i32)
}

/// Geocentric earth radius (meters) at a geodetic latitude in degrees, for
/// the given ellipsoid semi-axes in meters.
pub fn earth_radius(lat_deg: f64, re_major: f64, re_minor: f64) -> f64 {
    let lat = lat_deg.to_radians();
    let (s, c) = lat.sin_cos();
    (re_major * re_minor) / (re_minor * re_minor * c * c + re_major * re_major * s * s).sqrt()
}

/// Remove the earth's spin from an earth-fixed state vector, converting it
/// to an inertial frame at epoch offset zero.
pub fn fixed_to_inertial(st: &mut StateVector) {
    let omega = [0.0, 0.0, EARTH_ROTATION_RATE];
    let spin = vec_cross(omega, st.position);
    st.velocity[0] += spin[0];
    st.velocity[1] += spin[1];
    st.velocity[2] += spin[2];
}

/// Along-track/cross-track rotation angles (degrees) for a state vector at
/// the start of imaging. The vector must already be in the inertial frame.
pub fn atct_angles(st: &StateVector) -> (f64, f64, f64) {
    let up = [0.0, 0.0, 1.0];
    let z_orbit = vec_normalize(vec_cross(st.position, st.velocity));
    let y_axis = vec_normalize(vec_cross(z_orbit, up));
    let a = vec_normalize(vec_cross(y_axis, z_orbit));

    let mut alpha1 = a[1].atan2(a[0]).to_degrees();
    let mut alpha2 = -a[2].asin().to_degrees();
    if z_orbit[2] < 0.0 {
        alpha1 += 180.0;
        alpha2 = -(180.0 - alpha2.abs());
    }

    let nd = vec_normalize(vec_cross(a, st.position));
    let cos_alpha3 = vec_dot(a, st.position) / vec_magnitude(st.position);
    let mut alpha3 = cos_alpha3.clamp(-1.0, 1.0).acos().to_degrees();
    if vec_dot(nd, z_orbit) < 0.0 {
        alpha3 = -alpha3;
    }
    (alpha1, alpha2, alpha3)
}

/// Nominal orbit inclination in degrees for a sensor name.
fn orbit_inclination(sensor: &str) -> f64 {
    if sensor.starts_with("ERS") {
        98.52
    } else if sensor.starts_with("JERS") {
        97.67
    } else if sensor.starts_with("RSAT") {
        98.58
    } else if sensor.starts_with("ALOS") {
        98.16
    } else {
        98.52
    }
}

/// Frame number on the 900-frames-per-orbit grid for a scene center
/// latitude (degrees) and orbit direction flag ('A'/'D').
pub fn frame_from_latitude(sensor: &str, latitude: f64, orbit_direction: char) -> i32 {
    let incl = orbit_inclination(sensor).to_radians();
    let ratio = (latitude.to_radians().sin() / incl.sin()).clamp(-1.0, 1.0);
    let mut asc_node = ratio.asin().to_degrees();
    if orbit_direction == 'D' {
        asc_node = 180.0 - asc_node;
    }
    if asc_node < 0.0 {
        asc_node += 360.0;
    }
    (asc_node / 0.4).round() as i32
}

/// Number of vectors and their spacing for state-vector densification over
/// an imaging span of `span` seconds. `None` means the span is too long to
/// densify (the archived vectors are used as-is).
pub fn propagation_window(span: f64) -> Option<(usize, f64)> {
    if span >= 360.0 {
        return None;
    }
    let mut interval = span;
    let mut count = 3usize;
    while interval.abs() > 15.0 {
        interval /= 2.0;
        count = count * 2 - 1;
    }
    Some((count, interval))
}

/// Geometry collaborator: orbit propagation numerics and map projection
/// transforms live outside this crate. [`LinearGeo`] is a self-contained
/// approximation good enough for testing and for products where precise
/// geolocation is done downstream.
pub trait GeoCollaborator {
    /// Replace a state vector set with `count` vectors spaced `interval`
    /// seconds apart, starting at `start_time` (seconds relative to the
    /// set's epoch).
    fn propagate_state_vectors(
        &self,
        set: &StateVectorSet,
        start_time: f64,
        count: usize,
        interval: f64,
    ) -> CeosResult<StateVectorSet>;

    /// Geodetic latitude/longitude (degrees) of an image pixel.
    fn image_to_latlon(
        &self,
        meta: &UnifiedMetadata,
        line: f64,
        sample: f64,
    ) -> CeosResult<(f64, f64)>;

    /// Forward-project a latitude/longitude into the block's map
    /// coordinates.
    fn latlon_to_proj(&self, proj: &ProjectionBlock, lat: f64, lon: f64) -> CeosResult<(f64, f64)>;
}

/// Reference geometry collaborator.
///
/// State vectors are interpolated/extrapolated linearly between archived
/// samples; pixel geolocation interpolates the corner coordinates
/// bilinearly when a location block exists and falls back to the scene
/// center otherwise; forward projection is plate carree about the block
/// origin.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearGeo;

impl LinearGeo {
    fn sample_at(set: &StateVectorSet, time: f64) -> StateVector {
        let vecs = &set.vectors;
        if vecs.len() == 1 {
            let v = vecs[0];
            let dt = time - v.time;
            return StateVector {
                time,
                position: [
                    v.position[0] + v.velocity[0] * dt,
                    v.position[1] + v.velocity[1] * dt,
                    v.position[2] + v.velocity[2] * dt,
                ],
                velocity: v.velocity,
            };
        }
        // bracketing pair, or the outermost pair for extrapolation
        let mut i = 0;
        while i + 2 < vecs.len() && vecs[i + 1].time <= time {
            i += 1;
        }
        let (a, b) = (vecs[i], vecs[i + 1]);
        let f = if b.time != a.time {
            (time - a.time) / (b.time - a.time)
        } else {
            0.0
        };
        let lerp3 = |p: [f64; 3], q: [f64; 3]| {
            [
                p[0] + (q[0] - p[0]) * f,
                p[1] + (q[1] - p[1]) * f,
                p[2] + (q[2] - p[2]) * f,
            ]
        };
        StateVector {
            time,
            position: lerp3(a.position, b.position),
            velocity: lerp3(a.velocity, b.velocity),
        }
    }
}

impl GeoCollaborator for LinearGeo {
    fn propagate_state_vectors(
        &self,
        set: &StateVectorSet,
        start_time: f64,
        count: usize,
        interval: f64,
    ) -> CeosResult<StateVectorSet> {
        let mut out = StateVectorSet {
            year: set.year,
            julian_day: set.julian_day,
            second: set.second,
            vectors: Vec::with_capacity(count),
        };
        for i in 0..count {
            let t = start_time + i as f64 * interval;
            out.vectors.push(Self::sample_at(set, t));
        }
        Ok(out)
    }

    fn image_to_latlon(
        &self,
        meta: &UnifiedMetadata,
        line: f64,
        sample: f64,
    ) -> CeosResult<(f64, f64)> {
        if let Some(loc) = &meta.location {
            let nl = (meta.general.line_count.max(2) - 1) as f64;
            let ns = (meta.general.sample_count.max(2) - 1) as f64;
            let fl = (line / nl).clamp(0.0, 1.0);
            let fs = (sample / ns).clamp(0.0, 1.0);
            let blend = |sn: f64, sf: f64, en: f64, ef: f64| {
                let start = sn + (sf - sn) * fs;
                let end = en + (ef - en) * fs;
                start + (end - start) * fl
            };
            let lat = blend(
                loc.lat_start_near_range,
                loc.lat_start_far_range,
                loc.lat_end_near_range,
                loc.lat_end_far_range,
            );
            let lon = blend(
                loc.lon_start_near_range,
                loc.lon_start_far_range,
                loc.lon_end_near_range,
                loc.lon_end_far_range,
            );
            return Ok((lat, lon));
        }
        Ok((
            meta.general.center_latitude,
            meta.general.center_longitude,
        ))
    }

    fn latlon_to_proj(&self, proj: &ProjectionBlock, lat: f64, lon: f64) -> CeosResult<(f64, f64)> {
        // plate carree about the ellipsoid equator
        let re = if is_unset(proj.re_major) {
            6_378_137.0
        } else {
            proj.re_major
        };
        let x = lon.to_radians() * re * lat.to_radians().cos();
        let y = lat.to_radians() * re;
        Ok((x, y))
    }
}
