//! Map projection block initialization.
//!
//! CEOS facilities abuse the map projection record freely: FOCUS and I-PAF
//! write one for slant range imagery, ESA for ground range, and the
//! geocoded flavors disagree on units and on which fields hold the origin.
//! The hacks preserved here (the Lambert origin offsets, the PS-SMM/I
//! reference longitude fix) are load-bearing; downstream consumers expect
//! these exact values.

use crate::core::geometry::{atct_angles, earth_radius, fixed_to_inertial, GeoCollaborator};
use crate::io::records::{AlosMapProjection, AsfFacility, DatasetSummary, MapProjection, SceneHeader};
use crate::types::{
    CeosError, CeosResult, Datum, ImageType, ProjectionBlock, ProjectionParams, Spheroid,
    UnifiedMetadata, UNSET_VALUE,
};
use log::warn;

fn spheroid_from_descriptor(ellip_des: &str) -> Spheroid {
    if ellip_des.starts_with("GRS80") {
        Spheroid::Grs1980
    } else if ellip_des.starts_with("GEM06") {
        Spheroid::Gem6
    } else {
        Spheroid::Unknown
    }
}

/// Datum guess for a spheroid. NAD83 normally pairs with GRS-1980 (a poor
/// guess for some stations); ALOS specifies ITRF-97 outright.
fn datum_for(spheroid: Spheroid, is_alos: bool) -> Datum {
    match spheroid {
        Spheroid::Grs1980 if is_alos => Datum::Itrf97,
        Spheroid::Grs1980 => Datum::Nad83,
        Spheroid::Gem6 => Datum::Wgs84,
        _ => Datum::Unknown,
    }
}

/// Initialize the projection block of a SAR product from its map
/// projection record. Slant and ground range products that carry a record
/// anyway get their image type corrected and no projection block.
pub fn init_sar_projection(
    meta: &mut UnifiedMetadata,
    dssr: &DatasetSummary,
    mpdr: &MapProjection,
) -> CeosResult<()> {
    let sar = meta
        .sar
        .as_mut()
        .ok_or_else(|| CeosError::Metadata("projection init before SAR block".to_string()))?;

    sar.image_type = ImageType::Projected;
    meta.general.sample_count = mpdr.pixels;

    let desc = mpdr.description.as_str();
    if desc.starts_with("SLANT RANGE") || desc.starts_with("Slant range") {
        // FOCUS and I-PAF populate the record for slant range imagery
        sar.image_type = ImageType::Slant;
        return Ok(());
    }
    if desc.starts_with("GROUND RANGE") || desc.starts_with("Ground range") {
        // ESA does the same for ground range
        sar.image_type = ImageType::Ground;
        return Ok(());
    }

    // the ScanSAR init runs first and already holds the along-track frame;
    // reuse its block so the rotation angles and corner grid survive
    let mut proj = match meta.projection.take() {
        Some(existing)
            if matches!(existing.param, ProjectionParams::AlongTrackCrossTrack { .. }) =>
        {
            existing
        }
        _ => ProjectionBlock::default(),
    };
    let designator = mpdr.designator.as_str();
    let is_alos = meta.general.sensor.starts_with("ALOS");

    proj.param = if designator.starts_with("GROUND RANGE") {
        match proj.param {
            atct @ ProjectionParams::AlongTrackCrossTrack { .. } => atct,
            // no ScanSAR init ran; the angles stay unset
            _ => ProjectionParams::AlongTrackCrossTrack {
                rlocal: UNSET_VALUE,
                alpha1: UNSET_VALUE,
                alpha2: UNSET_VALUE,
                alpha3: UNSET_VALUE,
            },
        }
    } else if designator.starts_with("LAMBERT") {
        warn!(
            "Images geocoded with the Lambert Conformal Conic projection \
             may not be accurately geocoded!"
        );
        // true lat0/lon0 are never stored in the CEOS; offsets reproduce
        // the archive's behavior
        ProjectionParams::LambertConformalConic {
            plat1: mpdr.std_parallel1,
            plat2: mpdr.std_parallel2,
            lat0: mpdr.blc_lat + 0.023,
            lon0: mpdr.blc_lon + 2.46,
            false_easting: UNSET_VALUE,
            false_northing: UNSET_VALUE,
            scale_factor: UNSET_VALUE,
        }
    } else if designator.starts_with("UPS") {
        ProjectionParams::PolarStereo {
            slat: 70.0,
            slon: -45.0,
            is_north_pole: true,
            false_easting: UNSET_VALUE,
            false_northing: UNSET_VALUE,
        }
    } else if designator.starts_with("PS-SMM/I") {
        let slat = mpdr.ups_lat;
        let mut slon = mpdr.ups_lon;
        if slat > 0.0 && slon == 0.0 {
            slon = -45.0; // reference longitude bug in the archive
        }
        ProjectionParams::PolarStereo {
            slat,
            slon,
            is_north_pole: slat > 0.0,
            false_easting: UNSET_VALUE,
            false_northing: UNSET_VALUE,
        }
    } else if designator.starts_with("UTM") {
        ProjectionParams::Utm {
            zone: mpdr.utm_zone.trim().parse().unwrap_or(0),
            false_easting: mpdr.utm_false_easting,
            false_northing: mpdr.utm_false_northing,
            lat0: mpdr.utm_lat0,
            lon0: mpdr.utm_lon0,
            scale_factor: mpdr.utm_scale_factor,
        }
    } else {
        return Err(CeosError::UnmappableProjection(
            designator.trim_end().to_string(),
        ));
    };

    if is_alos {
        // ALOS coordinates look like km, not m
        proj.start_y = mpdr.tlc_northing * 1000.0;
        proj.start_x = mpdr.tlc_easting * 1000.0;
        proj.per_y = -mpdr.nominal_line_spacing;
        proj.per_x = mpdr.nominal_pixel_spacing;
        proj.datum = Datum::Itrf97;
    } else if !matches!(proj.param, ProjectionParams::AlongTrackCrossTrack { .. }) {
        proj.start_y = mpdr.tlc_northing;
        proj.start_x = mpdr.tlc_easting;
        proj.per_y = (mpdr.blc_northing - mpdr.tlc_northing) / mpdr.lines as f64;
        proj.per_x = (mpdr.trc_easting - mpdr.tlc_easting) / mpdr.pixels as f64;
    }

    proj.units = "meters".to_string();
    proj.hemisphere = if dssr.center_latitude > 0.0 { 'N' } else { 'S' };
    proj.spheroid = spheroid_from_descriptor(&dssr.ellipsoid_name);
    let datum = datum_for(proj.spheroid, is_alos);
    if datum != Datum::Unknown {
        proj.datum = datum;
    } else if is_alos {
        proj.datum = Datum::Itrf97;
    }
    proj.re_major = dssr.ellipsoid_major * 1000.0;
    proj.re_minor = dssr.ellipsoid_minor * 1000.0;
    proj.height = 0.0;

    meta.projection = Some(proj);
    Ok(())
}

/// Initialize the projection block of a geocoded optical product from the
/// scene header and the optical map projection record. Character 7 of the
/// product id selects UTM or polar stereographic.
pub fn init_optical_projection(
    meta: &mut UnifiedMetadata,
    shr: &SceneHeader,
    ampr: &AlosMapProjection,
) {
    let mut proj = ProjectionBlock::default();
    let is_alos = meta.general.sensor.starts_with("ALOS");

    match shr.product_id.chars().nth(6) {
        Some('U') => {
            proj.param = ProjectionParams::Utm {
                zone: ampr.utm_zone,
                false_easting: 500_000.0,
                false_northing: if ampr.hemisphere == 0 { 0.0 } else { 10_000_000.0 },
                lat0: 0.0,
                lon0: (ampr.utm_zone - 1) as f64 * 6.0 - 177.0,
                scale_factor: 0.9996,
            };
        }
        Some('P') => {
            proj.param = ProjectionParams::PolarStereo {
                slat: ampr.lat_map_origin,
                slon: ampr.lon_map_origin,
                is_north_pole: ampr.lat_map_origin > 0.0,
                false_easting: UNSET_VALUE,
                false_northing: UNSET_VALUE,
            };
            proj.datum = if is_alos {
                Datum::Itrf97
            } else {
                match spheroid_from_descriptor(&ampr.ref_ellipsoid) {
                    Spheroid::Gem6 => Datum::Wgs84,
                    Spheroid::Grs1980 => Datum::Nad83,
                    _ => Datum::Wgs84,
                }
            };
        }
        _ => return,
    }

    proj.spheroid = spheroid_from_descriptor(&ampr.ref_ellipsoid);
    if proj.datum == Datum::Unknown {
        proj.datum = datum_for(proj.spheroid, is_alos);
    }
    proj.re_major = ampr.ref_major_axis;
    proj.re_minor = ampr.ref_minor_axis;
    proj.hemisphere = if ampr.hemisphere == 0 { 'N' } else { 'S' };
    meta.projection = Some(proj);
}

/// Initialize the along-track/cross-track projection of a ScanSAR product.
///
/// ASF ScanSAR carries a map projection record with the frame corners; RSI
/// ScanSAR does not and gets a pixel-size grid anchored at the image
/// origin. The rotation angles come from the state vector at the start of
/// imaging with the earth's spin removed.
pub fn init_scansar(
    meta: &mut UnifiedMetadata,
    dssr: &DatasetSummary,
    mpdr: Option<&MapProjection>,
    asf_facdr: Option<&AsfFacility>,
    geo: &dyn GeoCollaborator,
) -> CeosResult<()> {
    if let (Some(facdr), Some(sar)) = (asf_facdr, meta.sar.as_mut()) {
        sar.earth_radius = facdr.earth_radius_center * 1000.0;
        sar.satellite_height = sar.earth_radius + facdr.spacecraft_altitude * 1000.0;
    }

    let mut proj = ProjectionBlock::default();
    if let Some(mpdr) = mpdr {
        proj.start_y = mpdr.tlc_easting;
        proj.start_x = mpdr.tlc_northing;
        proj.per_y = (mpdr.blc_easting - mpdr.tlc_easting) / (mpdr.lines - 1) as f64;
        proj.per_x = (mpdr.trc_northing - mpdr.tlc_northing) / (mpdr.pixels - 1) as f64;
    } else {
        proj.start_x = 0.0;
        proj.start_y = 0.0;
        proj.per_x = meta.general.x_pixel_size;
        proj.per_y = -meta.general.y_pixel_size;
    }

    let (center_lat, _) = geo.image_to_latlon(meta, meta.general.line_count as f64 / 2.0, 0.0)?;
    let rlocal = earth_radius(center_lat, meta.general.re_major, meta.general.re_minor);

    let set = meta
        .state_vectors
        .as_ref()
        .ok_or_else(|| CeosError::Geometry("ScanSAR init requires state vectors".to_string()))?;
    let start = geo.propagate_state_vectors(set, 0.0, 1, 0.0)?;
    let mut st = start
        .vectors
        .first()
        .copied()
        .ok_or_else(|| CeosError::Geometry("empty state vector set".to_string()))?;
    fixed_to_inertial(&mut st);
    let (alpha1, alpha2, alpha3) = atct_angles(&st);
    proj.param = ProjectionParams::AlongTrackCrossTrack {
        rlocal,
        alpha1,
        alpha2,
        alpha3,
    };

    proj.units = "meters".to_string();
    proj.hemisphere = if dssr.center_latitude > 0.0 { 'N' } else { 'S' };
    proj.re_major = dssr.ellipsoid_major * 1000.0;
    proj.re_minor = dssr.ellipsoid_minor * 1000.0;
    proj.height = 0.0;
    meta.projection = Some(proj);
    Ok(())
}
