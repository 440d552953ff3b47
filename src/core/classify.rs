//! Product classification: satellite, sensor, facility, processor, product
//! level and processor version, decoded from leader-file prefixes.
//!
//! Every lookup here is a prefix table. Unknown strings degrade to an
//! `Unknown` variant with a warning; classification itself only fails when
//! neither a dataset summary nor a scene header record exists, because then
//! there is nothing to normalize at all.

use crate::io::records::{DatasetSummary, RecordReader, SceneHeader};
use crate::types::{CeosError, CeosResult};
use log::warn;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Satellite {
    Ers,
    Jers,
    Radarsat,
    Alos,
    SirC,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Sar,
    Palsar,
    Avnir,
    Prism,
    Unknown,
}

impl Sensor {
    pub fn is_sar(&self) -> bool {
        matches!(self, Sensor::Sar | Sensor::Palsar)
    }

    pub fn is_optical(&self) -> bool {
        matches!(self, Sensor::Avnir | Sensor::Prism)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facility {
    Asf,
    Esa,
    Cdpf,
    Eoc,
    Rsi,
    Jpl,
    Vexcel,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processor {
    Asp,
    Sps,
    Prec,
    Ardop,
    Pp,
    Sp2,
    Amm,
    Dps,
    Msar,
    Focus,
    Lzp,
    Sp3,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Product {
    Raw,
    Ccsd,
    Slc,
    LowRes,
    HiRes,
    ScanSar,
    ScanSarNarrow,
    Pri,
    Sgf,
    Sgi,
    Ramp,
    Unknown,
}

/// Classification of a CEOS product, plus the primary metadata record it
/// was classified from.
#[derive(Debug, Clone)]
pub struct CeosDescription {
    pub satellite: Satellite,
    pub sensor: Sensor,
    pub facility: Facility,
    pub processor: Processor,
    pub product: Product,
    /// Processor version, first numeric run of the version field.
    pub version: f64,
    pub dssr: Option<DatasetSummary>,
    pub shr: Option<SceneHeader>,
}

fn prefix_lookup<T: Copy>(s: &str, table: &[(&str, T)]) -> Option<T> {
    table
        .iter()
        .find(|(prefix, _)| s.starts_with(prefix))
        .map(|(_, value)| *value)
}

const SATELLITES: &[(&str, Satellite)] = &[
    ("E", Satellite::Ers),
    ("J", Satellite::Jers),
    ("R", Satellite::Radarsat),
    ("A", Satellite::Alos),
    ("S", Satellite::SirC),
];

const ASF_PROCESSORS: &[(&str, Processor)] = &[
    ("ASP", Processor::Asp),
    ("SPS", Processor::Sps),
    ("PRE", Processor::Prec),
    ("ARDOP", Processor::Ardop),
    ("PP", Processor::Pp),
    ("SP2", Processor::Sp2),
    ("AMM", Processor::Amm),
    ("DPS", Processor::Dps),
    ("MSSAR", Processor::Msar),
    ("FOCUS", Processor::Focus),
];

const ASF_PRODUCTS: &[(&str, Product)] = &[
    ("LOW", Product::LowRes),
    ("FUL", Product::HiRes),
    ("SCANSAR", Product::ScanSar),
    ("CCSD", Product::Ccsd),
    ("COMPLEX", Product::Slc),
    ("RAMP", Product::Ramp),
    // products from other facilities routed through ASF archives
    ("SPECIAL PRODUCT(SINGL-LOOK COMP)", Product::Slc),
    ("SLANT RANGE COMPLEX", Product::Slc),
    ("SAR PRECISION IMAGE", Product::Pri),
    ("SAR GEOREF FINE", Product::Sgf),
    ("STANDARD GEOCODED IMAGE", Product::Sgi),
];

const ESA_PRODUCTS: &[(&str, Product)] = &[
    ("SAR RAW SIGNAL", Product::Raw),
    ("SAR PRECISION IMAGE", Product::Pri),
];

const CDPF_PRODUCTS: &[(&str, Product)] = &[
    ("SPECIAL PRODUCT(SINGL-LOOK COMP)", Product::Slc),
    ("SCANSAR WIDE", Product::ScanSar),
    ("SAR GEOREF FINE", Product::Sgf),
];

const PAF_PRODUCTS: &[(&str, Product)] = &[("SAR RAW SIGNAL", Product::Raw)];

const RSI_PRODUCTS: &[(&str, Product)] = &[
    ("SCANSAR WIDE", Product::ScanSar),
    ("SAR GEOREF EXTRA FINE", Product::Sgf),
    ("SCANSAR NARROW", Product::ScanSarNarrow),
    ("SAR GEOREF FINE", Product::Sgf),
];

const JPL_PRODUCTS: &[(&str, Product)] = &[("REFORMATTED SIGNAL DATA", Product::Raw)];

/// Processor version: first digit onward of the version field, parsed as a
/// float. Defaults to 0.0 when the field carries no number.
fn parse_version(ver_id: &str) -> f64 {
    let Some(start) = ver_id.find(|c: char| c.is_ascii_digit()) else {
        return 0.0;
    };
    let tail = &ver_id[start..];
    let end = tail
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(tail.len());
    tail[..end].parse().unwrap_or(0.0)
}

fn classify_product(facility: Facility, table: &[(&str, Product)], prod_str: &str) -> Product {
    match prefix_lookup(prod_str, table) {
        Some(p) => p,
        None => {
            warn!(
                "Unknown {:?} product type '{}'",
                facility,
                prod_str.trim_end()
            );
            Product::Unknown
        }
    }
}

fn classify_sar(dssr: DatasetSummary) -> CeosDescription {
    let satellite = match prefix_lookup(&dssr.mission_id, SATELLITES) {
        Some(s) => s,
        None => {
            warn!("Unknown satellite '{}'", dssr.mission_id.trim_end());
            Satellite::Unknown
        }
    };
    let sensor = if satellite == Satellite::Alos {
        Sensor::Palsar
    } else {
        Sensor::Sar
    };
    let version = parse_version(&dssr.version_id);
    let proc_str = dssr.system_id.as_str();
    let prod_str = dssr.product_type.as_str();
    let fac_str = dssr.facility_id.as_str();

    let mut facility = Facility::Unknown;
    let mut processor = Processor::Unknown;
    let mut product = Product::Unknown;

    if fac_str.starts_with("ASF") {
        facility = Facility::Asf;
        if proc_str.starts_with("SKY") {
            // VEXCEL level-zero processor masquerading under an ASF id
            return CeosDescription {
                satellite,
                sensor,
                facility: Facility::Vexcel,
                processor: Processor::Lzp,
                product: Product::Ccsd,
                version,
                dssr: Some(dssr),
                shr: None,
            };
        }
        processor = match prefix_lookup(proc_str, ASF_PROCESSORS) {
            Some(p) => p,
            None if proc_str.starts_with("PC") => {
                if prod_str.starts_with("SCANSAR") {
                    Processor::Sp3
                } else if prod_str.starts_with("FUL") {
                    Processor::Prec
                } else {
                    Processor::Unknown
                }
            }
            None => {
                warn!("Unknown ASF processor '{}'", proc_str.trim_end());
                Processor::Unknown
            }
        };
        product = classify_product(facility, ASF_PRODUCTS, prod_str);
    } else if fac_str.starts_with("ES") {
        facility = Facility::Esa;
        product = classify_product(facility, ESA_PRODUCTS, prod_str);
    } else if fac_str.starts_with("CDPF") {
        facility = Facility::Cdpf;
        product = classify_product(facility, CDPF_PRODUCTS, prod_str);
    } else if fac_str.starts_with("D-PAF") || fac_str.starts_with("I-PAF") {
        facility = Facility::Esa;
        product = classify_product(facility, PAF_PRODUCTS, prod_str);
    } else if fac_str.starts_with("EOC") {
        facility = Facility::Eoc;
        product = if dssr.level_code.starts_with("1.0") {
            Product::Raw
        } else if dssr.level_code.starts_with("1.1") {
            Product::Slc
        } else if prod_str.starts_with("STANDARD GEOCODED IMAGE") {
            Product::Sgi
        } else {
            warn!("Unknown EOC product type '{}'", prod_str.trim_end());
            Product::Unknown
        };
    } else if fac_str.starts_with("RSI") {
        facility = Facility::Rsi;
        product = classify_product(facility, RSI_PRODUCTS, prod_str);
    } else if fac_str.starts_with("JPL") {
        facility = Facility::Jpl;
        // anything other than reformatted signal data stays unclassified
        if let Some(p) = prefix_lookup(prod_str, JPL_PRODUCTS) {
            product = p;
        }
    } else {
        warn!("Unknown CEOS facility '{}'", fac_str.trim_end());
    }

    CeosDescription {
        satellite,
        sensor,
        facility,
        processor,
        product,
        version,
        dssr: Some(dssr),
        shr: None,
    }
}

fn classify_optical(shr: SceneHeader) -> CeosDescription {
    let satellite = if shr.mission_id.starts_with('A') {
        Satellite::Alos
    } else {
        warn!("Unknown satellite '{}'", shr.mission_id.trim_end());
        Satellite::Unknown
    };
    let sensor = if satellite == Satellite::Alos {
        if shr.sensor_id.starts_with("AVNIR") {
            Sensor::Avnir
        } else if shr.sensor_id.starts_with("PRISM") {
            Sensor::Prism
        } else {
            warn!("Unknown sensor '{}'", shr.sensor_id.trim_end());
            Sensor::Unknown
        }
    } else {
        Sensor::Unknown
    };
    CeosDescription {
        satellite,
        sensor,
        facility: Facility::Unknown,
        processor: Processor::Unknown,
        product: Product::Unknown,
        version: 0.0,
        dssr: None,
        shr: Some(shr),
    }
}

/// Classify a product from its leader file. SAR products carry a dataset
/// summary record; optical products carry a scene header instead.
pub fn classify(reader: &dyn RecordReader, leader: &Path) -> CeosResult<CeosDescription> {
    if let Some(dssr) = reader.dataset_summary(leader)? {
        return Ok(classify_sar(dssr));
    }
    if let Some(shr) = reader.scene_header(leader)? {
        return Ok(classify_optical(shr));
    }
    Err(CeosError::RequiredResourceMissing(format!(
        "leader file {} contains neither a dataset summary record nor a scene header record",
        leader.display()
    )))
}
