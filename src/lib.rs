//! ceosar: CEOS product pairing and metadata normalization
//!
//! This library locates the metadata/data file pairs of legacy CEOS
//! satellite products (ERS, JERS, RADARSAT, ALOS, SIR-C), classifies the
//! producing facility and processor from the leader records, and decodes
//! the records into a single normalized metadata structure. Facility
//! quirks accumulated over three decades of archives are reproduced
//! faithfully rather than cleaned up, because the files are what they are.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use crate::core::{
    classify, normalize_optical, normalize_sar, CeosDescription, Facility, GeoCollaborator,
    LinearGeo, Processor, Product, Satellite, Sensor,
};
pub use io::{find_pair, require_pair, CeosFileSet, RecordReader};
pub use types::{
    CeosError, CeosResult, DataType, General, ImageType, LocationBlock, OpticalBlock,
    OrbitDirection, ProjectionBlock, ProjectionParams, SarBlock, StateVector, StateVectorSet,
    TransformBlock, UnifiedMetadata, UNSET_VALUE,
};

use log::info;
use std::path::Path;

/// Entry point tying the collaborators together.
///
/// The record reader does the binary decoding; the geometry collaborator
/// (optional) supplies state vector propagation and geolocation for the
/// products whose records don't carry corner coordinates themselves.
pub struct CeosNormalizer<'a> {
    reader: &'a dyn RecordReader,
    geo: Option<&'a dyn GeoCollaborator>,
}

impl<'a> CeosNormalizer<'a> {
    pub fn new(reader: &'a dyn RecordReader) -> Self {
        CeosNormalizer { reader, geo: None }
    }

    pub fn with_geometry(reader: &'a dyn RecordReader, geo: &'a dyn GeoCollaborator) -> Self {
        CeosNormalizer {
            reader,
            geo: Some(geo),
        }
    }

    /// Locate the product's file pair from a base name, classify it, and
    /// decode it into normalized metadata.
    pub fn normalize(&self, base: &Path) -> CeosResult<UnifiedMetadata> {
        let files = io::require_pair(base)?;
        let ceos = crate::core::classify(self.reader, &files.leader)?;
        info!(
            "{}: {:?}/{:?} product from {:?}",
            base.display(),
            ceos.satellite,
            ceos.product,
            ceos.facility
        );
        if ceos.sensor.is_optical() {
            crate::core::normalize_optical(self.reader, self.geo, &files, &ceos)
        } else {
            crate::core::normalize_sar(self.reader, self.geo, base, &files, &ceos)
        }
    }
}
