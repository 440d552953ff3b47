//! Product classification, geometry, and the SAR/optical normalizers

pub mod classify;
pub mod geometry;
pub mod optical;
pub mod proj;
pub mod sar;

// Re-export main types
pub use classify::{classify, CeosDescription, Facility, Processor, Product, Satellite, Sensor};
pub use geometry::{GeoCollaborator, LinearGeo};
pub use optical::normalize_optical;
pub use proj::{init_optical_projection, init_sar_projection, init_scansar};
pub use sar::normalize_sar;
