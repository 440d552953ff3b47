//! CEOS file discovery and record access

pub mod datetime;
pub mod names;
pub mod records;
pub mod workreport;

// Re-export main types
pub use names::{
    find_data, find_metadata, find_pair, require_data, require_metadata, require_pair,
    CeosFileSet, DataMatch, MetadataMatch,
};
pub use records::{
    AlosMapProjection, AsfFacility, DatasetSummary, EsaFacility, FileDescriptor,
    ImageFileDescriptor, LinePolarization, MapProjection, PositionData, ProcessingParameters,
    RadiometricCompensation, RecordReader, SceneHeader,
};
pub use workreport::alos_scene_duration;
