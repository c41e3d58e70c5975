//! PlaceSnap - turn photos of Chinese signage into geotagged, translated records
//!
//! Recognized text is split into lines, ranked by how much each line looks
//! like a place name and passed through a quality gate. Accepted names are
//! romanized, translated, located from EXIF metadata and stored in SQLite.

pub mod capture;
pub mod config;
pub mod location;
pub mod services;
pub mod storage;
pub mod text;
