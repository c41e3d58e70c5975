//! Location Layer
//!
//! Pulls GPS coordinates out of the EXIF metadata embedded in an image.
//! Purely local: no network access and no live device location here (the
//! optional device fallback lives in the capture pipeline).

use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

use crate::capture::CaptureImage;

/// A validated latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// Read the embedded GPS position of an image, if any
pub fn resolve(image: &CaptureImage) -> Option<Coordinates> {
    let coordinates = resolve_bytes(&image.data);
    debug!(image = %image.reference(), ?coordinates, "Resolved EXIF location");
    coordinates
}

/// Read the GPS position from encoded image bytes
///
/// Returns `None` when there is no EXIF block, no GPS fields, or the values
/// are malformed.
pub fn resolve_bytes(data: &[u8]) -> Option<Coordinates> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()?;

    let latitude = signed_degrees(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let longitude = signed_degrees(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;

    Coordinates::new(latitude, longitude)
}

/// Link that opens the position in a map application
pub fn maps_link(coordinates: Coordinates) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={},{}",
        coordinates.latitude, coordinates.longitude
    )
}

/// Degrees, minutes and seconds to decimal degrees
pub fn dms_to_degrees(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

fn signed_degrees(exif: &exif::Exif, value_tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let degrees = match &field.value {
        Value::Rational(parts) if parts.len() >= 3 => dms_to_degrees(
            parts[0].to_f64(),
            parts[1].to_f64(),
            parts[2].to_f64(),
        ),
        _ => return None,
    };

    // A missing hemisphere reference is read as north/east
    let hemisphere = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|field| match &field.value {
            Value::Ascii(values) => values.first().and_then(|v| v.first().copied()),
            _ => None,
        });

    if hemisphere.map(|h| h.to_ascii_uppercase()) == Some(negative_ref) {
        Some(-degrees)
    } else {
        Some(degrees)
    }
}

/// Minimal JPEG carrying an EXIF GPS block, for tests
///
/// Each coordinate is given as whole degrees, minutes and seconds plus its
/// hemisphere letter.
#[cfg(test)]
pub(crate) fn jpeg_with_gps(lat: (u32, u32, u32), lat_ref: u8, lng: (u32, u32, u32), lng_ref: u8) -> Vec<u8> {
    fn entry(tiff: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: [u8; 4]) {
        tiff.extend_from_slice(&tag.to_be_bytes());
        tiff.extend_from_slice(&kind.to_be_bytes());
        tiff.extend_from_slice(&count.to_be_bytes());
        tiff.extend_from_slice(&value);
    }

    const ASCII: u16 = 2;
    const LONG: u16 = 4;
    const RATIONAL: u16 = 5;
    const GPS_IFD: u32 = 26;
    const LAT_DATA: u32 = 80;
    const LNG_DATA: u32 = 104;

    let mut tiff = Vec::new();
    // Big-endian TIFF header, IFD0 at offset 8
    tiff.extend_from_slice(b"MM\x00\x2A");
    tiff.extend_from_slice(&8u32.to_be_bytes());

    // IFD0: a single GPSInfo pointer
    tiff.extend_from_slice(&1u16.to_be_bytes());
    entry(&mut tiff, 0x8825, LONG, 1, GPS_IFD.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());

    // GPS IFD
    tiff.extend_from_slice(&4u16.to_be_bytes());
    entry(&mut tiff, 0x0001, ASCII, 2, [lat_ref, 0, 0, 0]);
    entry(&mut tiff, 0x0002, RATIONAL, 3, LAT_DATA.to_be_bytes());
    entry(&mut tiff, 0x0003, ASCII, 2, [lng_ref, 0, 0, 0]);
    entry(&mut tiff, 0x0004, RATIONAL, 3, LNG_DATA.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());

    for (d, m, s) in [lat, lng] {
        for part in [d, m, s] {
            tiff.extend_from_slice(&part.to_be_bytes());
            tiff.extend_from_slice(&1u32.to_be_bytes());
        }
    }
    debug_assert_eq!(tiff.len(), 128);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    let segment_len = (2 + 6 + tiff.len()) as u16;
    jpeg.extend_from_slice(&segment_len.to_be_bytes());
    jpeg.extend_from_slice(b"Exif\x00\x00");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_northern_eastern() {
        let jpeg = jpeg_with_gps((31, 12, 36), b'N', (121, 28, 12), b'E');
        let coords = resolve_bytes(&jpeg).unwrap();

        assert!((coords.latitude - 31.21).abs() < 1e-6);
        assert!((coords.longitude - 121.47).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_southern_western() {
        let jpeg = jpeg_with_gps((33, 52, 12), b'S', (151, 12, 36), b'W');
        let coords = resolve_bytes(&jpeg).unwrap();

        assert!((coords.latitude + 33.87).abs() < 1e-6);
        assert!((coords.longitude + 151.21).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_image() {
        let jpeg = jpeg_with_gps((39, 54, 0), b'N', (116, 24, 0), b'E');
        let image = CaptureImage::from_bytes("beijing.jpg", jpeg);

        let coords = resolve(&image).unwrap();
        assert!((coords.latitude - 39.9).abs() < 1e-6);
        assert!((coords.longitude - 116.4).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_without_metadata() {
        assert_eq!(resolve_bytes(&[]), None);
        assert_eq!(resolve_bytes(b"not an image"), None);
        assert_eq!(resolve_bytes(&[0xFF, 0xD8, 0xFF, 0xD9]), None);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let jpeg = jpeg_with_gps((95, 0, 0), b'N', (10, 0, 0), b'E');
        assert_eq!(resolve_bytes(&jpeg), None);
    }

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(31.2, 121.5).is_some());
        assert!(Coordinates::new(-90.0, 180.0).is_some());
        assert!(Coordinates::new(90.1, 0.0).is_none());
        assert!(Coordinates::new(0.0, -180.5).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_dms_to_degrees() {
        assert!((dms_to_degrees(31.0, 30.0, 0.0) - 31.5).abs() < 1e-9);
        assert!((dms_to_degrees(0.0, 0.0, 36.0) - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_maps_link() {
        let coords = Coordinates::new(31.5, 121.25).unwrap();
        assert_eq!(
            maps_link(coords),
            "https://www.google.com/maps/search/?api=1&query=31.5,121.25"
        );
    }
}
