//! The persisted snap record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::location::Coordinates;

/// A captured place: recognized name, romanization, location and translation
///
/// Immutable once created; the store only inserts or deletes whole snaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedSnap {
    /// Unique id generated at creation
    pub id: String,
    /// Path of the source image
    pub image_reference: String,
    /// Chosen Chinese text
    pub recognized_text: String,
    /// Pinyin of the chosen text
    pub pinyin: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Reverse-geocoded address, or the unknown-location marker when lookup failed
    pub address: Option<String>,
    /// English translation or its fallback
    pub translation: String,
    /// Map link for the location
    pub maps_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CapturedSnap {
    /// Create a snap with a fresh id and the current time
    pub fn new(
        image_reference: String,
        recognized_text: String,
        pinyin: String,
        coordinates: Option<Coordinates>,
        address: Option<String>,
        translation: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            image_reference,
            recognized_text,
            pinyin,
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            address,
            translation,
            maps_link: coordinates.map(crate::location::maps_link),
            created_at: Utc::now(),
        }
    }

    /// Stored coordinates, when both halves are present
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.latitude?, self.longitude?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let a = CapturedSnap::new("a.jpg".into(), "火锅".into(), "huo guo".into(), None, None, "Hot Pot".into());
        let b = CapturedSnap::new("a.jpg".into(), "火锅".into(), "huo guo".into(), None, None, "Hot Pot".into());

        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn test_new_with_location_builds_maps_link() {
        let coords = Coordinates::new(31.5, 121.25).unwrap();
        let snap = CapturedSnap::new(
            "b.jpg".into(),
            "面馆".into(),
            "mian guan".into(),
            Some(coords),
            Some("上海".into()),
            "Noodle House".into(),
        );

        assert_eq!(snap.coordinates(), Some(coords));
        assert_eq!(
            snap.maps_link.as_deref(),
            Some("https://www.google.com/maps/search/?api=1&query=31.5,121.25")
        );
    }

    #[test]
    fn test_new_without_location() {
        let snap = CapturedSnap::new("c.jpg".into(), "小吃".into(), "xiao chi".into(), None, None, "Snacks".into());

        assert!(snap.coordinates().is_none());
        assert!(snap.maps_link.is_none());
        assert!(snap.address.is_none());
    }
}
