//! Image handed to the capture pipeline

use std::path::{Path, PathBuf};

/// A photographed or picked image
#[derive(Debug, Clone)]
pub struct CaptureImage {
    /// Where the image lives; stored on the snap as its image reference
    pub path: PathBuf,
    /// Encoded image bytes (JPEG, PNG, ...)
    pub data: Vec<u8>,
}

impl CaptureImage {
    /// Load an image from disk
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(path, data))
    }

    /// Wrap bytes that are already in memory
    pub fn from_bytes(path: impl Into<PathBuf>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// Reference persisted with the snap
    pub fn reference(&self) -> String {
        self.path.display().to_string()
    }

    /// Size of the encoded image in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image holds no bytes at all
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_reads_bytes() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xD9]).unwrap();

        let image = CaptureImage::open(file.path()).unwrap();
        assert_eq!(image.len(), 4);
        assert_eq!(image.reference(), file.path().display().to_string());
    }

    #[test]
    fn test_open_missing_file() {
        assert!(CaptureImage::open("/nonexistent/snap.jpg").is_err());
    }

    #[test]
    fn test_from_bytes() {
        let image = CaptureImage::from_bytes("snaps/a.jpg", vec![]);
        assert!(image.is_empty());
        assert_eq!(image.reference(), "snaps/a.jpg");
    }
}
