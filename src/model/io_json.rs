//! JSON serialization for annotation manifests.
//!
//! A manifest is a JSON array of [`AnnotationFile`] records. This is the
//! format the CLI reads its input from, and it doubles as a convenient
//! fixture format for tests.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::file::AnnotationFile;
use crate::error::DarexError;

/// Reads annotation-file records from a JSON manifest.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_manifest_json(path: &Path) -> Result<Vec<AnnotationFile>, DarexError> {
    let file = File::open(path).map_err(DarexError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| DarexError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes annotation-file records to a JSON manifest.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_manifest_json(path: &Path, files: &[AnnotationFile]) -> Result<(), DarexError> {
    let file = File::create(path).map_err(DarexError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, files).map_err(|source| DarexError::ManifestWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses annotation-file records from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_json_str(json: &str) -> Result<Vec<AnnotationFile>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Serializes annotation-file records to a JSON string.
///
/// Useful for testing without file I/O.
pub fn to_json_string(files: &[AnnotationFile]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, AnnotationClass, DataMap, SubAnnotation};
    use serde_json::json;

    fn sample_manifest() -> Vec<AnnotationFile> {
        let mut data = DataMap::new();
        data.insert("points".to_string(), json!([{"x": 1.0, "y": 2.0}]));

        vec![
            AnnotationFile::new("img.png")
                .with_seq(1)
                .with_dimensions(640, 480)
                .with_annotation(
                    Annotation::new(AnnotationClass::new("car", "polygon"), data)
                        .with_sub(SubAnnotation::instance_id(4)),
                ),
            AnnotationFile::new("clip.mp4").with_frame_urls(vec!["u/0".to_string()]),
        ]
    }

    #[test]
    fn test_manifest_roundtrip() {
        let original = sample_manifest();

        let json = to_json_string(&original).expect("serialization failed");
        let restored = from_json_str(&json).expect("deserialization failed");

        assert_eq!(original, restored);
    }

    #[test]
    fn test_manifest_file_roundtrip() {
        let scratch = tempfile::tempdir().expect("create tempdir");
        let path = scratch.path().join("manifest.json");

        let original = sample_manifest();
        write_manifest_json(&path, &original).expect("write manifest");
        let restored = read_manifest_json(&path).expect("read manifest");

        assert_eq!(original, restored);
    }

    #[test]
    fn test_manifest_format() {
        let manifest = sample_manifest();
        let json = to_json_string(&manifest).expect("serialization failed");

        assert!(json.contains("\"filename\""));
        assert!(json.contains("\"img.png\""));
        assert!(json.contains("\"instance_id\""));
    }
}
