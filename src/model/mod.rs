//! The darex annotation model.
//!
//! This module defines the in-memory representation of annotated images
//! and videos that the exporters consume. The model is read-only from the
//! exporters' point of view: records are constructed (or deserialized from
//! a manifest), handed to a writer, and never mutated.
//!
//! # Design Principles
//!
//! 1. **Sum types over flags**: an annotation is either an image
//!    annotation or a video annotation, expressed as the
//!    [`FileAnnotation`] enum and dispatched by pattern match.
//!
//! 2. **Raw payloads**: type-specific annotation data (polygon points,
//!    box extents, raster masks) is carried as raw JSON ([`DataMap`]) so
//!    that exporters can reshape it without the model enumerating every
//!    payload schema.
//!
//! # Example
//!
//! ```
//! use darex::model::{Annotation, AnnotationClass, AnnotationFile, DataMap};
//! use serde_json::json;
//!
//! let mut data = DataMap::new();
//! data.insert("points".to_string(), json!([{"x": 1.0, "y": 2.0}]));
//!
//! let file = AnnotationFile::new("img.png")
//!     .with_dimensions(640, 480)
//!     .with_annotation(Annotation::new(AnnotationClass::new("car", "polygon"), data));
//! ```

mod annotation;
mod file;
pub mod io_json;

// Re-export core types for convenient access
pub use annotation::{
    Annotation, AnnotationAuthor, AnnotationClass, DataMap, FileAnnotation, SubAnnotation,
    VideoAnnotation,
};
pub use file::AnnotationFile;
