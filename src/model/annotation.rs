//! Annotation types for the darex model.
//!
//! An [`Annotation`] labels a region of a single image (or a single video
//! frame); a [`VideoAnnotation`] spans multiple frames of a video. Both
//! carry an [`AnnotationClass`] that names their semantic type, optional
//! [`SubAnnotation`] side channels, and authorship lists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Free-form annotation payload data, keyed by field name.
///
/// The shape of the payload depends on the annotation type: a polygon
/// carries `points`, a bounding box carries `x`/`y`/`w`/`h`, and so on.
/// Values are kept as raw JSON so that mask and raster payloads with
/// arbitrary numeric arrays pass through untouched.
pub type DataMap = serde_json::Map<String, Value>;

/// The semantic type of an annotation (e.g. `polygon`, `bounding_box`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationClass {
    /// Display name of the class (e.g. "car").
    pub name: String,

    /// The annotation type of this class (e.g. "polygon", "keypoint").
    pub annotation_type: String,

    /// Internal type override. Only set when the type is known to the
    /// outside world under one name but serialized under another; in
    /// practice this is used for complex polygons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_internal_type: Option<String>,
}

impl AnnotationClass {
    /// Creates a new annotation class.
    pub fn new(name: impl Into<String>, annotation_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation_type: annotation_type.into(),
            annotation_internal_type: None,
        }
    }

    /// Creates a new annotation class with an internal type override.
    pub fn with_internal_type(
        name: impl Into<String>,
        annotation_type: impl Into<String>,
        internal_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            annotation_type: annotation_type.into(),
            annotation_internal_type: Some(internal_type.into()),
        }
    }
}

/// A typed side-channel value attached to an annotation.
///
/// Known kinds are `instance_id`, `attributes` and `text`. Annotations may
/// carry sub-annotations of other kinds for tool-side bookkeeping, but the
/// Darwin writer only emits the known set and drops the rest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubAnnotation {
    /// The kind of this sub-annotation.
    pub annotation_type: String,

    /// The raw payload, in whatever shape the kind requires.
    pub data: Value,
}

impl SubAnnotation {
    /// Creates a sub-annotation of an arbitrary kind.
    pub fn new(annotation_type: impl Into<String>, data: Value) -> Self {
        Self {
            annotation_type: annotation_type.into(),
            data,
        }
    }

    /// Creates an `instance_id` sub-annotation.
    pub fn instance_id(value: u64) -> Self {
        Self::new("instance_id", json!(value))
    }

    /// Creates an `attributes` sub-annotation from a list of attribute names.
    pub fn attributes(attributes: Vec<String>) -> Self {
        Self::new("attributes", json!(attributes))
    }

    /// Creates a `text` sub-annotation.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new("text", Value::String(text.into()))
    }
}

/// A person who annotated or reviewed an annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationAuthor {
    /// Full name of the author.
    pub name: String,

    /// Email address of the author.
    pub email: String,
}

impl AnnotationAuthor {
    /// Creates a new author record.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// An annotation on a single image or video frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// The class of this annotation.
    pub annotation_class: AnnotationClass,

    /// Type-specific payload data.
    pub data: DataMap,

    /// Sub-annotations attached to this annotation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subs: Vec<SubAnnotation>,

    /// People who annotated this region.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotators: Vec<AnnotationAuthor>,

    /// People who reviewed this region.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviewers: Vec<AnnotationAuthor>,

    /// Names of the slots (views/channels) this annotation applies to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slot_names: Vec<String>,
}

impl Annotation {
    /// Creates an annotation with the minimum required fields.
    pub fn new(annotation_class: AnnotationClass, data: DataMap) -> Self {
        Self {
            annotation_class,
            data,
            subs: Vec::new(),
            annotators: Vec::new(),
            reviewers: Vec::new(),
            slot_names: Vec::new(),
        }
    }

    /// Adds a sub-annotation.
    pub fn with_sub(mut self, sub: SubAnnotation) -> Self {
        self.subs.push(sub);
        self
    }

    /// Adds an annotator.
    pub fn with_annotator(mut self, author: AnnotationAuthor) -> Self {
        self.annotators.push(author);
        self
    }

    /// Adds a reviewer.
    pub fn with_reviewer(mut self, author: AnnotationAuthor) -> Self {
        self.reviewers.push(author);
        self
    }

    /// Sets the slot names this annotation applies to.
    pub fn with_slot_names(mut self, slot_names: Vec<String>) -> Self {
        self.slot_names = slot_names;
        self
    }

    /// Returns the first sub-annotation of the given kind, if any.
    pub fn get_sub(&self, annotation_type: &str) -> Option<&SubAnnotation> {
        self.subs
            .iter()
            .find(|sub| sub.annotation_type == annotation_type)
    }
}

/// A temporal annotation spanning frames of a video.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoAnnotation {
    /// The class of this annotation.
    pub annotation_class: AnnotationClass,

    /// Per-frame annotations, keyed by frame index.
    pub frames: BTreeMap<u64, Annotation>,

    /// Which of the frames are keyframes (explicitly annotated rather
    /// than interpolated).
    pub keyframes: BTreeMap<u64, bool>,

    /// Frame-index segments this annotation is visible in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<Vec<u64>>,

    /// Whether frames between keyframes are interpolated.
    #[serde(default)]
    pub interpolated: bool,

    /// People who annotated this region.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotators: Vec<AnnotationAuthor>,

    /// People who reviewed this region.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviewers: Vec<AnnotationAuthor>,

    /// Names of the slots (views/channels) this annotation applies to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slot_names: Vec<String>,
}

impl VideoAnnotation {
    /// Creates a video annotation from its frames and keyframe flags.
    pub fn new(
        annotation_class: AnnotationClass,
        frames: BTreeMap<u64, Annotation>,
        keyframes: BTreeMap<u64, bool>,
    ) -> Self {
        Self {
            annotation_class,
            frames,
            keyframes,
            segments: Vec::new(),
            interpolated: false,
            annotators: Vec::new(),
            reviewers: Vec::new(),
            slot_names: Vec::new(),
        }
    }

    /// Sets the visibility segments.
    pub fn with_segments(mut self, segments: Vec<Vec<u64>>) -> Self {
        self.segments = segments;
        self
    }

    /// Marks this annotation as interpolated between keyframes.
    pub fn with_interpolated(mut self, interpolated: bool) -> Self {
        self.interpolated = interpolated;
        self
    }

    /// Adds an annotator.
    pub fn with_annotator(mut self, author: AnnotationAuthor) -> Self {
        self.annotators.push(author);
        self
    }

    /// Adds a reviewer.
    pub fn with_reviewer(mut self, author: AnnotationAuthor) -> Self {
        self.reviewers.push(author);
        self
    }

    /// Sets the slot names this annotation applies to.
    pub fn with_slot_names(mut self, slot_names: Vec<String>) -> Self {
        self.slot_names = slot_names;
        self
    }

    /// Merges this annotation's frames into a single dictionary:
    ///
    /// ```json
    /// {
    ///   "frames": { "<index>": { ..., "keyframe": true }, ... },
    ///   "segments": [ ... ],
    ///   "interpolated": true
    /// }
    /// ```
    ///
    /// Each frame is seeded as `{ <annotation_type>: <frame data> }` and
    /// passed through `post_processing` together with the frame's
    /// [`Annotation`]; the result is tagged with the frame's keyframe
    /// flag. With `only_keyframes` set, interpolated frames are skipped.
    pub fn get_data<F, E>(&self, only_keyframes: bool, mut post_processing: F) -> Result<DataMap, E>
    where
        F: FnMut(&Annotation, DataMap) -> Result<DataMap, E>,
    {
        let mut frames = DataMap::new();
        for (index, annotation) in &self.frames {
            let keyframe = self.keyframes.get(index).copied().unwrap_or(false);
            if only_keyframes && !keyframe {
                continue;
            }

            let mut seed = DataMap::new();
            seed.insert(
                annotation.annotation_class.annotation_type.clone(),
                Value::Object(annotation.data.clone()),
            );

            let mut frame = post_processing(annotation, seed)?;
            frame.insert("keyframe".to_string(), Value::Bool(keyframe));
            frames.insert(index.to_string(), Value::Object(frame));
        }

        let mut data = DataMap::new();
        data.insert("frames".to_string(), Value::Object(frames));
        data.insert("segments".to_string(), json!(self.segments));
        data.insert("interpolated".to_string(), Value::Bool(self.interpolated));
        Ok(data)
    }
}

/// An annotation as stored in an [`AnnotationFile`]: either a plain image
/// annotation or a temporal video annotation.
///
/// [`AnnotationFile`]: super::AnnotationFile
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileAnnotation {
    /// A temporal annotation spanning video frames.
    Video(VideoAnnotation),
    /// An annotation on a single image.
    Image(Annotation),
}

impl FileAnnotation {
    /// The class of the underlying annotation.
    pub fn annotation_class(&self) -> &AnnotationClass {
        match self {
            FileAnnotation::Video(video) => &video.annotation_class,
            FileAnnotation::Image(image) => &image.annotation_class,
        }
    }

    /// The slot names the underlying annotation applies to.
    pub fn slot_names(&self) -> &[String] {
        match self {
            FileAnnotation::Video(video) => &video.slot_names,
            FileAnnotation::Image(image) => &image.slot_names,
        }
    }

    /// Whether this is a video annotation.
    pub fn is_video(&self) -> bool {
        matches!(self, FileAnnotation::Video(_))
    }
}

impl From<Annotation> for FileAnnotation {
    fn from(annotation: Annotation) -> Self {
        FileAnnotation::Image(annotation)
    }
}

impl From<VideoAnnotation> for FileAnnotation {
    fn from(annotation: VideoAnnotation) -> Self {
        FileAnnotation::Video(annotation)
    }
}
