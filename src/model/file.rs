//! The annotation-file record: one source image or video plus its
//! annotations and remote metadata.

use serde::{Deserialize, Serialize};

use super::annotation::FileAnnotation;

/// One source image or video with its annotations.
///
/// Immutable input to the exporters; nothing in darex mutates a file
/// record once constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationFile {
    /// Sequence number of this file within its dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,

    /// Name of the source file (e.g. "img.png").
    pub filename: String,

    /// Width of the image in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,

    /// Height of the image in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,

    /// Remote URL of the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Remote URL of the image thumbnail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_thumbnail_url: Option<String>,

    /// URL of the work view for this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workview_url: Option<String>,

    /// Remote directory path of this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_path: Option<String>,

    /// Per-frame URLs, for video files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_urls: Option<Vec<String>>,

    /// Whether this record is a video.
    #[serde(default)]
    pub is_video: bool,

    /// The annotations on this file, in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<FileAnnotation>,
}

impl AnnotationFile {
    /// Creates an image file record with the given filename.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            seq: None,
            filename: filename.into(),
            image_width: None,
            image_height: None,
            image_url: None,
            image_thumbnail_url: None,
            workview_url: None,
            remote_path: None,
            frame_urls: None,
            is_video: false,
            annotations: Vec::new(),
        }
    }

    /// Sets the sequence number.
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = Some(seq);
        self
    }

    /// Sets the image dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.image_width = Some(width);
        self.image_height = Some(height);
        self
    }

    /// Sets the remote image and thumbnail URLs.
    pub fn with_urls(
        mut self,
        image_url: impl Into<String>,
        thumbnail_url: impl Into<String>,
    ) -> Self {
        self.image_url = Some(image_url.into());
        self.image_thumbnail_url = Some(thumbnail_url.into());
        self
    }

    /// Sets the work-view URL.
    pub fn with_workview_url(mut self, workview_url: impl Into<String>) -> Self {
        self.workview_url = Some(workview_url.into());
        self
    }

    /// Sets the remote directory path.
    pub fn with_remote_path(mut self, remote_path: impl Into<String>) -> Self {
        self.remote_path = Some(remote_path.into());
        self
    }

    /// Marks this record as a video with the given per-frame URLs.
    pub fn with_frame_urls(mut self, frame_urls: Vec<String>) -> Self {
        self.frame_urls = Some(frame_urls);
        self.is_video = true;
        self
    }

    /// Adds an annotation.
    pub fn with_annotation(mut self, annotation: impl Into<FileAnnotation>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Returns the absolute remote path of this file, joining the remote
    /// directory path (or "/" when absent) with the filename.
    pub fn full_path(&self) -> String {
        let remote = self
            .remote_path
            .as_deref()
            .map(|path| path.trim_matches('/'))
            .unwrap_or("");
        if remote.is_empty() {
            format!("/{}", self.filename)
        } else {
            format!("/{}/{}", remote, self.filename)
        }
    }
}
