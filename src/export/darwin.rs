//! Darwin JSON writer.
//!
//! Writes one pretty-printed JSON document per [`AnnotationFile`], in the
//! layout used by V7's Darwin platform for image and video exports:
//!
//! ```json
//! {
//!   "image": { "seq": 1, "width": 640, "height": 480, ... },
//!   "annotations": [
//!     { "polygon": { "points": [...] }, "name": "car", "slot_names": [...] }
//!   ]
//! }
//! ```
//!
//! The bulk of the work is dictionary shaping: merging sub-annotation
//! payloads, authorship and the type payload into one object per
//! annotation, and reshaping complex polygons into the historical
//! `path`/`additional_paths` form.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{json, Value};

use crate::error::DarexError;
use crate::model::{
    Annotation, AnnotationAuthor, AnnotationClass, AnnotationFile, DataMap, FileAnnotation,
    SubAnnotation, VideoAnnotation,
};

// ============================================================================
// Public API
// ============================================================================

/// Exports each annotation file as `<output_dir>/<filename>.json`.
///
/// Files are processed in iteration order, each independently of the
/// others. The first write failure aborts the run; already-written
/// documents are left in place.
///
/// # Errors
/// Returns an error if a document cannot be built (malformed complex
/// polygon data) or written (missing directory, permissions, disk full).
pub fn export<'a, I>(annotation_files: I, output_dir: &Path) -> Result<(), DarexError>
where
    I: IntoIterator<Item = &'a AnnotationFile>,
{
    for annotation_file in annotation_files {
        export_file(annotation_file, output_dir)?;
    }
    Ok(())
}

/// Exports a single annotation file into `output_dir`.
///
/// The output name is the file's `filename` with its extension replaced
/// by `.json`.
pub fn export_file(
    annotation_file: &AnnotationFile,
    output_dir: &Path,
) -> Result<(), DarexError> {
    let document = build_json(annotation_file)?;
    let output_path = output_dir
        .join(&annotation_file.filename)
        .with_extension("json");

    let file = File::create(&output_path).map_err(DarexError::Io)?;
    let writer = BufWriter::new(file);
    write_pretty(writer, &document).map_err(|source| DarexError::DarwinJsonWrite {
        path: output_path,
        source,
    })
}

/// Builds the Darwin document for one annotation file.
pub fn build_json(annotation_file: &AnnotationFile) -> Result<DataMap, DarexError> {
    if annotation_file.is_video {
        build_video_json(annotation_file)
    } else {
        build_image_json(annotation_file)
    }
}

/// Renders the Darwin document for one annotation file as a string,
/// using the same single-space indent as [`export`].
///
/// Useful for testing without file I/O.
pub fn to_darwin_string(annotation_file: &AnnotationFile) -> Result<String, DarexError> {
    let document = build_json(annotation_file)?;
    let mut buffer = Vec::new();
    write_pretty(&mut buffer, &document).map_err(|source| DarexError::DarwinJsonWrite {
        path: Path::new("<string>").to_path_buf(),
        source,
    })?;
    // serde_json output is always valid UTF-8.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

// Darwin documents are pretty-printed with a single-space indent.
fn write_pretty<W: std::io::Write>(writer: W, document: &DataMap) -> Result<(), serde_json::Error> {
    let formatter = PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    document.serialize(&mut serializer)
}

// ============================================================================
// Document building
// ============================================================================

fn build_image_json(annotation_file: &AnnotationFile) -> Result<DataMap, DarexError> {
    let mut document = DataMap::new();
    document.insert(
        "image".to_string(),
        json!({
            "seq": annotation_file.seq,
            "width": annotation_file.image_width,
            "height": annotation_file.image_height,
            "filename": annotation_file.filename,
            "original_filename": annotation_file.filename,
            "url": annotation_file.image_url,
            "thumbnail_url": annotation_file.image_thumbnail_url,
            "path": annotation_file.remote_path,
            "workview_url": annotation_file.workview_url,
        }),
    );
    document.insert(
        "annotations".to_string(),
        build_annotations(annotation_file)?,
    );
    Ok(document)
}

fn build_video_json(annotation_file: &AnnotationFile) -> Result<DataMap, DarexError> {
    let frame_count = annotation_file
        .frame_urls
        .as_ref()
        .map_or(0, |urls| urls.len());

    let mut document = DataMap::new();
    document.insert(
        "image".to_string(),
        json!({
            "seq": annotation_file.seq,
            "frame_urls": annotation_file.frame_urls,
            "frame_count": frame_count,
            "width": annotation_file.image_width,
            "height": annotation_file.image_height,
            "filename": annotation_file.filename,
            "original_filename": annotation_file.filename,
            "thumbnail_url": annotation_file.image_thumbnail_url,
            "url": annotation_file.image_url,
            "path": annotation_file.remote_path,
            "workview_url": annotation_file.workview_url,
        }),
    );
    document.insert(
        "annotations".to_string(),
        build_annotations(annotation_file)?,
    );
    Ok(document)
}

fn build_annotations(annotation_file: &AnnotationFile) -> Result<Value, DarexError> {
    let payloads = annotation_file
        .annotations
        .iter()
        .map(build_annotation)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(payloads))
}

fn build_annotation(annotation: &FileAnnotation) -> Result<Value, DarexError> {
    match annotation {
        FileAnnotation::Video(video) => build_video_annotation(video).map(Value::Object),
        FileAnnotation::Image(image) => build_image_annotation(image, false).map(Value::Object),
    }
}

// ============================================================================
// Annotation mapping
// ============================================================================

/// Builds the payload for one image annotation.
///
/// Merge order defines key precedence, later steps overwriting earlier
/// ones: sub-annotation payloads, then authorship, then the legacy-shaped
/// type payload, then the class name. `skip_slots` is set when building
/// the per-frame content of a video annotation, where slot information
/// lives on the video annotation itself.
fn build_image_annotation(
    annotation: &Annotation,
    skip_slots: bool,
) -> Result<DataMap, DarexError> {
    let mut payload = DataMap::new();

    for sub in &annotation.subs {
        if let Some((key, value)) = build_sub_annotation(sub) {
            payload.insert(key, value);
        }
    }

    for (key, value) in build_authorship(&annotation.annotators, &annotation.reviewers) {
        payload.insert(key, value);
    }

    let (type_key, data) =
        build_legacy_annotation_data(&annotation.annotation_class, &annotation.data)?;
    payload.insert(type_key, Value::Object(data));
    payload.insert(
        "name".to_string(),
        Value::String(annotation.annotation_class.name.clone()),
    );

    if !skip_slots {
        payload.insert("slot_names".to_string(), json!(annotation.slot_names));
    }
    Ok(payload)
}

/// Builds the payload for one video annotation: the frame-merged content
/// from [`VideoAnnotation::get_data`], overlaid with the class name, the
/// video annotation's own slot names and its authorship.
fn build_video_annotation(annotation: &VideoAnnotation) -> Result<DataMap, DarexError> {
    let mut payload = annotation.get_data(false, |frame_annotation, _| {
        build_image_annotation(frame_annotation, true)
    })?;

    payload.insert(
        "name".to_string(),
        Value::String(annotation.annotation_class.name.clone()),
    );
    payload.insert("slot_names".to_string(), json!(annotation.slot_names));
    for (key, value) in build_authorship(&annotation.annotators, &annotation.reviewers) {
        payload.insert(key, value);
    }
    Ok(payload)
}

/// Maps one sub-annotation to its output key and value. Unrecognised
/// kinds produce no entry and are dropped from the output.
fn build_sub_annotation(sub: &SubAnnotation) -> Option<(String, Value)> {
    match sub.annotation_type.as_str() {
        "instance_id" => Some((sub.annotation_type.clone(), json!({"value": sub.data}))),
        "attributes" => Some((sub.annotation_type.clone(), sub.data.clone())),
        "text" => Some((sub.annotation_type.clone(), json!({"text": sub.data}))),
        _ => None,
    }
}

/// Builds the authorship block: at most one key, `annotators`.
///
/// Annotators are inserted first, then reviewers under the same key, so
/// when both lists are present the reviewer list silently replaces the
/// annotator list. This precedence is part of the format's observed
/// behavior; do not reorder the inserts.
fn build_authorship(annotators: &[AnnotationAuthor], reviewers: &[AnnotationAuthor]) -> DataMap {
    let mut authorship = DataMap::new();
    if !annotators.is_empty() {
        authorship.insert(
            "annotators".to_string(),
            Value::Array(annotators.iter().map(build_author).collect()),
        );
    }
    if !reviewers.is_empty() {
        authorship.insert(
            "annotators".to_string(),
            Value::Array(reviewers.iter().map(build_author).collect()),
        );
    }
    authorship
}

fn build_author(author: &AnnotationAuthor) -> Value {
    json!({"full_name": author.name, "email": author.email})
}

// ============================================================================
// Legacy shape adapter
// ============================================================================

/// Decides the top-level type key for an annotation payload and reshapes
/// the data where the historical schema differs from the model.
///
/// Complex polygons store their rings as one `paths` list; the output
/// schema wants the primary ring under `path` and the holes under
/// `additional_paths`, keyed by the class's internal type override (or
/// `polygon` when unset). Everything else passes through under the class's
/// annotation type.
///
/// Operates on a copy; the caller's data map is never mutated.
fn build_legacy_annotation_data(
    annotation_class: &AnnotationClass,
    data: &DataMap,
) -> Result<(String, DataMap), DarexError> {
    if annotation_class.annotation_type != "complex_polygon" {
        return Ok((annotation_class.annotation_type.clone(), data.clone()));
    }

    let mut data = data.clone();
    let paths = match data.remove("paths") {
        Some(Value::Array(paths)) if !paths.is_empty() => paths,
        _ => {
            return Err(DarexError::MissingPaths {
                class_name: annotation_class.name.clone(),
            })
        }
    };

    let mut paths = paths.into_iter();
    let path = paths.next().ok_or_else(|| DarexError::MissingPaths {
        class_name: annotation_class.name.clone(),
    })?;
    data.insert("path".to_string(), path);
    data.insert("additional_paths".to_string(), Value::Array(paths.collect()));

    let type_key = annotation_class
        .annotation_internal_type
        .clone()
        .unwrap_or_else(|| "polygon".to_string());
    Ok((type_key, data))
}

// ============================================================================
// Backward-compat document builder
// ============================================================================

/// Builds the narrow legacy document for an annotation file:
///
/// ```json
/// {
///   "annotations": [
///     { "polygon": { ... }, "name": "car", "bounding_box": { ... } }
///   ],
///   "image": { "filename": "...", "height": 1000, "width": 2000, "url": "..." }
/// }
/// ```
///
/// This shape predates the full export layout: it omits authorship,
/// sub-annotations and slot data, copies a polygon's `bounding_box` datum
/// to the top level, and only covers image annotations (video entries are
/// skipped). Kept for consumers of the historical layout; new code should
/// use [`build_json`]. Scheduled for removal once those consumers migrate.
pub fn build_image_annotation_document(
    annotation_file: &AnnotationFile,
) -> Result<DataMap, DarexError> {
    let mut annotations = Vec::new();
    for annotation in &annotation_file.annotations {
        let FileAnnotation::Image(annotation) = annotation else {
            continue;
        };

        let annotation_type = annotation.annotation_class.annotation_type.as_str();
        let mut payload = DataMap::new();
        payload.insert(
            annotation_type.to_string(),
            Value::Object(annotation_data(annotation)?),
        );
        payload.insert(
            "name".to_string(),
            Value::String(annotation.annotation_class.name.clone()),
        );

        if annotation_type == "complex_polygon" || annotation_type == "polygon" {
            if let Some(bounding_box) = annotation.data.get("bounding_box") {
                payload.insert("bounding_box".to_string(), bounding_box.clone());
            }
        }

        annotations.push(Value::Object(payload));
    }

    let mut document = DataMap::new();
    document.insert("annotations".to_string(), Value::Array(annotations));
    document.insert(
        "image".to_string(),
        json!({
            "filename": annotation_file.filename,
            "height": annotation_file.image_height,
            "width": annotation_file.image_width,
            "url": annotation_file.image_url,
        }),
    );
    Ok(document)
}

/// Builds the bare data payload for one annotation in the legacy document
/// shape.
///
/// Identical to the private helper behind
/// [`build_image_annotation_document`]; calling it directly is deprecated
/// because the payload shape is an implementation detail of that document.
#[deprecated(
    since = "0.2.0",
    note = "use build_image_annotation_document instead; this low-level helper will become private"
)]
pub fn build_annotation_data(annotation: &Annotation) -> Result<DataMap, DarexError> {
    annotation_data(annotation)
}

fn annotation_data(annotation: &Annotation) -> Result<DataMap, DarexError> {
    let annotation_class = &annotation.annotation_class;

    // Historical quirk: the legacy shape nests the entire ring list under
    // "path", without the primary/additional split of the full layout.
    if annotation_class.annotation_type == "complex_polygon" {
        let paths = annotation
            .data
            .get("paths")
            .cloned()
            .ok_or_else(|| DarexError::MissingPaths {
                class_name: annotation_class.name.clone(),
            })?;
        let mut data = DataMap::new();
        data.insert("path".to_string(), paths);
        return Ok(data);
    }

    if annotation_class.annotation_type == "polygon" {
        return Ok(annotation
            .data
            .iter()
            .filter(|(key, _)| key.as_str() != "bounding_box")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect());
    }

    Ok(annotation.data.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn polygon_data() -> DataMap {
        let mut data = DataMap::new();
        data.insert(
            "points".to_string(),
            json!([{"x": 0.0, "y": 0.0}, {"x": 5.0, "y": 0.0}, {"x": 5.0, "y": 5.0}]),
        );
        data
    }

    fn complex_polygon_data() -> DataMap {
        let mut data = DataMap::new();
        data.insert(
            "paths".to_string(),
            json!([
                [{"x": 0.0, "y": 0.0}, {"x": 9.0, "y": 0.0}, {"x": 9.0, "y": 9.0}],
                [{"x": 3.0, "y": 3.0}, {"x": 6.0, "y": 3.0}, {"x": 6.0, "y": 6.0}],
            ]),
        );
        data
    }

    #[test]
    fn test_sub_annotation_known_kinds() {
        let (key, value) = build_sub_annotation(&SubAnnotation::instance_id(42)).unwrap();
        assert_eq!(key, "instance_id");
        assert_eq!(value, json!({"value": 42}));

        let attributes = SubAnnotation::new("attributes", json!({"color": "red"}));
        let (key, value) = build_sub_annotation(&attributes).unwrap();
        assert_eq!(key, "attributes");
        assert_eq!(value, json!({"color": "red"}));

        let (key, value) = build_sub_annotation(&SubAnnotation::text("hello")).unwrap();
        assert_eq!(key, "text");
        assert_eq!(value, json!({"text": "hello"}));
    }

    #[test]
    fn test_sub_annotation_unknown_kind_is_dropped() {
        let sub = SubAnnotation::new("directional_vector", json!({"angle": 0.5}));
        assert!(build_sub_annotation(&sub).is_none());
    }

    #[test]
    fn test_authorship_empty_when_no_authors() {
        assert!(build_authorship(&[], &[]).is_empty());
    }

    #[test]
    fn test_authorship_annotators_only() {
        let annotators = vec![AnnotationAuthor::new("A", "a@x.com")];
        let authorship = build_authorship(&annotators, &[]);
        assert_eq!(
            authorship["annotators"],
            json!([{"full_name": "A", "email": "a@x.com"}])
        );
    }

    #[test]
    fn test_authorship_reviewers_win_over_annotators() {
        let annotators = vec![AnnotationAuthor::new("A", "a@x.com")];
        let reviewers = vec![AnnotationAuthor::new("B", "b@x.com")];
        let authorship = build_authorship(&annotators, &reviewers);

        assert_eq!(authorship.len(), 1);
        assert_eq!(
            authorship["annotators"],
            json!([{"full_name": "B", "email": "b@x.com"}])
        );
    }

    #[test]
    fn test_legacy_data_passthrough_for_plain_types() {
        let class = AnnotationClass::new("car", "polygon");
        let data = polygon_data();
        let (key, shaped) = build_legacy_annotation_data(&class, &data).unwrap();
        assert_eq!(key, "polygon");
        assert_eq!(shaped, data);
    }

    #[test]
    fn test_legacy_data_splits_complex_polygon_paths() {
        let class = AnnotationClass::new("donut", "complex_polygon");
        let data = complex_polygon_data();
        let (key, shaped) = build_legacy_annotation_data(&class, &data).unwrap();

        assert_eq!(key, "polygon");
        assert!(shaped.get("paths").is_none());
        assert_eq!(shaped["path"], data["paths"][0]);
        assert_eq!(shaped["additional_paths"], json!([data["paths"][1]]));
    }

    #[test]
    fn test_legacy_data_honors_internal_type_override() {
        let class = AnnotationClass::with_internal_type("donut", "complex_polygon", "cpoly");
        let (key, _) = build_legacy_annotation_data(&class, &complex_polygon_data()).unwrap();
        assert_eq!(key, "cpoly");
    }

    #[test]
    fn test_legacy_data_missing_paths_is_an_error() {
        let class = AnnotationClass::new("donut", "complex_polygon");
        let result = build_legacy_annotation_data(&class, &DataMap::new());
        assert!(matches!(result, Err(DarexError::MissingPaths { .. })));

        let mut empty = DataMap::new();
        empty.insert("paths".to_string(), json!([]));
        let result = build_legacy_annotation_data(&class, &empty);
        assert!(matches!(result, Err(DarexError::MissingPaths { .. })));
    }

    #[test]
    fn test_legacy_data_does_not_mutate_caller_map() {
        let class = AnnotationClass::new("donut", "complex_polygon");
        let data = complex_polygon_data();
        let snapshot = data.clone();
        build_legacy_annotation_data(&class, &data).unwrap();
        assert_eq!(data, snapshot);
    }

    #[test]
    fn test_image_annotation_merge_order_and_slots() {
        let annotation = Annotation::new(AnnotationClass::new("car", "polygon"), polygon_data())
            .with_sub(SubAnnotation::text("hello"))
            .with_slot_names(vec!["front".to_string()]);

        let payload = build_image_annotation(&annotation, false).unwrap();
        assert_eq!(payload["text"], json!({"text": "hello"}));
        assert_eq!(payload["name"], json!("car"));
        assert_eq!(payload["slot_names"], json!(["front"]));

        let payload = build_image_annotation(&annotation, true).unwrap();
        assert!(payload.get("slot_names").is_none());
    }

    #[test]
    fn test_video_annotation_payload() {
        let class = AnnotationClass::new("car", "polygon");
        let frames = BTreeMap::from([
            (0, Annotation::new(class.clone(), polygon_data())),
            (2, Annotation::new(class.clone(), polygon_data())),
        ]);
        let keyframes = BTreeMap::from([(0, true), (2, false)]);
        let video = VideoAnnotation::new(class, frames, keyframes)
            .with_segments(vec![vec![0, 2]])
            .with_interpolated(true)
            .with_slot_names(vec!["0".to_string()])
            .with_reviewer(AnnotationAuthor::new("B", "b@x.com"));

        let payload = build_video_annotation(&video).unwrap();

        assert_eq!(payload["name"], json!("car"));
        assert_eq!(payload["slot_names"], json!(["0"]));
        assert_eq!(
            payload["annotators"],
            json!([{"full_name": "B", "email": "b@x.com"}])
        );
        assert_eq!(payload["segments"], json!([[0, 2]]));
        assert_eq!(payload["interpolated"], json!(true));

        let frames = payload["frames"].as_object().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames["0"]["keyframe"], json!(true));
        assert_eq!(frames["0"]["name"], json!("car"));
        // Per-frame payloads omit slot names; they live on the video
        // annotation itself.
        assert!(frames["0"].get("slot_names").is_none());
        assert!(frames["0"].get("polygon").is_some());
    }

    #[test]
    fn test_legacy_document_copies_polygon_bounding_box() {
        let mut data = polygon_data();
        data.insert(
            "bounding_box".to_string(),
            json!({"x": 0.0, "y": 0.0, "w": 5.0, "h": 5.0}),
        );
        let file = AnnotationFile::new("img.png")
            .with_dimensions(2000, 1000)
            .with_annotation(Annotation::new(AnnotationClass::new("car", "polygon"), data));

        let document = build_image_annotation_document(&file).unwrap();
        let annotations = document["annotations"].as_array().unwrap();
        assert_eq!(annotations.len(), 1);
        assert_eq!(
            annotations[0]["bounding_box"],
            json!({"x": 0.0, "y": 0.0, "w": 5.0, "h": 5.0})
        );
        // The bounding box datum stays out of the polygon payload itself.
        assert!(annotations[0]["polygon"].get("bounding_box").is_none());
        assert_eq!(document["image"]["width"], json!(2000));
        assert_eq!(document["image"]["filename"], json!("img.png"));
    }

    #[test]
    fn test_legacy_document_nests_whole_paths_list() {
        let file = AnnotationFile::new("img.png").with_annotation(Annotation::new(
            AnnotationClass::new("donut", "complex_polygon"),
            complex_polygon_data(),
        ));

        let document = build_image_annotation_document(&file).unwrap();
        let payload = &document["annotations"][0]["complex_polygon"];
        assert_eq!(payload["path"], complex_polygon_data()["paths"]);
    }

    #[test]
    #[allow(deprecated)]
    fn test_deprecated_entry_point_matches_private_impl() {
        let annotation = Annotation::new(
            AnnotationClass::new("donut", "complex_polygon"),
            complex_polygon_data(),
        );
        assert_eq!(
            build_annotation_data(&annotation).unwrap(),
            annotation_data(&annotation).unwrap()
        );
    }
}
