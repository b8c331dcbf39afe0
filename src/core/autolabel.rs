//! # Auto-labelling
//!
//! Runs an object detector over a batch of images and writes one YOLO
//! label file per image.
//!
//! The detector is a black box behind [`Detector`]: given a resized image
//! and thresholds it returns normalized boxes. Images that already have a
//! label file are never overwritten.

use crate::core::cancel::CancellationToken;
use crate::core::labels::{write_label_file, ClassTag, LabelLayout, LabelStore, YoloLabel};
use crate::error::DetectError;
use crate::events::{AutoLabelEvent, Event, EventSender};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Thresholds and input size handed to the detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Minimum confidence for a box to be kept
    pub confidence: f32,
    /// IoU above which overlapping boxes are suppressed
    pub iou: f32,
    /// Width images are resized to before detection
    pub input_width: u32,
    /// Height images are resized to before detection
    pub input_height: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            confidence: 0.25,
            iou: 0.5,
            input_width: 640,
            input_height: 640,
        }
    }
}

/// One detected object, geometry relative to the image size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub class_id: u32,
    pub confidence: f32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl Detection {
    /// As a confirmed label, the form written by batch labelling
    pub fn to_label(&self) -> YoloLabel {
        self.with_class(ClassTag::Id(self.class_id))
    }

    /// As an unconfirmed prediction carrying its confidence
    pub fn to_prediction(&self) -> YoloLabel {
        self.with_class(ClassTag::Predicted {
            class_id: self.class_id,
            confidence: self.confidence,
        })
    }

    fn with_class(&self, class: ClassTag) -> YoloLabel {
        YoloLabel::new(class, self.x_center, self.y_center, self.width, self.height)
    }
}

/// An object detection model
pub trait Detector {
    fn detect(
        &mut self,
        image: &DynamicImage,
        settings: &DetectorSettings,
    ) -> Result<Vec<Detection>, DetectError>;
}

/// Counts for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoLabelSummary {
    /// Images that got a new label file
    pub labeled: usize,
    /// Images skipped because they were already labelled
    pub skipped: usize,
    /// Images that could not be decoded, detected or saved
    pub failed: usize,
    pub cancelled: bool,
}

/// Batch labeller around a detector
pub struct AutoLabeler<D> {
    detector: D,
    settings: DetectorSettings,
    labels: LabelStore,
}

impl<D: Detector> AutoLabeler<D> {
    pub fn new(detector: D, settings: DetectorSettings, layout: LabelLayout) -> Self {
        Self {
            detector,
            settings,
            labels: LabelStore::new(layout),
        }
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// Detect objects in one image without saving anything.
    ///
    /// Results are unconfirmed predictions.
    pub fn predict(&mut self, image: &Path) -> Result<Vec<YoloLabel>, DetectError> {
        let detections = self.detect_file(image)?;
        Ok(detections.iter().map(Detection::to_prediction).collect())
    }

    /// Label every image in order.
    ///
    /// Cancellation is checked before each image. Per-image failures are
    /// logged and counted; they do not stop the batch.
    pub fn run(
        &mut self,
        images: &[PathBuf],
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> AutoLabelSummary {
        let total = images.len();
        let mut summary = AutoLabelSummary::default();
        info!(total, "Starting auto-labelling");

        for (i, image) in images.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(labeled = summary.labeled, "Auto-labelling cancelled");
                summary.cancelled = true;
                events.send(Event::AutoLabel(AutoLabelEvent::Cancelled));
                return summary;
            }

            events.send(Event::AutoLabel(AutoLabelEvent::Progress {
                current: i + 1,
                total,
                path: image.clone(),
            }));

            if self.labels.has_labels(image) {
                debug!(path = %image.display(), "Already labelled");
                summary.skipped += 1;
                continue;
            }

            match self.label_one(image) {
                Ok(boxes) => {
                    debug!(path = %image.display(), boxes, "Labelled");
                    summary.labeled += 1;
                }
                Err(e) => {
                    warn!(path = %image.display(), error = %e, "Auto-labelling failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            labeled = summary.labeled,
            skipped = summary.skipped,
            failed = summary.failed,
            "Auto-labelling finished"
        );
        events.send(Event::AutoLabel(AutoLabelEvent::Finished {
            labeled: summary.labeled,
            skipped: summary.skipped,
            failed: summary.failed,
        }));
        summary
    }

    /// Detect and save; an image with no detections gets an empty file
    /// so that later batches skip it.
    fn label_one(&mut self, image: &Path) -> Result<usize, DetectError> {
        let labels: Vec<YoloLabel> = self
            .detect_file(image)?
            .iter()
            .map(Detection::to_label)
            .collect();

        let path = self.labels.path_for(image)?;
        write_label_file(&path, &labels)?;
        Ok(labels.len())
    }

    fn detect_file(&mut self, image: &Path) -> Result<Vec<Detection>, DetectError> {
        let decode_error = |reason: String| DetectError::Decode {
            path: image.to_path_buf(),
            reason,
        };
        let decoded = ImageReader::open(image)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| decode_error(e.to_string()))?
            .decode()
            .map_err(|e| decode_error(e.to_string()))?;
        let resized = decoded.resize_exact(
            self.settings.input_width,
            self.settings.input_height,
            FilterType::CatmullRom,
        );
        drop(decoded);

        self.detector.detect(&resized, &self.settings)
    }
}
