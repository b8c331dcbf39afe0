//! YOLO label lines.

use crate::error::LabelError;
use std::fmt;
use std::str::FromStr;

/// Class of an annotation.
///
/// Model predictions that nobody has confirmed yet carry their confidence
/// and are written as `<class_id>::<confidence>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassTag {
    /// A confirmed class id
    Id(u32),
    /// An unconfirmed model prediction
    Predicted { class_id: u32, confidence: f32 },
}

impl ClassTag {
    pub fn class_id(&self) -> u32 {
        match *self {
            ClassTag::Id(id) => id,
            ClassTag::Predicted { class_id, .. } => class_id,
        }
    }

    pub fn confidence(&self) -> Option<f32> {
        match *self {
            ClassTag::Id(_) => None,
            ClassTag::Predicted { confidence, .. } => Some(confidence),
        }
    }

    pub fn is_predicted(&self) -> bool {
        matches!(self, ClassTag::Predicted { .. })
    }

    /// Accept a prediction, dropping its confidence
    pub fn confirm(self) -> Self {
        ClassTag::Id(self.class_id())
    }
}

/// Confidence as written in a tag: at most four characters, `0.87` style
fn confidence_text(confidence: f32) -> String {
    let mut text = if confidence.fract() == 0.0 {
        format!("{confidence:.1}")
    } else {
        confidence.to_string()
    };
    text.truncate(4);
    text
}

impl fmt::Display for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ClassTag::Id(id) => write!(f, "{id}"),
            ClassTag::Predicted {
                class_id,
                confidence,
            } => write!(f, "{class_id}::{}", confidence_text(confidence)),
        }
    }
}

impl FromStr for ClassTag {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| LabelError::InvalidLine {
            line: s.to_string(),
            reason: reason.to_string(),
        };

        match s.split_once("::") {
            Some((id, confidence)) => Ok(ClassTag::Predicted {
                class_id: id.parse().map_err(|_| invalid("class id is not an integer"))?,
                confidence: confidence
                    .parse()
                    .map_err(|_| invalid("confidence is not a number"))?,
            }),
            None => s
                .parse()
                .map(ClassTag::Id)
                .map_err(|_| invalid("class id is not an integer")),
        }
    }
}

/// One bounding box: `<class> <x_center> <y_center> <width> <height>`.
///
/// Geometry is relative to the image size, so a well-formed label has all
/// four values in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloLabel {
    pub class: ClassTag,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl YoloLabel {
    pub fn new(class: ClassTag, x_center: f64, y_center: f64, width: f64, height: f64) -> Self {
        Self {
            class,
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Normalize a box drawn between two pixel corners, given in any order.
    ///
    /// Returns `None` for a zero-sized image.
    pub fn from_pixel_corners(
        class: ClassTag,
        (x1, y1): (f64, f64),
        (x2, y2): (f64, f64),
        image_width: u32,
        image_height: u32,
    ) -> Option<Self> {
        if image_width == 0 || image_height == 0 {
            return None;
        }
        let (w, h) = (f64::from(image_width), f64::from(image_height));
        let (left, right) = (x1.min(x2), x1.max(x2));
        let (top, bottom) = (y1.min(y2), y1.max(y2));

        Some(Self::new(
            class,
            (left + right) / 2.0 / w,
            (top + bottom) / 2.0 / h,
            (right - left) / w,
            (bottom - top) / h,
        ))
    }

    /// Pixel rectangle `(left, top, right, bottom)` on an image of the given size
    pub fn to_pixel_rect(&self, image_width: u32, image_height: u32) -> (f64, f64, f64, f64) {
        let (w, h) = (f64::from(image_width), f64::from(image_height));
        let half_w = self.width * w / 2.0;
        let half_h = self.height * h / 2.0;
        let (cx, cy) = (self.x_center * w, self.y_center * h);
        (cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    /// Whether all geometry lies in 0..=1
    pub fn is_normalized(&self) -> bool {
        [self.x_center, self.y_center, self.width, self.height]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

impl fmt::Display for YoloLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.class, self.x_center, self.y_center, self.width, self.height
        )
    }
}

impl FromStr for YoloLabel {
    type Err = LabelError;

    /// Parse one line. Fields past the fifth are ignored.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| LabelError::InvalidLine {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(invalid("expected 5 fields"));
        }

        let class = fields[0].parse::<ClassTag>()?;
        let mut geometry = [0.0f64; 4];
        for (value, field) in geometry.iter_mut().zip(&fields[1..5]) {
            *value = field.parse().map_err(|_| invalid("geometry is not a number"))?;
        }
        let [x_center, y_center, width, height] = geometry;

        Ok(Self::new(class, x_center, y_center, width, height))
    }
}
