use crate::geometry::rect::RectF;
use crate::prelude::{ScanError, ScanResult};

/// Display rotation relative to the sensor's native orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: i32) -> ScanResult<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(ScanError::MalformedGeometry(format!(
                "unsupported rotation {other} degrees"
            ))),
        }
    }

    /// At 90 and 270 degrees the sensor's width maps to the display's height.
    pub fn swaps_axes(&self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Affine map from decoder image space to screen space for one frame.
///
/// Scale factors are anisotropic, computed per axis against the rotated
/// image dimensions; no letterboxing correction is applied. Parameters are
/// supplied by the caller each frame, so a transform never outlives the
/// dimensions it was computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    rotation: Rotation,
    image_width: f32,
    image_height: f32,
    scale_x: f32,
    scale_y: f32,
    offset_x: f32,
    offset_y: f32,
}

impl FrameTransform {
    pub fn compute(
        image_width: u32,
        image_height: u32,
        rotation_degrees: i32,
        viewport: &RectF,
    ) -> ScanResult<Self> {
        if image_width == 0 || image_height == 0 {
            return Err(ScanError::MalformedGeometry(format!(
                "image dimensions {image_width}x{image_height}"
            )));
        }
        if viewport.is_degenerate() {
            return Err(ScanError::MalformedGeometry(
                "viewport not ready".to_string(),
            ));
        }

        let rotation = Rotation::from_degrees(rotation_degrees)?;
        let (rotated_width, rotated_height) = if rotation.swaps_axes() {
            (image_height as f32, image_width as f32)
        } else {
            (image_width as f32, image_height as f32)
        };

        Ok(Self {
            rotation,
            image_width: image_width as f32,
            image_height: image_height as f32,
            scale_x: viewport.width() / rotated_width,
            scale_y: viewport.height() / rotated_height,
            offset_x: viewport.left,
            offset_y: viewport.top,
        })
    }

    /// Maps all four corners independently and reduces to the axis-aligned
    /// bounding rectangle, since rotation may flip left/right or top/bottom.
    pub fn apply(&self, rect: &RectF) -> RectF {
        let corners = [
            self.map_point(rect.left, rect.top),
            self.map_point(rect.right, rect.top),
            self.map_point(rect.right, rect.bottom),
            self.map_point(rect.left, rect.bottom),
        ];

        let mut mapped = RectF::new(corners[0].0, corners[0].1, corners[0].0, corners[0].1);
        for (x, y) in corners {
            mapped.left = mapped.left.min(x);
            mapped.top = mapped.top.min(y);
            mapped.right = mapped.right.max(x);
            mapped.bottom = mapped.bottom.max(y);
        }
        mapped
    }

    // Clockwise sensor-to-display rotation, then per-axis scale and the
    // viewport origin offset.
    fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        let (rx, ry) = match self.rotation {
            Rotation::Deg0 => (x, y),
            Rotation::Deg90 => (self.image_height - y, x),
            Rotation::Deg180 => (self.image_width - x, self.image_height - y),
            Rotation::Deg270 => (y, self.image_width - x),
        };
        (
            rx * self.scale_x + self.offset_x,
            ry * self.scale_y + self.offset_y,
        )
    }
}
