use anyhow::Context;
use scancore::boundary::classifier::{ClassifierConfig, DEFAULT_ACCEPT_FILL_RATIO};
use scancore::geometry::rect::RectF;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Driver configuration: frame geometry, boundary layout, and pacing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub image_width: u32,
    pub image_height: u32,
    pub rotation_degrees: i32,
    pub viewport: RectF,
    /// Explicit scanning window; when absent the centered default applies.
    pub scanning_window: Option<RectF>,
    pub accept_fill_ratio: f32,
    pub frames: usize,
    pub frame_interval_ms: u64,
    pub fetch_delay_ms: u64,
    pub jitter: f32,
    pub seed: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            image_width: 1080,
            image_height: 1920,
            rotation_degrees: 0,
            viewport: RectF::new(0.0, 0.0, 1080.0, 1920.0),
            scanning_window: None,
            accept_fill_ratio: DEFAULT_ACCEPT_FILL_RATIO,
            frames: 48,
            frame_interval_ms: 33,
            fetch_delay_ms: 2000,
            jitter: 0.0,
            seed: 0,
        }
    }
}

impl ScannerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scanner config {}", path_ref.display()))?;
        let config: ScannerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scanner config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(image_width: u32, image_height: u32, rotation_degrees: i32, frames: usize) -> Self {
        Self {
            image_width,
            image_height,
            rotation_degrees,
            frames,
            ..Default::default()
        }
    }

    pub fn window(&self) -> RectF {
        self.scanning_window
            .unwrap_or_else(|| default_scanning_window(&self.viewport))
    }

    pub fn to_classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            accept_fill_ratio: self.accept_fill_ratio,
        }
    }
}

/// Centered scanning window: a square of 0.8 times the smaller viewport
/// dimension, trimmed below center so barcodes sit in the upper band.
pub fn default_scanning_window(viewport: &RectF) -> RectF {
    let size = viewport.width().min(viewport.height()) * 0.8;
    let center_x = viewport.left + viewport.width() * 0.5;
    let center_y = viewport.top + viewport.height() * 0.5;
    RectF::new(
        center_x - size * 0.5,
        center_y - size * 0.5,
        center_x + size * 0.5,
        center_y + size * 0.1,
    )
}
