use crate::geometry::rect::RectF;
use crate::telemetry::log::LogManager;
use std::sync::RwLock;

/// Tear-free copy of the two reference rectangles.
///
/// The pair may mix layout generations (a fresh viewport with the previous
/// scanning window); that is ordinary behavior while a layout pass is in
/// flight, not a race.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundarySnapshot {
    pub viewport: RectF,
    pub window: RectF,
}

impl BoundarySnapshot {
    /// Classification is meaningful only once both rectangles have arrived.
    pub fn is_ready(&self) -> bool {
        !self.viewport.is_degenerate() && !self.window.is_degenerate()
    }
}

/// Holds the most recently reported camera viewport and scanning window,
/// both in screen space. Setters arrive from the layout pass and race with
/// frame analysis; last writer wins.
pub struct BoundaryState {
    inner: RwLock<BoundarySnapshot>,
    logger: LogManager,
}

impl BoundaryState {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BoundarySnapshot::default()),
            logger: LogManager::new(),
        }
    }

    pub fn set_viewport(&self, rect: RectF) {
        if rect.width() < 0.0 || rect.height() < 0.0 {
            self.logger.alert("ignoring viewport with negative dimensions");
            return;
        }
        if let Ok(mut snapshot) = self.inner.write() {
            snapshot.viewport = rect;
        }
    }

    pub fn set_scanning_window(&self, rect: RectF) {
        if rect.width() < 0.0 || rect.height() < 0.0 {
            self.logger
                .alert("ignoring scanning window with negative dimensions");
            return;
        }
        if let Ok(mut snapshot) = self.inner.write() {
            snapshot.window = rect;
        }
    }

    pub fn snapshot(&self) -> BoundarySnapshot {
        self.inner
            .read()
            .map(|snapshot| *snapshot)
            .unwrap_or_default()
    }
}

impl Default for BoundaryState {
    fn default() -> Self {
        Self::new()
    }
}
