use crate::boundary::state::BoundarySnapshot;
use crate::prelude::TransformedCode;
use crate::session::events::{
    INSTRUCTION_LOADING, INSTRUCTION_MOVE_CLOSER, INSTRUCTION_MOVE_INTO_FRAME,
    INSTRUCTION_POINT_CAMERA,
};

/// Fraction of the scanning window the code must fill before a detection is
/// promoted to a final result. A tie at the threshold accepts.
pub const DEFAULT_ACCEPT_FILL_RATIO: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub accept_fill_ratio: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            accept_fill_ratio: DEFAULT_ACCEPT_FILL_RATIO,
        }
    }
}

/// Per-frame spatial relationship between the detected code and the
/// scanning window, with the instruction shown to the user for each case.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanVerdict {
    Outside,
    Overlapping(TransformedCode),
    Inside(TransformedCode),
    PerfectMatch(TransformedCode),
}

impl ScanVerdict {
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Outside => INSTRUCTION_POINT_CAMERA,
            Self::Overlapping(_) => INSTRUCTION_MOVE_INTO_FRAME,
            Self::Inside(_) => INSTRUCTION_MOVE_CLOSER,
            Self::PerfectMatch(_) => INSTRUCTION_LOADING,
        }
    }

    pub fn code(&self) -> Option<&TransformedCode> {
        match self {
            Self::Outside => None,
            Self::Overlapping(code) | Self::Inside(code) | Self::PerfectMatch(code) => Some(code),
        }
    }
}

/// Stateless per-frame classifier. Identical inputs always produce the same
/// verdict; commitment state lives in the session controller.
pub struct BoundaryClassifier {
    config: ClassifierConfig,
}

impl BoundaryClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ClassifierConfig::default())
    }

    pub fn classify(
        &self,
        code: Option<TransformedCode>,
        snapshot: &BoundarySnapshot,
    ) -> ScanVerdict {
        let Some(code) = code else {
            return ScanVerdict::Outside;
        };
        if !snapshot.is_ready() || code.bounds.is_degenerate() {
            return ScanVerdict::Outside;
        }

        let window = snapshot.window;
        if !window.intersects(&code.bounds) {
            return ScanVerdict::Outside;
        }
        if !window.contains(&code.bounds) {
            return ScanVerdict::Overlapping(code);
        }

        let fill_ratio = code.bounds.area() / window.area();
        if fill_ratio >= self.config.accept_fill_ratio {
            ScanVerdict::PerfectMatch(code)
        } else {
            ScanVerdict::Inside(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rect::RectF;
    use crate::prelude::{CodeFormat, CodePayload};

    fn code_at(bounds: RectF) -> TransformedCode {
        TransformedCode {
            payload: CodePayload {
                format: CodeFormat::Ean13,
                text: "4006381333931".to_string(),
            },
            bounds,
        }
    }

    fn ready_snapshot() -> BoundarySnapshot {
        BoundarySnapshot {
            viewport: RectF::new(0.0, 0.0, 1080.0, 1920.0),
            window: RectF::new(140.0, 760.0, 940.0, 1160.0),
        }
    }

    #[test]
    fn no_code_classifies_outside() {
        let classifier = BoundaryClassifier::with_defaults();
        let verdict = classifier.classify(None, &ready_snapshot());
        assert_eq!(verdict, ScanVerdict::Outside);
        assert!(verdict.code().is_none());
    }

    #[test]
    fn missing_reference_rectangles_classify_outside() {
        let classifier = BoundaryClassifier::with_defaults();
        let snapshot = BoundarySnapshot::default();
        let code = code_at(RectF::new(150.0, 770.0, 930.0, 1150.0));
        assert_eq!(
            classifier.classify(Some(code), &snapshot),
            ScanVerdict::Outside
        );
    }

    #[test]
    fn disjoint_code_classifies_outside() {
        let classifier = BoundaryClassifier::with_defaults();
        let code = code_at(RectF::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(
            classifier.classify(Some(code), &ready_snapshot()),
            ScanVerdict::Outside
        );
    }

    #[test]
    fn partially_contained_code_classifies_overlapping() {
        let classifier = BoundaryClassifier::with_defaults();
        let code = code_at(RectF::new(900.0, 1100.0, 1100.0, 1300.0));
        let verdict = classifier.classify(Some(code), &ready_snapshot());
        assert!(matches!(verdict, ScanVerdict::Overlapping(_)));
    }

    #[test]
    fn small_contained_code_classifies_inside() {
        let classifier = BoundaryClassifier::with_defaults();
        let code = code_at(RectF::new(400.0, 900.0, 600.0, 1000.0));
        let verdict = classifier.classify(Some(code), &ready_snapshot());
        assert!(matches!(verdict, ScanVerdict::Inside(_)));
        assert_eq!(verdict.instruction(), INSTRUCTION_MOVE_CLOSER);
    }

    #[test]
    fn filling_code_classifies_perfect_match() {
        // 780x380 inside an 800x400 window, fill ratio about 0.93.
        let classifier = BoundaryClassifier::with_defaults();
        let code = code_at(RectF::new(150.0, 770.0, 930.0, 1150.0));
        let verdict = classifier.classify(Some(code), &ready_snapshot());
        assert!(matches!(verdict, ScanVerdict::PerfectMatch(_)));
        assert_eq!(verdict.instruction(), INSTRUCTION_LOADING);
    }

    #[test]
    fn fill_ratio_exactly_at_threshold_accepts() {
        let classifier = BoundaryClassifier::new(ClassifierConfig {
            accept_fill_ratio: 0.81,
        });
        let snapshot = BoundarySnapshot {
            viewport: RectF::new(0.0, 0.0, 200.0, 200.0),
            window: RectF::new(0.0, 0.0, 100.0, 100.0),
        };
        // 90x90 in 100x100 is exactly 0.81.
        let verdict = classifier.classify(Some(code_at(RectF::new(5.0, 5.0, 95.0, 95.0))), &snapshot);
        assert!(matches!(verdict, ScanVerdict::PerfectMatch(_)));
    }

    #[test]
    fn fill_ratio_just_below_threshold_stays_inside() {
        let classifier = BoundaryClassifier::new(ClassifierConfig {
            accept_fill_ratio: 0.81,
        });
        let snapshot = BoundarySnapshot {
            viewport: RectF::new(0.0, 0.0, 200.0, 200.0),
            window: RectF::new(0.0, 0.0, 100.0, 100.0),
        };
        let verdict = classifier.classify(Some(code_at(RectF::new(5.0, 5.0, 94.0, 95.0))), &snapshot);
        assert!(matches!(verdict, ScanVerdict::Inside(_)));
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = BoundaryClassifier::with_defaults();
        let code = code_at(RectF::new(400.0, 900.0, 600.0, 1000.0));
        let first = classifier.classify(Some(code.clone()), &ready_snapshot());
        let second = classifier.classify(Some(code), &ready_snapshot());
        assert_eq!(first, second);
    }
}
