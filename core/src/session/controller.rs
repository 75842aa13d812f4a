use crate::boundary::classifier::ScanVerdict;
use crate::external::fetch::ProductInfo;
use crate::prelude::{ScanResult, TransformedCode};
use crate::session::events::{
    LifecycleEvent, ResultPanelState, SideEffect, INSTRUCTION_ERROR, INSTRUCTION_LOADING,
    INSTRUCTION_POINT_CAMERA,
};
use crate::telemetry::log::LogManager;
use serde::{Deserialize, Serialize};

/// Phase of the scan session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    Tracking,
    Committed,
    CommittedError,
}

/// Result of folding a verdict or an external event into the session.
#[derive(Debug, Default)]
pub struct SessionTransition {
    pub event: Option<LifecycleEvent>,
    pub effects: Vec<SideEffect>,
}

impl SessionTransition {
    fn none() -> Self {
        Self::default()
    }
}

/// Top-level state machine consuming per-frame verdicts and producing the
/// scan lifecycle. Commit fires at most once per physical scan; dismissal
/// is the only way back to `Idle`. Each fold must be called by a single
/// logical owner (the runner serializes calls through a mutex).
pub struct SessionController {
    phase: SessionPhase,
    active: Option<TransformedCode>,
    panel: ResultPanelState,
    instruction: &'static str,
    frozen: bool,
    logger: LogManager,
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            active: None,
            panel: ResultPanelState::Hidden,
            instruction: INSTRUCTION_POINT_CAMERA,
            frozen: false,
            logger: LogManager::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn panel(&self) -> &ResultPanelState {
        &self.panel
    }

    pub fn instruction(&self) -> &'static str {
        self.instruction
    }

    pub fn active_code(&self) -> Option<&TransformedCode> {
        self.active.as_ref()
    }

    /// While a result is being surfaced, frame analysis short-circuits
    /// before decode and any stray verdicts are discarded.
    pub fn suppressed(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Committed | SessionPhase::CommittedError
        )
    }

    pub fn fold_verdict(&mut self, verdict: ScanVerdict) -> SessionTransition {
        if self.suppressed() {
            return SessionTransition::none();
        }

        self.instruction = verdict.instruction();
        match verdict {
            ScanVerdict::Outside => {
                self.phase = SessionPhase::Idle;
                self.active = None;
                SessionTransition {
                    event: Some(LifecycleEvent::Idle {
                        instruction: self.instruction,
                    }),
                    effects: Vec::new(),
                }
            }
            ScanVerdict::Overlapping(code) | ScanVerdict::Inside(code) => {
                self.phase = SessionPhase::Tracking;
                self.active = Some(code);
                SessionTransition {
                    event: Some(LifecycleEvent::Tracking {
                        instruction: self.instruction,
                    }),
                    effects: Vec::new(),
                }
            }
            ScanVerdict::PerfectMatch(code) => self.commit(code),
        }
    }

    fn commit(&mut self, code: TransformedCode) -> SessionTransition {
        self.phase = SessionPhase::Committed;
        self.active = Some(code.clone());
        self.panel = ResultPanelState::Loading { code: code.clone() };
        self.instruction = INSTRUCTION_LOADING;
        self.logger
            .record(&format!("committing scan result {}", code.payload.text));

        let mut effects = Vec::new();
        if !self.frozen {
            self.frozen = true;
            effects.push(SideEffect::FreezeCamera);
        }
        effects.push(SideEffect::BeginFetch(code.payload.clone()));

        SessionTransition {
            event: Some(LifecycleEvent::Committed(code)),
            effects,
        }
    }

    /// Outcome of the fetch collaborator for the committed code. A result
    /// arriving after dismissal is stale and ignored.
    pub fn complete_fetch(&mut self, result: ScanResult<ProductInfo>) -> SessionTransition {
        if self.phase != SessionPhase::Committed {
            return SessionTransition::none();
        }
        let Some(code) = self.active.clone() else {
            return SessionTransition::none();
        };

        match result {
            Ok(info) => {
                self.panel = ResultPanelState::Expanded { code, info };
                SessionTransition::none()
            }
            Err(err) => {
                self.logger.alert(&format!("result fetch failed: {err}"));
                self.phase = SessionPhase::CommittedError;
                self.panel = ResultPanelState::Error;
                self.instruction = INSTRUCTION_ERROR;
                SessionTransition {
                    event: Some(LifecycleEvent::CommittedError),
                    effects: Vec::new(),
                }
            }
        }
    }

    /// User dismissed the result surface. A no-op outside the committed
    /// phases, so a second dismissal never resumes the camera twice.
    pub fn dismiss(&mut self) -> SessionTransition {
        if !self.suppressed() {
            return SessionTransition::none();
        }

        self.phase = SessionPhase::Idle;
        self.active = None;
        self.panel = ResultPanelState::Hidden;
        self.instruction = INSTRUCTION_POINT_CAMERA;
        self.frozen = false;
        SessionTransition {
            event: Some(LifecycleEvent::Idle {
                instruction: self.instruction,
            }),
            effects: vec![SideEffect::ResumeCamera],
        }
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}
