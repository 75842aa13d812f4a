use crate::feed::script::{FrameAction, ScanScript};
use crate::pipeline::config::ScannerConfig;
use scancore::external::frame::{FrameHandle, FramePacket, FrameSource};
use scancore::external::DecodeOracle;
use scancore::prelude::{CodeFormat, CodePayload, DetectedCode, ScanError, ScanResult};
use scancore::telemetry::log::LogManager;
use std::collections::HashSet;

/// In-process stand-in for the camera: emits a fixed number of frames with
/// the configured geometry and tracks handle release for leak accounting.
pub struct SyntheticFeed {
    image_width: u32,
    image_height: u32,
    rotation_degrees: i32,
    total: u64,
    next: u64,
    outstanding: HashSet<u64>,
    released: usize,
    logger: LogManager,
}

impl SyntheticFeed {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            image_width: config.image_width,
            image_height: config.image_height,
            rotation_degrees: config.rotation_degrees,
            total: config.frames as u64,
            next: 0,
            outstanding: HashSet::new(),
            released: 0,
            logger: LogManager::new(),
        }
    }

    /// Handles delivered but not yet released; non-zero after a run means a
    /// leak in the consumer.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    pub fn released(&self) -> usize {
        self.released
    }
}

impl FrameSource for SyntheticFeed {
    fn poll_frame(&mut self) -> Option<FramePacket> {
        if self.next >= self.total {
            return None;
        }
        let handle = FrameHandle(self.next);
        self.outstanding.insert(self.next);
        self.next += 1;
        Some(FramePacket {
            image_width: self.image_width,
            image_height: self.image_height,
            rotation_degrees: self.rotation_degrees,
            handle,
        })
    }

    fn release(&mut self, handle: FrameHandle) {
        if self.outstanding.remove(&handle.0) {
            self.released += 1;
        } else {
            self.logger
                .alert(&format!("double release of frame handle {}", handle.0));
        }
    }
}

/// Decode oracle answering from a prepared script, keyed by frame handle.
pub struct ScriptedDecoder {
    script: ScanScript,
    fixed: Option<DetectedCode>,
}

impl ScriptedDecoder {
    pub fn new(script: ScanScript) -> Self {
        Self {
            script,
            fixed: None,
        }
    }

    /// Reports the same detection for every frame, whatever the handle.
    pub fn fixed(code: DetectedCode) -> Self {
        Self {
            script: ScanScript::from_actions(Vec::new()),
            fixed: Some(code),
        }
    }
}

impl DecodeOracle for ScriptedDecoder {
    fn decode(&self, handle: FrameHandle) -> ScanResult<Vec<DetectedCode>> {
        if let Some(code) = &self.fixed {
            return Ok(vec![code.clone()]);
        }
        match self.script.action(handle.0) {
            None | Some(FrameAction::NoCode) => Ok(Vec::new()),
            Some(FrameAction::DecodeError) => {
                Err(ScanError::DecodeFailure("scripted decoder fault".to_string()))
            }
            Some(FrameAction::DecodeCancelled) => Err(ScanError::DecodeCancelled),
            Some(FrameAction::Code(bounds)) => Ok(vec![DetectedCode {
                payload: CodePayload {
                    format: CodeFormat::Ean13,
                    text: "4006381333931".to_string(),
                },
                bounds: *bounds,
            }]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scancore::geometry::rect::RectF;

    #[test]
    fn feed_delivers_the_configured_number_of_frames() {
        let config = ScannerConfig {
            frames: 5,
            ..Default::default()
        };
        let mut feed = SyntheticFeed::new(&config);
        let mut delivered = 0;
        while let Some(packet) = feed.poll_frame() {
            delivered += 1;
            feed.release(packet.handle);
        }
        assert_eq!(delivered, 5);
        assert_eq!(feed.outstanding(), 0);
        assert_eq!(feed.released(), 5);
    }

    #[test]
    fn unreleased_handles_are_reported_as_outstanding() {
        let config = ScannerConfig {
            frames: 3,
            ..Default::default()
        };
        let mut feed = SyntheticFeed::new(&config);
        let first = feed.poll_frame().unwrap();
        let _second = feed.poll_frame().unwrap();
        feed.release(first.handle);
        assert_eq!(feed.outstanding(), 1);
    }

    #[test]
    fn double_release_is_counted_once() {
        let config = ScannerConfig {
            frames: 1,
            ..Default::default()
        };
        let mut feed = SyntheticFeed::new(&config);
        let packet = feed.poll_frame().unwrap();
        feed.release(packet.handle);
        feed.release(packet.handle);
        assert_eq!(feed.released(), 1);
    }

    #[test]
    fn scripted_decoder_follows_the_script() {
        let script = ScanScript::from_actions(vec![
            FrameAction::NoCode,
            FrameAction::Code(RectF::new(0.0, 0.0, 10.0, 10.0)),
            FrameAction::DecodeError,
            FrameAction::DecodeCancelled,
        ]);
        let decoder = ScriptedDecoder::new(script);

        assert!(decoder.decode(FrameHandle(0)).unwrap().is_empty());
        assert_eq!(decoder.decode(FrameHandle(1)).unwrap().len(), 1);
        assert!(matches!(
            decoder.decode(FrameHandle(2)),
            Err(ScanError::DecodeFailure(_))
        ));
        assert!(matches!(
            decoder.decode(FrameHandle(3)),
            Err(ScanError::DecodeCancelled)
        ));
        // Past the end of the script counts as an empty frame.
        assert!(decoder.decode(FrameHandle(9)).unwrap().is_empty());
    }
}
