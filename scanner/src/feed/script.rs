use crate::pipeline::config::ScannerConfig;
use rand::{rngs::StdRng, Rng, SeedableRng};
use scancore::geometry::rect::RectF;

/// What the scripted decoder reports for one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameAction {
    NoCode,
    /// A detected code with bounds in decoder image space.
    Code(RectF),
    DecodeError,
    DecodeCancelled,
}

/// Frame-by-frame decode outcomes for a synthetic scan session.
#[derive(Debug, Clone)]
pub struct ScanScript {
    actions: Vec<FrameAction>,
}

impl ScanScript {
    pub fn from_actions(actions: Vec<FrameAction>) -> Self {
        Self { actions }
    }

    pub fn action(&self, frame_index: u64) -> Option<&FrameAction> {
        self.actions.get(frame_index as usize)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Builds the canonical approach scenario: empty frames, then a code seen
/// outside the scanning window, sliding into overlap, sitting small inside,
/// and finally filling the window far enough to commit. One decode fault is
/// planted early to exercise the downgrade path.
pub fn approach_script(config: &ScannerConfig) -> ScanScript {
    let frames = config.frames.max(8);
    let window = config.window();
    let viewport = config.viewport;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let fault_frame = frames / 6;

    let mut actions = Vec::with_capacity(frames);
    for index in 0..frames {
        let progress = index as f32 / (frames - 1) as f32;
        if index == fault_frame {
            actions.push(FrameAction::DecodeError);
            continue;
        }

        let screen_box = if progress < 0.2 {
            None
        } else if progress < 0.4 {
            // Fully left of the window, never intersecting it.
            Some(RectF::new(
                viewport.left + 4.0,
                window.top,
                window.left - 8.0,
                window.top + window.height() * 0.3,
            ))
        } else if progress < 0.6 {
            // Straddles the window's left edge.
            Some(RectF::new(
                window.left - 40.0,
                window.top + window.height() * 0.2,
                window.left + window.width() * 0.3,
                window.top + window.height() * 0.8,
            ))
        } else if progress < 0.8 {
            // Contained but small: fill ratio 0.16 with the default layout.
            Some(centered_box(&window, 0.4))
        } else {
            // Fill ratio 0.9025, comfortably past the acceptance threshold.
            Some(centered_box(&window, 0.95))
        };

        match screen_box {
            None => actions.push(FrameAction::NoCode),
            Some(rect) => {
                let jittered = jitter_rect(&rect, config.jitter, &mut rng);
                actions.push(FrameAction::Code(to_image_space(config, &jittered)));
            }
        }
    }

    ScanScript::from_actions(actions)
}

fn centered_box(window: &RectF, fraction: f32) -> RectF {
    let half_width = window.width() * fraction * 0.5;
    let half_height = window.height() * fraction * 0.5;
    let center_x = window.left + window.width() * 0.5;
    let center_y = window.top + window.height() * 0.5;
    RectF::new(
        center_x - half_width,
        center_y - half_height,
        center_x + half_width,
        center_y + half_height,
    )
}

fn jitter_rect(rect: &RectF, jitter: f32, rng: &mut StdRng) -> RectF {
    if jitter <= 0.0 {
        return *rect;
    }
    let mut wobble = || rng.gen_range(-jitter..=jitter);
    RectF::new(
        rect.left + wobble(),
        rect.top + wobble(),
        rect.right + wobble(),
        rect.bottom + wobble(),
    )
}

/// Inverts the frame transform: places a screen-space box back into the
/// sensor's native orientation so the pipeline will map it to where the
/// script intended.
fn to_image_space(config: &ScannerConfig, rect: &RectF) -> RectF {
    let viewport = &config.viewport;
    let image_width = config.image_width as f32;
    let image_height = config.image_height as f32;
    let rotation = config.rotation_degrees.rem_euclid(360);

    let (rotated_width, rotated_height) = if rotation == 90 || rotation == 270 {
        (image_height, image_width)
    } else {
        (image_width, image_height)
    };
    let scale_x = viewport.width() / rotated_width;
    let scale_y = viewport.height() / rotated_height;

    let map_point = |screen_x: f32, screen_y: f32| -> (f32, f32) {
        let rx = (screen_x - viewport.left) / scale_x;
        let ry = (screen_y - viewport.top) / scale_y;
        match rotation {
            90 => (ry, image_height - rx),
            180 => (image_width - rx, image_height - ry),
            270 => (image_width - ry, rx),
            _ => (rx, ry),
        }
    };

    let corners = [
        map_point(rect.left, rect.top),
        map_point(rect.right, rect.top),
        map_point(rect.right, rect.bottom),
        map_point(rect.left, rect.bottom),
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
