//! Floating name-label detection.
//!
//! Name labels render as bright white text over a translucent dark plate.
//! We look for a horizontal run of bright pixels with dark pixels directly
//! above and below it.

use super::frame::Frame;

const BRIGHT_THRESHOLD: u8 = 220;
const DARK_THRESHOLD: u8 = 80;
const MIN_RUN: u32 = 12;
const MIN_DARK_SURROUND: u32 = 3;
const ROW_STRIDE: usize = 3;

const MARGIN_X: i32 = 40;
const MARGIN_TOP: i32 = 30;
const CENTER_EXCLUDE: i32 = 60;
/// Lower band stops here (fraction of height) to stay clear of the hotbar.
const LOWER_BAND_END: f64 = 0.65;

#[derive(Debug, Clone, Default)]
pub struct PlayerDetector;

impl PlayerDetector {
    pub fn new() -> Self {
        Self
    }

    /// True if a name label is likely visible anywhere outside the reticle box.
    pub fn detect(&self, frame: &Frame) -> bool {
        if !frame.is_valid() {
            return false;
        }
        let (cx, cy) = frame.center();

        let upper = MARGIN_TOP..(cy - CENTER_EXCLUDE);
        let lower_end = (frame.height() as f64 * LOWER_BAND_END) as i32;
        let lower = (cy + CENTER_EXCLUDE)..lower_end;

        upper
            .step_by(ROW_STRIDE)
            .chain(lower.step_by(ROW_STRIDE))
            .any(|y| self.scan_row(frame, y, cx, cy))
    }

    fn scan_row(&self, frame: &Frame, y: i32, cx: i32, cy: i32) -> bool {
        let in_center_rows = y > cy - CENTER_EXCLUDE && y < cy + CENTER_EXCLUDE;
        let mut run = 0u32;
        for x in MARGIN_X..(frame.width() as i32 - MARGIN_X) {
            if in_center_rows && x > cx - CENTER_EXCLUDE && x < cx + CENTER_EXCLUDE {
                run = 0;
                continue;
            }
            if frame.pixel(x, y).all_at_least(BRIGHT_THRESHOLD) {
                run += 1;
                if run >= MIN_RUN && has_dark_surround(frame, x - (MIN_RUN / 2) as i32, y) {
                    return true;
                }
            } else {
                run = 0;
            }
        }
        false
    }
}

/// At least 3 of the 3 pixels above plus 3 below must be dark.
fn has_dark_surround(frame: &Frame, x: i32, y: i32) -> bool {
    let dark = (-3..=-1)
        .chain(1..=3)
        .map(|dy| y + dy)
        .filter(|&py| py >= 0 && py < frame.height() as i32)
        .filter(|&py| frame.pixel(x, py).all_below(DARK_THRESHOLD))
        .count() as u32;
    dark >= MIN_DARK_SURROUND
}
