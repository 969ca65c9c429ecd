//! Hotbar slot occupancy check.

use super::frame::Frame;

/// Hotbar width as a fraction of the frame width (vanilla GUI scale).
const HOTBAR_WIDTH_RATIO: f64 = 0.337;
/// Gap between hotbar bottom and frame bottom, fraction of height.
const HOTBAR_BOTTOM_RATIO: f64 = 0.02;
const SAMPLE_HALF: i32 = 4;
const SAMPLE_STEP: usize = 2;

const EMPTY_MAX_VARIANCE: u32 = 15;
const EMPTY_MAX_BRIGHTNESS: u32 = 300;

#[derive(Debug, Clone, Default)]
pub struct ToolDetector;

impl ToolDetector {
    pub fn new() -> Self {
        Self
    }

    /// Screen position of the centre of hotbar slot `slot` (1..=9).
    pub fn slot_center(width: u32, height: u32, slot: u8) -> (i32, i32) {
        let w = width as f64;
        let hotbar_w = (w * HOTBAR_WIDTH_RATIO) as i32;
        let slot_w = (w * HOTBAR_WIDTH_RATIO / 9.0) as i32;
        let left = (width as i32 - hotbar_w) / 2;
        let bottom = height as i32 - (height as f64 * HOTBAR_BOTTOM_RATIO) as i32;
        let x = left + (slot as i32 - 1) * slot_w + slot_w / 2;
        let y = bottom - slot_w / 2;
        (x, y)
    }

    /// Whether the slot looks occupied.
    ///
    /// An empty slot is a flat dark grey: low neighbour-to-neighbour colour
    /// change and low brightness. When in doubt (bad frame, bad slot, nothing
    /// sampled) this reports present so a run is never aborted on noise.
    pub fn is_tool_present(&self, frame: &Frame, slot: u8) -> bool {
        if !frame.is_valid() || !(1..=9).contains(&slot) {
            return true;
        }
        let (sx, sy) = Self::slot_center(frame.width(), frame.height(), slot);

        let mut brightness = 0u32;
        let mut variance = 0u32;
        let mut count = 0u32;
        let mut prev = None;

        for dy in (-SAMPLE_HALF..=SAMPLE_HALF).step_by(SAMPLE_STEP) {
            for dx in (-SAMPLE_HALF..=SAMPLE_HALF).step_by(SAMPLE_STEP) {
                let (x, y) = (sx + dx, sy + dy);
                if !frame.contains(x, y) {
                    continue;
                }
                let px = frame.pixel(x, y);
                brightness += px.brightness();
                count += 1;
                if let Some(p) = prev {
                    variance += channel_delta(p, px);
                }
                prev = Some(px);
            }
        }

        if count == 0 {
            return true;
        }
        let avg_brightness = brightness / count;
        let avg_variance = variance / (count - 1).max(1);
        let looks_empty = avg_variance < EMPTY_MAX_VARIANCE && avg_brightness < EMPTY_MAX_BRIGHTNESS;
        !looks_empty
    }
}

fn channel_delta(a: crate::types::Rgb, b: crate::types::Rgb) -> u32 {
    a.r.abs_diff(b.r) as u32 + a.g.abs_diff(b.g) as u32 + a.b.abs_diff(b.b) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rgb;

    #[test]
    fn test_slot_geometry_1080p() {
        // hotbar 647 px, slot 71 px, left 636, bottom 1059
        assert_eq!(ToolDetector::slot_center(1920, 1080, 1), (671, 1024));
        assert_eq!(ToolDetector::slot_center(1920, 1080, 9), (671 + 8 * 71, 1024));
    }

    #[test]
    fn test_empty_grey_slot() {
        let frame = Frame::solid(1920, 1080, Rgb::new(60, 60, 60));
        assert!(!ToolDetector::new().is_tool_present(&frame, 1));
    }

    #[test]
    fn test_bright_flat_slot_is_present() {
        let frame = Frame::solid(1920, 1080, Rgb::new(120, 120, 120));
        assert!(ToolDetector::new().is_tool_present(&frame, 1));
    }

    #[test]
    fn test_textured_dark_slot_is_present() {
        // Checkerboard of dark colours: low brightness, high variance.
        let frame = Frame::from_rgb_rows(1920, 1080, |x, y| {
            if (x / 2 + y / 2) % 2 == 0 {
                Rgb::new(10, 10, 10)
            } else {
                Rgb::new(90, 40, 10)
            }
        });
        assert!(ToolDetector::new().is_tool_present(&frame, 3));
    }

    #[test]
    fn test_doubt_reports_present() {
        let det = ToolDetector::new();
        let dark = Frame::solid(100, 100, Rgb::BLACK);
        assert!(det.is_tool_present(&dark, 0));
        assert!(det.is_tool_present(&dark, 10));
        assert!(det.is_tool_present(&Frame::from_bgra_bottom_up(Vec::new(), 0, 0), 1));
    }
}
