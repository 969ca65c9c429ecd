//! Colour-calibrated target material detection.

use serde::{Deserialize, Serialize};

use super::frame::Frame;
use crate::types::Rgb;

/// Default reference colour (vanilla obsidian) and per-channel tolerance.
pub const DEFAULT_REFERENCE: Rgb = Rgb::new(20, 15, 35);
pub const DEFAULT_TOLERANCE: u8 = 25;

/// Spiral scan stride in pixels.
pub const SCAN_STEP: i32 = 8;
/// Minimum matches in the 3x3 confirming neighbourhood.
const GROUP_MIN_MATCHES: u32 = 5;

/// Reference colour plus tolerance radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialProfile {
    pub reference: Rgb,
    pub tolerance: u8,
}

impl Default for MaterialProfile {
    fn default() -> Self {
        Self { reference: DEFAULT_REFERENCE, tolerance: DEFAULT_TOLERANCE }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MaterialDetector {
    profile: MaterialProfile,
    calibrated: bool,
}

impl MaterialDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: MaterialProfile) -> Self {
        Self { profile, calibrated: true }
    }

    pub fn profile(&self) -> MaterialProfile {
        self.profile
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Average the 7x7 neighbourhood at the frame midpoint into the new
    /// reference colour. All-or-nothing: on failure the profile is untouched.
    pub fn calibrate(&mut self, frame: &Frame) -> bool {
        if !frame.is_valid() {
            return false;
        }
        let (cx, cy) = frame.center();
        let (mut r, mut g, mut b, mut count) = (0u32, 0u32, 0u32, 0u32);
        for dy in -3..=3 {
            for dx in -3..=3 {
                let (x, y) = (cx + dx, cy + dy);
                if !frame.contains(x, y) {
                    continue;
                }
                let px = frame.pixel(x, y);
                r += px.r as u32;
                g += px.g as u32;
                b += px.b as u32;
                count += 1;
            }
        }
        if count == 0 {
            return false;
        }
        self.profile.reference = Rgb::new((r / count) as u8, (g / count) as u8, (b / count) as u8);
        self.calibrated = true;
        true
    }

    /// Per-channel box distance against the reference.
    pub fn is_match(&self, r: u8, g: u8, b: u8) -> bool {
        let reference = self.profile.reference;
        let tol = self.profile.tolerance;
        r.abs_diff(reference.r) <= tol && g.abs_diff(reference.g) <= tol && b.abs_diff(reference.b) <= tol
    }

    fn matches_pixel(&self, px: Rgb) -> bool {
        self.is_match(px.r, px.g, px.b)
    }

    /// True if at least half of the 5x5 window around the midpoint matches.
    /// The exact centre pixel belongs to the reticle and is skipped.
    pub fn check_crosshair(&self, frame: &Frame) -> bool {
        if !frame.is_valid() {
            return false;
        }
        let (cx, cy) = frame.center();
        let (mut matches, mut total) = (0u32, 0u32);
        for dy in -2..=2 {
            for dx in -2..=2 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (x, y) = (cx + dx, cy + dy);
                if !frame.contains(x, y) {
                    continue;
                }
                total += 1;
                if self.matches_pixel(frame.pixel(x, y)) {
                    matches += 1;
                }
            }
        }
        total > 0 && matches >= total / 2
    }

    /// Square spiral outward from the midpoint in [`SCAN_STEP`] increments.
    ///
    /// Each ring is walked top edge (left to right), right edge (top to
    /// bottom), bottom edge (right to left), left edge (bottom to top). The
    /// first confirmed candidate is returned as an offset from the centre.
    pub fn scan_for_nearest_match(&self, frame: &Frame, max_radius: i32) -> Option<(i32, i32)> {
        if !frame.is_valid() {
            return None;
        }
        let (cx, cy) = frame.center();
        let mut radius = SCAN_STEP;
        while radius <= max_radius {
            let offsets: Vec<i32> = (-radius..=radius).step_by(SCAN_STEP as usize).collect();
            for &dx in &offsets {
                if self.check_group(frame, cx + dx, cy - radius) {
                    return Some((dx, -radius));
                }
            }
            for &dy in &offsets {
                if self.check_group(frame, cx + radius, cy + dy) {
                    return Some((radius, dy));
                }
            }
            for &dx in offsets.iter().rev() {
                if self.check_group(frame, cx + dx, cy + radius) {
                    return Some((dx, radius));
                }
            }
            for &dy in offsets.iter().rev() {
                if self.check_group(frame, cx - radius, cy + dy) {
                    return Some((-radius, dy));
                }
            }
            radius += SCAN_STEP;
        }
        None
    }

    /// 3x3 confirmation around a candidate, rejecting isolated noise.
    fn check_group(&self, frame: &Frame, x: i32, y: i32) -> bool {
        let (w, h) = (frame.width() as i32, frame.height() as i32);
        if x < 2 || x >= w - 2 || y < 2 || y >= h - 2 {
            return false;
        }
        let mut matches = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if self.matches_pixel(frame.pixel(x + dx, y + dy)) {
                    matches += 1;
                }
            }
        }
        matches >= GROUP_MIN_MATCHES
    }
}
