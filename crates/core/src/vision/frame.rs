use crate::types::Rgb;

/// One captured snapshot of a window's client area.
///
/// Pixels are BGRA, 4 bytes each, stored **bottom-up**: buffer row 0 is the
/// bottom row of the image, as GDI hands back a DIB with positive height.
/// [`Frame::pixel`] takes top-left-origin screen coordinates and does the
/// flip. A frame is never mutated after construction.
#[derive(Debug, Clone)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Wrap a bottom-up BGRA buffer as produced by the capture backend.
    pub fn from_bgra_bottom_up(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self { data, width, height }
    }

    /// Build a frame from top-down pixels (row 0 = top), normalizing to the
    /// bottom-up storage order.
    pub fn from_rgb_rows(width: u32, height: u32, mut pixel: impl FnMut(u32, u32) -> Rgb) -> Self {
        let mut data = vec![0u8; width as usize * height as usize * 4];
        for y in 0..height {
            let row = (height - 1 - y) as usize;
            for x in 0..width {
                let c = pixel(x, y);
                let idx = (row * width as usize + x as usize) * 4;
                data[idx] = c.b;
                data[idx + 1] = c.g;
                data[idx + 2] = c.r;
                data[idx + 3] = 255;
            }
        }
        Self { data, width, height }
    }

    /// A frame of a single flat colour.
    pub fn solid(width: u32, height: u32, color: Rgb) -> Self {
        Self::from_rgb_rows(width, height, |_, _| color)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frame midpoint, the crosshair position.
    pub fn center(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() >= self.width as usize * self.height as usize * 4
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Colour at screen coordinates (0,0 = top-left). Black when out of range.
    pub fn pixel(&self, x: i32, y: i32) -> Rgb {
        if !self.contains(x, y) {
            return Rgb::BLACK;
        }
        let flipped_y = self.height as usize - 1 - y as usize;
        let idx = (flipped_y * self.width as usize + x as usize) * 4;
        match self.data.get(idx..idx + 3) {
            Some(px) => Rgb::new(px[2], px[1], px[0]),
            None => Rgb::BLACK,
        }
    }
}
