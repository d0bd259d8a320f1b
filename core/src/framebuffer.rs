//! Frame buffer handed to the renderer each frame
//!
//! Packed 4 bytes per pixel (0xXXRRGGBB stored little-endian), rows top-down,
//! `pitch` bytes between the starts of consecutive rows.

use hotloop_shared::BYTES_PER_PIXEL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    pitch: u32,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let pitch = width * BYTES_PER_PIXEL;
        Self {
            pixels: vec![0; pitch as usize * height as usize],
            width,
            height,
            pitch,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        BYTES_PER_PIXEL
    }

    pub fn bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.pitch as usize + (x * BYTES_PER_PIXEL) as usize)
    }

    /// Write one pixel. Out-of-bounds writes are dropped and return false.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: u32) -> bool {
        match self.offset(x, y) {
            Some(at) => {
                self.pixels[at..at + 4].copy_from_slice(&color.to_le_bytes());
                true
            }
            None => false,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        let at = self.offset(x, y)?;
        let bytes: [u8; 4] = self.pixels[at..at + 4].try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    /// Replace row `y` with `row`, which must be exactly one pitch long.
    pub fn write_row(&mut self, y: u32, row: &[u8]) -> bool {
        if y >= self.height || row.len() != self.pitch as usize {
            return false;
        }
        let start = y as usize * self.pitch as usize;
        self.pixels[start..start + row.len()].copy_from_slice(row);
        true
    }

    pub fn clear(&mut self, color: u32) {
        for pixel in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL as usize) {
            pixel.copy_from_slice(&color.to_le_bytes());
        }
    }
}
