// RGBA staging buffer between the PPU and the pixels surface

use crate::ppu::{Ppu, PPU_HEIGHT, PPU_WIDTH};

/// Output width in pixels
pub const SCREEN_WIDTH: u32 = PPU_WIDTH as u32;
/// Output height in pixels
pub const SCREEN_HEIGHT: u32 = PPU_HEIGHT as u32;

/// RGBA frame staging buffer
///
/// Holds the expanded ABGR8888 bytes of the most recent finished frame,
/// copied out of the PPU at frame boundaries only.
pub struct FrameBuffer {
    pixels: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pixels: vec![0; PPU_WIDTH * PPU_HEIGHT * 4],
        }
    }

    /// Expand the PPU's palette-index buffer into RGBA bytes
    pub fn update_from(&mut self, ppu: &Ppu) {
        ppu.render_rgba(&mut self.pixels);
    }

    /// Raw RGBA bytes, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Copy into a pixels-surface frame of the same size
    pub fn blit(&self, frame: &mut [u8]) {
        frame.copy_from_slice(&self.pixels);
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_dimensions() {
        let fb = FrameBuffer::new();
        assert_eq!(fb.pixels().len(), 256 * 240 * 4);
    }

    #[test]
    fn test_update_from_ppu_sets_alpha() {
        let ppu = Ppu::new();
        let mut fb = FrameBuffer::new();
        fb.update_from(&ppu);
        assert!(fb.pixels().chunks_exact(4).all(|px| px[3] == 0xFF));
    }
}
