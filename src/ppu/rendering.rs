// PPU rendering pipeline - scanline/dot stepping
//
// Frame structure (NTSC): 262 scanlines of 341 dots. Scanlines 0-239 are
// visible, 240 idles, 241-260 are VBlank, 261 is the pre-render line. Each
// visible dot multiplexes one background pixel from the shift registers
// with the highest-priority sprite pixel latched for the line.
//
// Background fetch cadence inside dots 1-256 and 321-336:
//   dot % 8 == 1  nametable byte
//   dot % 8 == 3  attribute byte
//   dot % 8 == 5  pattern low byte
//   dot % 8 == 7  pattern high byte
//   dot % 8 == 0  reload shifters, increment coarse X
//
// Scroll copies: increment Y at dot 256, horizontal t->v at dot 257,
// vertical t->v during dots 280-304 of the pre-render line.

use crate::cartridge::Mapper;
use crate::ppu::{
    Ppu, PpuTick, SpriteSlot, CTRL_BG_TABLE, CTRL_NMI_ENABLE, CTRL_SPRITE_SIZE, CTRL_SPRITE_TABLE,
    DOTS_PER_SCANLINE, MASK_SHOW_BG, MASK_SHOW_BG_LEFT, MASK_SHOW_SPRITES,
    MASK_SHOW_SPRITES_LEFT, PPU_WIDTH, SCANLINES_PER_FRAME, STATUS_SPRITE_OVERFLOW,
    STATUS_SPRITE_ZERO_HIT, STATUS_VBLANK,
};

impl Ppu {
    /// Advance the PPU by one dot
    pub fn step(&mut self, mapper: &mut dyn Mapper) -> PpuTick {
        let mut tick = PpuTick::default();

        let visible_line = self.scanline < 240;
        let prerender_line = self.scanline == 261;
        let rendering = self.rendering_enabled();

        if prerender_line && self.dot == 1 {
            self.status &= !(STATUS_VBLANK | STATUS_SPRITE_ZERO_HIT | STATUS_SPRITE_OVERFLOW);
        }

        if (visible_line || prerender_line) && rendering {
            let fetch_dot =
                (1..=256).contains(&self.dot) || (321..=336).contains(&self.dot);

            // Pixel first, so it sees the shifters before this dot's shift
            if visible_line && (1..=256).contains(&self.dot) {
                self.render_pixel();
            }

            if fetch_dot {
                self.shift_registers();
                match self.dot % 8 {
                    1 => self.nt_latch = self.fetch_nametable_byte(mapper),
                    3 => self.at_latch = self.fetch_attribute_bits(mapper),
                    5 => self.bg_low_latch = self.fetch_pattern_byte(mapper, false),
                    7 => self.bg_high_latch = self.fetch_pattern_byte(mapper, true),
                    0 => {
                        self.reload_shifters();
                        self.increment_coarse_x();
                    }
                    _ => {}
                }
            }

            if self.dot == 256 {
                self.increment_y();
            }
            if self.dot == 257 {
                self.copy_horizontal_bits();
                if visible_line {
                    self.evaluate_sprites(mapper);
                } else {
                    // Sprites are delayed one line; none reach scanline 0
                    self.sprite_count = 0;
                }
            }
            if prerender_line && (280..=304).contains(&self.dot) {
                self.copy_vertical_bits();
            }

            if self.dot == 260 {
                tick.scanline_edge = true;
            }
        } else if visible_line && (1..=256).contains(&self.dot) {
            // Rendering disabled: the backdrop colour fills the frame, or
            // the palette entry v points at while it sits in palette space
            let index = if (0x3F00..=0x3FFF).contains(&(self.v & 0x3FFF)) {
                Self::mirror_palette(self.v)
            } else {
                0
            };
            let x = (self.dot - 1) as usize;
            self.frame_buffer[self.scanline as usize * PPU_WIDTH + x] = index as u8;
        }

        if self.scanline == 241 && self.dot == 1 {
            self.status |= STATUS_VBLANK;
            tick.frame_complete = true;
            if self.ctrl & CTRL_NMI_ENABLE != 0 {
                tick.nmi = true;
            }
        }

        self.advance_dot();
        tick
    }

    /// Move to the next dot, handling wrap and the odd-frame skip
    fn advance_dot(&mut self) {
        // Odd frames with rendering enabled drop dot 340 of the pre-render
        // line: jump from (261,339) straight to (0,0)
        if self.scanline == 261
            && self.dot == 339
            && self.odd_frame
            && self.rendering_enabled()
        {
            self.dot = 0;
            self.scanline = 0;
            self.frame += 1;
            self.odd_frame = !self.odd_frame;
            return;
        }

        self.dot += 1;
        if self.dot >= DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline >= SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.frame += 1;
                self.odd_frame = !self.odd_frame;
            }
        }
    }

    // ========================================
    // Loopy scroll arithmetic
    // ========================================

    /// Increment coarse X, wrapping into the adjacent nametable at 31
    fn increment_coarse_x(&mut self) {
        if self.v & 0x001F == 31 {
            self.v &= !0x001F;
            self.v ^= 0x0400;
        } else {
            self.v += 1;
        }
    }

    /// Increment fine Y, carrying into coarse Y; row 29 wraps the vertical
    /// nametable bit, row 31 wraps without switching
    fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
        } else {
            self.v &= !0x7000;
            let mut y = (self.v & 0x03E0) >> 5;
            if y == 29 {
                y = 0;
                self.v ^= 0x0800;
            } else if y == 31 {
                y = 0;
            } else {
                y += 1;
            }
            self.v = (self.v & !0x03E0) | (y << 5);
        }
    }

    /// Copy the horizontal bits of t into v (coarse X + nametable X)
    fn copy_horizontal_bits(&mut self) {
        self.v = (self.v & !0x041F) | (self.t & 0x041F);
    }

    /// Copy the vertical bits of t into v (fine Y, coarse Y, nametable Y)
    fn copy_vertical_bits(&mut self) {
        self.v = (self.v & !0x7BE0) | (self.t & 0x7BE0);
    }

    // ========================================
    // Background fetches and shifters
    // ========================================

    fn fetch_nametable_byte(&self, mapper: &mut dyn Mapper) -> u8 {
        self.read_memory(0x2000 | (self.v & 0x0FFF), mapper)
    }

    /// Fetch the attribute byte and extract this tile's 2-bit palette
    fn fetch_attribute_bits(&self, mapper: &mut dyn Mapper) -> u8 {
        let addr = 0x23C0
            | (self.v & 0x0C00)
            | ((self.v >> 4) & 0x38)
            | ((self.v >> 2) & 0x07);
        let byte = self.read_memory(addr, mapper);

        // Quadrant select: coarse Y bit 1 picks the nibble, coarse X bit 1
        // picks the pair
        let shift = ((self.v >> 4) & 0x04) | (self.v & 0x02);
        (byte >> shift) & 0x03
    }

    fn fetch_pattern_byte(&self, mapper: &mut dyn Mapper, high: bool) -> u8 {
        let table = if self.ctrl & CTRL_BG_TABLE != 0 {
            0x1000
        } else {
            0x0000
        };
        let fine_y = (self.v >> 12) & 0x07;
        let addr = table + ((self.nt_latch as u16) << 4) + fine_y + if high { 8 } else { 0 };
        self.read_memory(addr, mapper)
    }

    /// Move the fetched tile into the shifter low bytes and latch its
    /// attribute bits
    fn reload_shifters(&mut self) {
        self.bg_shift_lo = (self.bg_shift_lo & 0xFF00) | self.bg_low_latch as u16;
        self.bg_shift_hi = (self.bg_shift_hi & 0xFF00) | self.bg_high_latch as u16;
        self.at_latch_lo = self.at_latch & 0x01;
        self.at_latch_hi = (self.at_latch >> 1) & 0x01;
    }

    fn shift_registers(&mut self) {
        self.bg_shift_lo <<= 1;
        self.bg_shift_hi <<= 1;
        self.at_shift_lo = (self.at_shift_lo << 1) | self.at_latch_lo;
        self.at_shift_hi = (self.at_shift_hi << 1) | self.at_latch_hi;
    }

    // ========================================
    // Sprite evaluation
    // ========================================

    /// Scan OAM for sprites intersecting the next scanline and latch their
    /// pattern bytes. The ninth in-range sprite sets the overflow flag.
    fn evaluate_sprites(&mut self, mapper: &mut dyn Mapper) {
        let sprite_height: i16 = if self.ctrl & CTRL_SPRITE_SIZE != 0 {
            16
        } else {
            8
        };

        self.sprite_count = 0;
        for i in 0..64 {
            let y = self.oam[i * 4] as i16;
            let row = self.scanline as i16 - y;
            if row < 0 || row >= sprite_height {
                continue;
            }
            if self.sprite_count == 8 {
                self.status |= STATUS_SPRITE_OVERFLOW;
                break;
            }

            let tile = self.oam[i * 4 + 1];
            let attributes = self.oam[i * 4 + 2];
            let x = self.oam[i * 4 + 3];

            let (pattern_lo, pattern_hi) =
                self.fetch_sprite_pattern(mapper, tile, attributes, row, sprite_height);

            self.sprites[self.sprite_count] = SpriteSlot {
                x,
                attributes,
                pattern_lo,
                pattern_hi,
                is_sprite_zero: i == 0,
            };
            self.sprite_count += 1;
        }
    }

    /// Fetch one sprite row, honouring vertical flip and 8x16 tile pairs
    fn fetch_sprite_pattern(
        &self,
        mapper: &mut dyn Mapper,
        tile: u8,
        attributes: u8,
        row: i16,
        sprite_height: i16,
    ) -> (u8, u8) {
        let mut row = if attributes & 0x80 != 0 {
            sprite_height - 1 - row
        } else {
            row
        } as u16;

        let addr = if sprite_height == 16 {
            // Bit 0 of the tile selects the pattern table; the pair of
            // tiles stacks vertically
            let table = ((tile & 0x01) as u16) << 12;
            let mut tile = (tile & 0xFE) as u16;
            if row >= 8 {
                tile += 1;
                row -= 8;
            }
            table + (tile << 4) + row
        } else {
            let table = if self.ctrl & CTRL_SPRITE_TABLE != 0 {
                0x1000
            } else {
                0x0000
            };
            table + ((tile as u16) << 4) + row
        };

        (
            self.read_memory(addr, mapper),
            self.read_memory(addr + 8, mapper),
        )
    }

    // ========================================
    // Pixel multiplexing
    // ========================================

    /// Produce one visible pixel from the background shifters and the
    /// latched sprite row, with priority and sprite-zero detection
    fn render_pixel(&mut self) {
        let x = (self.dot - 1) as usize;

        // Background pixel from the shifters at fine-x offset
        let mut bg_pixel = 0u8;
        let mut bg_palette = 0u8;
        if self.mask & MASK_SHOW_BG != 0 && (x >= 8 || self.mask & MASK_SHOW_BG_LEFT != 0) {
            let bit = 15 - self.fine_x as u16;
            bg_pixel = (((self.bg_shift_hi >> bit) & 1) << 1) as u8
                | ((self.bg_shift_lo >> bit) & 1) as u8;
            let at_bit = 7 - self.fine_x;
            bg_palette = (((self.at_shift_hi >> at_bit) & 1) << 1) | ((self.at_shift_lo >> at_bit) & 1);
        }

        // First in-range sprite with a non-transparent pixel wins
        let mut sprite_pixel = 0u8;
        let mut sprite_palette = 0u8;
        let mut sprite_behind = false;
        let mut sprite_zero = false;
        if self.mask & MASK_SHOW_SPRITES != 0
            && (x >= 8 || self.mask & MASK_SHOW_SPRITES_LEFT != 0)
        {
            for slot in &self.sprites[..self.sprite_count] {
                let offset = x as i16 - slot.x as i16;
                if !(0..8).contains(&offset) {
                    continue;
                }
                let column = if slot.attributes & 0x40 != 0 {
                    offset as u8
                } else {
                    7 - offset as u8
                };
                let pixel = (((slot.pattern_hi >> column) & 1) << 1)
                    | ((slot.pattern_lo >> column) & 1);
                if pixel != 0 {
                    sprite_pixel = pixel;
                    sprite_palette = slot.attributes & 0x03;
                    sprite_behind = slot.attributes & 0x20 != 0;
                    sprite_zero = slot.is_sprite_zero;
                    break;
                }
            }
        }

        let palette_index = match (bg_pixel, sprite_pixel) {
            (0, 0) => 0,
            (0, _) => 0x10 | (sprite_palette << 2) | sprite_pixel,
            (_, 0) => (bg_palette << 2) | bg_pixel,
            _ => {
                // Both opaque: sprite zero hit latches for the frame
                if sprite_zero && x < 255 {
                    self.status |= STATUS_SPRITE_ZERO_HIT;
                }
                if sprite_behind {
                    (bg_palette << 2) | bg_pixel
                } else {
                    0x10 | (sprite_palette << 2) | sprite_pixel
                }
            }
        };

        self.frame_buffer[self.scanline as usize * PPU_WIDTH + x] =
            Self::mirror_palette(palette_index as u16) as u8;
    }
}
