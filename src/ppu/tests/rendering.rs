// Pixel pipeline: background output, sprites, sprite-zero hit, backdrop

use super::{ppu_with_mapper, step_to};
use crate::cartridge::Mapper;
use crate::ppu::{
    Ppu, MASK_SHOW_BG, MASK_SHOW_BG_LEFT, MASK_SHOW_SPRITES, MASK_SHOW_SPRITES_LEFT, PPU_WIDTH,
    STATUS_SPRITE_OVERFLOW, STATUS_SPRITE_ZERO_HIT,
};

/// Fill CHR-RAM tile `tile` with a solid colour-1 pattern (low plane set)
fn write_solid_tile(mapper: &mut dyn Mapper, tile: u16) {
    for row in 0..8 {
        mapper.ppu_write(tile * 16 + row, 0xFF);
        mapper.ppu_write(tile * 16 + row + 8, 0x00);
    }
}

/// Fill the first background nametable with `tile`
fn fill_nametable(ppu: &mut Ppu, tile: u8) {
    for i in 0..(32 * 30) {
        let index = ppu.mirror_nametable(0x2000 + i);
        ppu.vram[index] = tile;
    }
}

#[test]
fn test_background_renders_colour_one() {
    let (mut ppu, mut mapper) = ppu_with_mapper();
    ppu.reset();
    write_solid_tile(mapper.as_mut(), 1);
    fill_nametable(&mut ppu, 1);
    ppu.palette_ram[0] = 0x0F;
    ppu.palette_ram[1] = 0x21;
    ppu.write_register(0x2001, MASK_SHOW_BG | MASK_SHOW_BG_LEFT, mapper.as_mut());

    // Render a couple of scanlines
    step_to(&mut ppu, mapper.as_mut(), 2, 0);

    // Every pixel of line 1 should carry palette index 1
    for x in 0..PPU_WIDTH {
        assert_eq!(ppu.frame_buffer[PPU_WIDTH + x], 1, "pixel {}", x);
    }
}

#[test]
fn test_background_hidden_when_disabled() {
    let (mut ppu, mut mapper) = ppu_with_mapper();
    ppu.reset();
    write_solid_tile(mapper.as_mut(), 1);
    fill_nametable(&mut ppu, 1);

    step_to(&mut ppu, mapper.as_mut(), 2, 0);
    for x in 0..PPU_WIDTH {
        assert_eq!(ppu.frame_buffer[PPU_WIDTH + x], 0);
    }
}

#[test]
fn test_left_column_mask_blanks_background() {
    let (mut ppu, mut mapper) = ppu_with_mapper();
    ppu.reset();
    write_solid_tile(mapper.as_mut(), 1);
    fill_nametable(&mut ppu, 1);
    // Background on, left-8 mask off
    ppu.write_register(0x2001, MASK_SHOW_BG, mapper.as_mut());

    step_to(&mut ppu, mapper.as_mut(), 2, 0);
    for x in 0..8 {
        assert_eq!(ppu.frame_buffer[PPU_WIDTH + x], 0);
    }
    assert_eq!(ppu.frame_buffer[PPU_WIDTH + 8], 1);
}

#[test]
fn test_sprite_renders_with_offset_row() {
    let (mut ppu, mut mapper) = ppu_with_mapper();
    ppu.reset();
    write_solid_tile(mapper.as_mut(), 2);

    // Sprite 0 at x=32, OAM y=10: first visible row is scanline 11
    ppu.oam[0] = 10;
    ppu.oam[1] = 2;
    ppu.oam[2] = 0x00; // palette 0, in front
    ppu.oam[3] = 32;
    ppu.write_register(
        0x2001,
        MASK_SHOW_SPRITES | MASK_SHOW_SPRITES_LEFT,
        mapper.as_mut(),
    );

    step_to(&mut ppu, mapper.as_mut(), 13, 0);

    // Line 10 has no sprite yet, line 11 does
    assert_eq!(ppu.frame_buffer[10 * PPU_WIDTH + 32], 0);
    assert_eq!(ppu.frame_buffer[11 * PPU_WIDTH + 32], 0x11);
    assert_eq!(ppu.frame_buffer[11 * PPU_WIDTH + 39], 0x11);
    assert_eq!(ppu.frame_buffer[11 * PPU_WIDTH + 40], 0);
}

#[test]
fn test_sprite_zero_hit_requires_both_layers() {
    let (mut ppu, mut mapper) = ppu_with_mapper();
    ppu.reset();
    write_solid_tile(mapper.as_mut(), 1);
    write_solid_tile(mapper.as_mut(), 2);
    fill_nametable(&mut ppu, 1);

    ppu.oam[0] = 10;
    ppu.oam[1] = 2;
    ppu.oam[2] = 0x00;
    ppu.oam[3] = 32;

    // Sprites only: no hit
    ppu.write_register(
        0x2001,
        MASK_SHOW_SPRITES | MASK_SHOW_SPRITES_LEFT,
        mapper.as_mut(),
    );
    step_to(&mut ppu, mapper.as_mut(), 20, 0);
    assert_eq!(ppu.status & STATUS_SPRITE_ZERO_HIT, 0);

    // Both layers: hit latches
    let (mut ppu, mut mapper) = ppu_with_mapper();
    ppu.reset();
    write_solid_tile(mapper.as_mut(), 1);
    write_solid_tile(mapper.as_mut(), 2);
    fill_nametable(&mut ppu, 1);
    ppu.oam[0] = 10;
    ppu.oam[1] = 2;
    ppu.oam[2] = 0x00;
    ppu.oam[3] = 32;
    ppu.write_register(
        0x2001,
        MASK_SHOW_BG | MASK_SHOW_BG_LEFT | MASK_SHOW_SPRITES | MASK_SHOW_SPRITES_LEFT,
        mapper.as_mut(),
    );
    step_to(&mut ppu, mapper.as_mut(), 20, 0);
    assert!(ppu.status & STATUS_SPRITE_ZERO_HIT != 0);
}

#[test]
fn test_sprite_priority_behind_background() {
    let (mut ppu, mut mapper) = ppu_with_mapper();
    ppu.reset();
    write_solid_tile(mapper.as_mut(), 1);
    write_solid_tile(mapper.as_mut(), 2);
    fill_nametable(&mut ppu, 1);

    ppu.oam[0] = 10;
    ppu.oam[1] = 2;
    ppu.oam[2] = 0x20; // behind background
    ppu.oam[3] = 32;
    ppu.write_register(
        0x2001,
        MASK_SHOW_BG | MASK_SHOW_BG_LEFT | MASK_SHOW_SPRITES | MASK_SHOW_SPRITES_LEFT,
        mapper.as_mut(),
    );

    step_to(&mut ppu, mapper.as_mut(), 13, 0);
    // Background wins where both are opaque
    assert_eq!(ppu.frame_buffer[11 * PPU_WIDTH + 32], 1);
}

#[test]
fn test_sprite_overflow_on_ninth_sprite() {
    let (mut ppu, mut mapper) = ppu_with_mapper();
    ppu.reset();
    write_solid_tile(mapper.as_mut(), 2);

    // Nine sprites stacked on the same lines
    for i in 0..9 {
        ppu.oam[i * 4] = 10;
        ppu.oam[i * 4 + 1] = 2;
        ppu.oam[i * 4 + 2] = 0;
        ppu.oam[i * 4 + 3] = (i * 8) as u8;
    }
    ppu.write_register(
        0x2001,
        MASK_SHOW_SPRITES | MASK_SHOW_SPRITES_LEFT,
        mapper.as_mut(),
    );

    step_to(&mut ppu, mapper.as_mut(), 13, 0);
    assert!(ppu.status & STATUS_SPRITE_OVERFLOW != 0);
}

#[test]
fn test_backdrop_follows_v_in_palette_space() {
    let (mut ppu, mut mapper) = ppu_with_mapper();
    ppu.reset();
    ppu.palette_ram[0x04] = 0x16;

    // Point v into palette space with rendering disabled
    ppu.write_register(0x2006, 0x3F, mapper.as_mut());
    ppu.write_register(0x2006, 0x04, mapper.as_mut());

    step_to(&mut ppu, mapper.as_mut(), 2, 0);
    assert_eq!(ppu.frame_buffer[PPU_WIDTH + 10], 0x04);
}

#[test]
fn test_render_rgba_maps_through_palettes() {
    let (mut ppu, _mapper) = ppu_with_mapper();
    ppu.palette_ram[0] = 0x0F; // black
    ppu.palette_ram[1] = 0x20; // near-white
    ppu.frame_buffer[0] = 1;

    let mut out = vec![0u8; PPU_WIDTH * crate::ppu::PPU_HEIGHT * 4];
    ppu.render_rgba(&mut out);

    // First pixel bright, alpha opaque
    assert!(out[0] > 0xF0 && out[1] > 0xF0 && out[2] > 0xF0);
    assert_eq!(out[3], 0xFF);
    // Second pixel is the backdrop (black-ish)
    assert!(out[4] < 0x20);
    assert_eq!(out[7], 0xFF);
}
