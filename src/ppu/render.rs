//! Scanline renderer. Runs once per visible line at dot 256 and writes the
//! whole line into the frame: background from the current `v`/fine X, then
//! up to eight sprites on top.

use crate::{mapper::MapperSlot, utils::get_bit};

use super::{
    frame::WIDTH,
    palette::SYSTEM_PALETTE,
    ppu::PPU,
    registers::{PPUMASK, PPUSTATUS},
};

const MAX_SPRITES_PER_LINE: usize = 8;
// 32 visible tiles plus the one the fine X scroll pulls in from the right
const LINE_TILES: usize = 33;

#[derive(Clone, Copy)]
struct SpritePixel {
    // palette RAM index, 0x11..=0x1f
    color: u8,
    behind_background: bool,
    sprite_zero: bool,
}

impl PPU {
    pub(super) fn render_scanline(&mut self, slot: &MapperSlot) {
        let y = self.scanline as usize;
        if !self.rendering_enabled() {
            let backdrop = self.color(0);
            self.curr_frame.fill_row(y, backdrop);
            return;
        }

        let background = self.background_line(slot);
        let sprites = self.sprite_line(slot);
        let show_background = self.ppumask.contains(PPUMASK::SHOW_BACKGROUND);
        let show_sprites = self.ppumask.contains(PPUMASK::SHOW_SPRITES);

        for x in 0..WIDTH {
            let mut bg = background[x];
            if !show_background || (x < 8 && !self.ppumask.contains(PPUMASK::SHOW_BACKGROUND_LEFTMOST)) {
                bg = 0;
            }
            let mut sprite = sprites[x];
            if !show_sprites || (x < 8 && !self.ppumask.contains(PPUMASK::SHOW_SPRITES_LEFTMOST)) {
                sprite = None;
            }

            let idx = match sprite {
                Some(sp) => {
                    if sp.sprite_zero && bg != 0 && x != 255 {
                        self.ppustatus.insert(PPUSTATUS::SPRITE_0_HIT);
                    }
                    if sp.behind_background && bg != 0 {
                        bg
                    } else {
                        sp.color
                    }
                }
                None => bg,
            };
            let rgb = self.color(idx);
            self.curr_frame.set_pixel(x, y, rgb);
        }
    }

    /// Palette RAM index -> RGB. Colour 0 of every palette shows the backdrop.
    fn color(&self, idx: u8) -> (u8, u8, u8) {
        let idx = if idx & 0x03 == 0 { 0 } else { idx };
        let mut entry = self.bus.palette(idx);
        if self.ppumask.contains(PPUMASK::GRAYSCALE) {
            entry &= 0x30;
        }
        SYSTEM_PALETTE[entry as usize]
    }

    /// 4-bit palette indices for the 256 visible pixels; 0 is transparent.
    fn background_line(&self, slot: &MapperSlot) -> [u8; WIDTH] {
        let mut buffer = [0u8; LINE_TILES * 8];
        let mut v = self.vram_addr;
        let fine_y = v.fine_y();
        let table = self.ppuctrl.background_table();

        for tile in 0..LINE_TILES {
            let addr = v.get();
            let tile_id = self.bus.read_memory(slot, 0x2000 | (addr & 0x0fff));
            let attr = self.bus.read_memory(
                slot,
                0x23c0 | (addr & 0x0c00) | ((addr >> 4) & 0x38) | ((addr >> 2) & 0x07),
            );
            // each attribute byte covers 4x4 tiles, two bits per 2x2 quadrant
            let shift = ((v.coarse_y() & 0x02) << 1) | (v.coarse_x() & 0x02);
            let group = (attr >> shift) & 0x03;

            let row = table + tile_id as u16 * 16 + fine_y;
            let lo_plane = self.bus.read_memory(slot, row);
            let hi_plane = self.bus.read_memory(slot, row + 8);

            for px in 0..8 {
                let bit = 7 - px as u8;
                let value = get_bit(hi_plane, bit) << 1 | get_bit(lo_plane, bit);
                if value != 0 {
                    buffer[tile * 8 + px] = group << 2 | value;
                }
            }
            v.increment_x();
        }

        let mut line = [0u8; WIDTH];
        let fine_x = self.fine_x_scroll as usize;
        line.copy_from_slice(&buffer[fine_x..fine_x + WIDTH]);
        line
    }

    /// Evaluates OAM for the current line and rasterises the hits. Lower OAM
    /// indices win overlaps; a ninth sprite on the line sets the overflow flag.
    fn sprite_line(&mut self, slot: &MapperSlot) -> [Option<SpritePixel>; WIDTH] {
        let mut line = [None; WIDTH];
        let y = self.scanline;
        let height = self.ppuctrl.sprite_height();

        let mut found = 0;
        for i in 0..64 {
            let entry = &self.oam[i * 4..i * 4 + 4];
            let top = entry[0] as u16 + 1;
            if y < top || y >= top + height {
                continue;
            }
            if found == MAX_SPRITES_PER_LINE {
                self.ppustatus.insert(PPUSTATUS::SPRITE_OVERFLOW);
                break;
            }
            found += 1;

            let (tile, attr, left) = (entry[1] as u16, entry[2], entry[3] as usize);
            let flip_h = attr & 0x40 != 0;
            let flip_v = attr & 0x80 != 0;
            let mut row = y - top;
            if flip_v {
                row = height - 1 - row;
            }
            let (table, tile) = if height == 16 {
                ((tile & 0x01) * 0x1000, (tile & 0xfe) + row / 8)
            } else {
                (self.ppuctrl.sprite_table(), tile)
            };
            let addr = table + tile * 16 + (row % 8);
            let lo_plane = self.bus.read_memory(slot, addr);
            let hi_plane = self.bus.read_memory(slot, addr + 8);

            for px in 0..8 {
                let x = left + px;
                if x >= WIDTH {
                    break;
                }
                let bit = if flip_h { px as u8 } else { 7 - px as u8 };
                let value = get_bit(hi_plane, bit) << 1 | get_bit(lo_plane, bit);
                if value == 0 || line[x].is_some() {
                    continue;
                }
                line[x] = Some(SpritePixel {
                    color: 0x10 | (attr & 0x03) << 2 | value,
                    behind_background: attr & 0x20 != 0,
                    sprite_zero: i == 0,
                });
            }
        }
        line
    }
}

#[cfg(test)]
mod render_test {
    use crate::{
        mapper::MapperSlot,
        ppu::{palette::SYSTEM_PALETTE, registers::PPUSTATUS, PPU},
        test_utils::InesBuilder,
    };
    use crate::{cartridge::Cartridge, mapper};

    // left table: tile 1 solid colour 1, tile 2 solid colour 3, tile 3 only
    // the left half of its top row, tile 4 solid colour 1.
    // right table: tile 4 solid colour 2, tile 5 solid colour 3.
    fn slot() -> MapperSlot {
        let mut builder = InesBuilder::new();
        builder.chr[16..24].fill(0xff);
        builder.chr[32..48].fill(0xff);
        builder.chr[48] = 0xf0;
        builder.chr[64..72].fill(0xff);
        builder.chr[0x1048..0x1050].fill(0xff);
        builder.chr[0x1050..0x1060].fill(0xff);
        let cart = Cartridge::load(&builder.build()).unwrap();
        Some(mapper::from_cartridge(cart).unwrap())
    }

    fn write_vram(ppu: &mut PPU, slot: &mut MapperSlot, addr: u16, data: &[u8]) {
        ppu.write_register(6, (addr >> 8) as u8, slot);
        ppu.write_register(6, (addr & 0xff) as u8, slot);
        for byte in data {
            ppu.write_register(7, *byte, slot);
        }
    }

    fn palettes(ppu: &mut PPU, slot: &mut MapperSlot) {
        // backdrop 0x0f, bg palette 0 = 0x01 0x02 0x03, sprite palette 0 = 0x16 0x17 0x18
        write_vram(ppu, slot, 0x3f00, &[0x0f, 0x01, 0x02, 0x03]);
        write_vram(ppu, slot, 0x3f10, &[0x0f, 0x16, 0x17, 0x18]);
    }

    // every sprite parked below the screen
    fn clear_oam(ppu: &mut PPU) {
        ppu.write_dma(&[0xff; 256]);
    }

    fn run_to_line_end(ppu: &mut PPU, slot: &MapperSlot, line: u16) {
        while !(ppu.scanline() == line && ppu.cycle() == 257) {
            ppu.step(slot)
        }
    }

    #[test]
    fn test_disabled_rendering_fills_backdrop() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        write_vram(&mut ppu, &mut slot, 0x3f00, &[0x21]);
        run_to_line_end(&mut ppu, &slot, 10);
        assert_eq!(ppu.frame().pixel(0, 10), SYSTEM_PALETTE[0x21]);
        assert_eq!(ppu.frame().pixel(255, 10), SYSTEM_PALETTE[0x21]);
    }

    #[test]
    fn test_background_tile_colour() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        palettes(&mut ppu, &mut slot);
        // tile (1, 0) uses pattern 1
        write_vram(&mut ppu, &mut slot, 0x2001, &[0x01]);
        ppu.write_register(6, 0x00, &mut slot);
        ppu.write_register(6, 0x00, &mut slot);
        ppu.write_register(1, 0x0a, &mut slot);

        run_to_line_end(&mut ppu, &slot, 0);
        assert_eq!(ppu.frame().pixel(7, 0), SYSTEM_PALETTE[0x0f]);
        assert_eq!(ppu.frame().pixel(8, 0), SYSTEM_PALETTE[0x01]);
        assert_eq!(ppu.frame().pixel(15, 0), SYSTEM_PALETTE[0x01]);
        assert_eq!(ppu.frame().pixel(16, 0), SYSTEM_PALETTE[0x0f]);
    }

    #[test]
    fn test_fine_x_scroll_shifts_pixels() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        palettes(&mut ppu, &mut slot);
        write_vram(&mut ppu, &mut slot, 0x2001, &[0x01]);
        ppu.write_register(6, 0x00, &mut slot);
        ppu.write_register(6, 0x00, &mut slot);
        ppu.write_register(5, 0x03, &mut slot);
        ppu.write_register(5, 0x00, &mut slot);
        ppu.write_register(1, 0x0a, &mut slot);

        run_to_line_end(&mut ppu, &slot, 0);
        assert_eq!(ppu.frame().pixel(4, 0), SYSTEM_PALETTE[0x0f]);
        assert_eq!(ppu.frame().pixel(5, 0), SYSTEM_PALETTE[0x01]);
        assert_eq!(ppu.frame().pixel(12, 0), SYSTEM_PALETTE[0x01]);
        assert_eq!(ppu.frame().pixel(13, 0), SYSTEM_PALETTE[0x0f]);
    }

    #[test]
    fn test_attribute_selects_palette() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        write_vram(&mut ppu, &mut slot, 0x3f00, &[0x0f, 0x01, 0x02, 0x03, 0x0f, 0x11, 0x12, 0x13]);
        write_vram(&mut ppu, &mut slot, 0x2000, &[0x01, 0x01, 0x01]);
        // top-left quadrant -> palette 0, top-right quadrant -> palette 1
        write_vram(&mut ppu, &mut slot, 0x23c0, &[0b0000_0100]);
        ppu.write_register(6, 0x00, &mut slot);
        ppu.write_register(6, 0x00, &mut slot);
        ppu.write_register(1, 0x0a, &mut slot);

        run_to_line_end(&mut ppu, &slot, 0);
        assert_eq!(ppu.frame().pixel(8, 0), SYSTEM_PALETTE[0x01]);
        assert_eq!(ppu.frame().pixel(16, 0), SYSTEM_PALETTE[0x11]);
    }

    #[test]
    fn test_sprite_zero_hit() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        palettes(&mut ppu, &mut slot);
        write_vram(&mut ppu, &mut slot, 0x2000, &[0x01; 4]);
        ppu.write_register(6, 0x00, &mut slot);
        ppu.write_register(6, 0x00, &mut slot);
        // sprite 0 at x=16, first row on line 5, tile 2 (colour 3)
        clear_oam(&mut ppu);
        ppu.write_register(3, 0x00, &mut slot);
        for byte in [4, 2, 0, 16] {
            ppu.write_register(4, byte, &mut slot);
        }
        ppu.write_register(1, 0x1e, &mut slot);

        run_to_line_end(&mut ppu, &slot, 4);
        assert!(!ppu.status().contains(PPUSTATUS::SPRITE_0_HIT));
        run_to_line_end(&mut ppu, &slot, 5);
        assert!(ppu.status().contains(PPUSTATUS::SPRITE_0_HIT));
        assert_eq!(ppu.frame().pixel(16, 5), SYSTEM_PALETTE[0x18]);
        assert_eq!(ppu.frame().pixel(15, 5), SYSTEM_PALETTE[0x01]);
    }

    #[test]
    fn test_sprite_behind_background() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        palettes(&mut ppu, &mut slot);
        write_vram(&mut ppu, &mut slot, 0x2002, &[0x01]);
        ppu.write_register(6, 0x00, &mut slot);
        ppu.write_register(6, 0x00, &mut slot);
        // priority bit set; x=12 straddles a transparent and an opaque tile
        clear_oam(&mut ppu);
        ppu.write_register(3, 0x00, &mut slot);
        for byte in [0, 2, 0x20, 12] {
            ppu.write_register(4, byte, &mut slot);
        }
        ppu.write_register(1, 0x1e, &mut slot);

        run_to_line_end(&mut ppu, &slot, 1);
        assert_eq!(ppu.frame().pixel(12, 1), SYSTEM_PALETTE[0x18]);
        assert_eq!(ppu.frame().pixel(16, 1), SYSTEM_PALETTE[0x01]);
    }

    fn write_sprites(ppu: &mut PPU, slot: &mut MapperSlot, sprites: &[[u8; 4]]) {
        clear_oam(ppu);
        ppu.write_register(3, 0x00, slot);
        for sprite in sprites {
            for byte in sprite {
                ppu.write_register(4, *byte, slot);
            }
        }
    }

    #[test]
    fn test_sprite_flips() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        palettes(&mut ppu, &mut slot);
        // tile 3 unflipped at x=120, flipped horizontally at 40, vertically at 80
        write_sprites(
            &mut ppu,
            &mut slot,
            &[[9, 3, 0x00, 120], [9, 3, 0x40, 40], [9, 3, 0x80, 80]],
        );
        ppu.write_register(1, 0x14, &mut slot);

        run_to_line_end(&mut ppu, &slot, 10);
        assert_eq!(ppu.frame().pixel(120, 10), SYSTEM_PALETTE[0x16]);
        assert_eq!(ppu.frame().pixel(124, 10), SYSTEM_PALETTE[0x0f]);
        assert_eq!(ppu.frame().pixel(40, 10), SYSTEM_PALETTE[0x0f]);
        assert_eq!(ppu.frame().pixel(44, 10), SYSTEM_PALETTE[0x16]);
        assert_eq!(ppu.frame().pixel(47, 10), SYSTEM_PALETTE[0x16]);
        assert_eq!(ppu.frame().pixel(80, 10), SYSTEM_PALETTE[0x0f]);

        run_to_line_end(&mut ppu, &slot, 17);
        assert_eq!(ppu.frame().pixel(80, 17), SYSTEM_PALETTE[0x16]);
        assert_eq!(ppu.frame().pixel(84, 17), SYSTEM_PALETTE[0x0f]);
        assert_eq!(ppu.frame().pixel(120, 17), SYSTEM_PALETTE[0x0f]);
    }

    #[test]
    fn test_tall_sprites_use_tile_bit_zero_table() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        palettes(&mut ppu, &mut slot);
        // tile byte 5: right table, tiles 4 and 5
        write_sprites(&mut ppu, &mut slot, &[[4, 5, 0x00, 32]]);
        ppu.write_register(0, 0x20, &mut slot);
        ppu.write_register(1, 0x14, &mut slot);

        run_to_line_end(&mut ppu, &slot, 5);
        assert_eq!(ppu.frame().pixel(32, 5), SYSTEM_PALETTE[0x17]);
        run_to_line_end(&mut ppu, &slot, 12);
        assert_eq!(ppu.frame().pixel(39, 12), SYSTEM_PALETTE[0x17]);
        run_to_line_end(&mut ppu, &slot, 13);
        assert_eq!(ppu.frame().pixel(32, 13), SYSTEM_PALETTE[0x18]);
        run_to_line_end(&mut ppu, &slot, 20);
        assert_eq!(ppu.frame().pixel(32, 20), SYSTEM_PALETTE[0x18]);
        run_to_line_end(&mut ppu, &slot, 21);
        assert_eq!(ppu.frame().pixel(32, 21), SYSTEM_PALETTE[0x0f]);
    }

    #[test]
    fn test_tall_sprite_vertical_flip_swaps_halves() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        palettes(&mut ppu, &mut slot);
        write_sprites(&mut ppu, &mut slot, &[[4, 5, 0x80, 32]]);
        ppu.write_register(0, 0x20, &mut slot);
        ppu.write_register(1, 0x14, &mut slot);

        run_to_line_end(&mut ppu, &slot, 5);
        assert_eq!(ppu.frame().pixel(32, 5), SYSTEM_PALETTE[0x18]);
        run_to_line_end(&mut ppu, &slot, 13);
        assert_eq!(ppu.frame().pixel(32, 13), SYSTEM_PALETTE[0x17]);
    }

    #[test]
    fn test_grayscale_masks_palette_entry() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        write_vram(&mut ppu, &mut slot, 0x3f00, &[0x0f, 0x16]);
        write_vram(&mut ppu, &mut slot, 0x2001, &[0x01]);
        ppu.write_register(6, 0x00, &mut slot);
        ppu.write_register(6, 0x00, &mut slot);
        ppu.write_register(1, 0x0b, &mut slot);

        run_to_line_end(&mut ppu, &slot, 0);
        assert_eq!(ppu.frame().pixel(8, 0), SYSTEM_PALETTE[0x10]);
        assert_eq!(ppu.frame().pixel(0, 0), SYSTEM_PALETTE[0x00]);
    }

    #[test]
    fn test_left_column_clipping() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        palettes(&mut ppu, &mut slot);
        write_vram(&mut ppu, &mut slot, 0x2000, &[0x01, 0x01]);
        ppu.write_register(6, 0x00, &mut slot);
        ppu.write_register(6, 0x00, &mut slot);
        // tile 2 sprite over x=4..=11, rows on lines 1..=8
        write_sprites(&mut ppu, &mut slot, &[[0, 2, 0x00, 4]]);
        ppu.write_register(1, 0x18, &mut slot);

        run_to_line_end(&mut ppu, &slot, 1);
        assert_eq!(ppu.frame().pixel(0, 1), SYSTEM_PALETTE[0x0f]);
        assert_eq!(ppu.frame().pixel(4, 1), SYSTEM_PALETTE[0x0f]);
        assert_eq!(ppu.frame().pixel(7, 1), SYSTEM_PALETTE[0x0f]);
        assert_eq!(ppu.frame().pixel(8, 1), SYSTEM_PALETTE[0x18]);
        assert_eq!(ppu.frame().pixel(12, 1), SYSTEM_PALETTE[0x01]);

        ppu.write_register(1, 0x1e, &mut slot);
        run_to_line_end(&mut ppu, &slot, 2);
        assert_eq!(ppu.frame().pixel(0, 2), SYSTEM_PALETTE[0x01]);
        assert_eq!(ppu.frame().pixel(4, 2), SYSTEM_PALETTE[0x18]);
    }

    #[test]
    fn test_next_tile_row_after_pre_render_line() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        palettes(&mut ppu, &mut slot);
        write_vram(&mut ppu, &mut slot, 0x2000, &[0x02]);
        write_vram(&mut ppu, &mut slot, 0x2020, &[0x01]);
        // v left pointing somewhere else, t scrolled to the top-left
        ppu.write_register(6, 0x21, &mut slot);
        ppu.write_register(6, 0x23, &mut slot);
        ppu.write_register(0, 0x00, &mut slot);
        ppu.write_register(5, 0x00, &mut slot);
        ppu.write_register(5, 0x00, &mut slot);
        assert_eq!(ppu.temp_vram_addr(), 0);
        assert_eq!(ppu.vram_addr(), 0x2123);
        ppu.write_register(1, 0x0a, &mut slot);

        run_to_line_end(&mut ppu, &slot, 261);
        while ppu.cycle() != 305 {
            ppu.step(&slot);
        }
        assert_eq!(ppu.vram_addr(), 0);
        run_to_line_end(&mut ppu, &slot, 7);
        assert_eq!(ppu.frame().pixel(0, 7), SYSTEM_PALETTE[0x03]);
        run_to_line_end(&mut ppu, &slot, 8);
        assert_eq!(ppu.frame().pixel(0, 8), SYSTEM_PALETTE[0x01]);
        assert_eq!(ppu.frame().pixel(8, 8), SYSTEM_PALETTE[0x0f]);
    }

    #[test]
    fn test_sprite_overflow() {
        let mut ppu = PPU::new();
        let mut slot = slot();
        clear_oam(&mut ppu);
        ppu.write_register(3, 0x00, &mut slot);
        for i in 0..9u8 {
            for byte in [9, 2, 0, i * 8] {
                ppu.write_register(4, byte, &mut slot);
            }
        }
        ppu.write_register(1, 0x10, &mut slot);

        run_to_line_end(&mut ppu, &slot, 9);
        assert!(!ppu.status().contains(PPUSTATUS::SPRITE_OVERFLOW));
        run_to_line_end(&mut ppu, &slot, 10);
        assert!(ppu.status().contains(PPUSTATUS::SPRITE_OVERFLOW));
    }
}
