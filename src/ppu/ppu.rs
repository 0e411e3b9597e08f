use tracing::trace;

use crate::mapper::MapperSlot;

use super::{
    frame::{Frame, FRAME_BYTES},
    ppubus::PPUBus,
    registers::{VramAddr, PPUCTRL, PPUMASK, PPUSTATUS},
};

pub const DOTS_PER_SCANLINE: u16 = 341;
pub const SCANLINES_PER_FRAME: u16 = 262;
pub const VBLANK_SCANLINE: u16 = 241;
pub const PRE_RENDER_SCANLINE: u16 = 261;
pub const VISIBLE_SCANLINES: u16 = 240;

pub struct PPU {
    pub(super) bus: PPUBus,
    pub(super) curr_frame: Frame,
    pub(super) oam: [u8; 64 * 4],
    // IO mapped registers
    pub(super) ppuctrl: PPUCTRL,
    pub(super) ppumask: PPUMASK,
    pub(super) ppustatus: PPUSTATUS,
    oamaddr: u8,
    // ********
    pub(super) vram_addr: VramAddr,
    temp_vram_addr: VramAddr,
    pub(super) fine_x_scroll: u8,
    write_toggle: bool,
    data_buffer: u8,
    // last value driven onto $2000-$2007, in either direction
    io_latch: u8,
    nmi_pin: bool,
    frame_complete: bool,
    frame_count: u64,
    cycle: u16,
    pub(super) scanline: u16,
}

impl PPU {
    pub fn new() -> PPU {
        PPU {
            bus: PPUBus::new(),
            curr_frame: Frame::new(),
            oam: [0; 64 * 4],
            ppuctrl: PPUCTRL::empty(),
            ppumask: PPUMASK::empty(),
            ppustatus: PPUSTATUS::empty(),
            oamaddr: 0,
            vram_addr: VramAddr::default(),
            temp_vram_addr: VramAddr::default(),
            fine_x_scroll: 0,
            write_toggle: false,
            data_buffer: 0,
            io_latch: 0,
            nmi_pin: false,
            frame_complete: false,
            frame_count: 0,
            cycle: 0,
            scanline: 0,
        }
    }

    /// Registers and timing go back to power-up values; VRAM, palette and OAM
    /// keep their contents.
    pub fn reset(&mut self) {
        self.ppuctrl = PPUCTRL::empty();
        self.ppumask = PPUMASK::empty();
        self.ppustatus = PPUSTATUS::empty();
        self.oamaddr = 0;
        self.vram_addr = VramAddr::default();
        self.temp_vram_addr = VramAddr::default();
        self.fine_x_scroll = 0;
        self.write_toggle = false;
        self.data_buffer = 0;
        self.io_latch = 0;
        self.nmi_pin = false;
        self.frame_complete = false;
        self.cycle = 0;
        self.scanline = 0;
    }

    pub fn rendering_enabled(&self) -> bool {
        self.ppumask.rendering_enabled()
    }

    /// Advances one dot, then runs whatever the hardware does on that dot.
    pub fn step(&mut self, slot: &MapperSlot) {
        self.cycle += 1;
        if self.cycle == DOTS_PER_SCANLINE {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline == SCANLINES_PER_FRAME {
                self.scanline = 0;
            }
        }

        let visible = self.scanline < VISIBLE_SCANLINES;
        if visible && self.cycle == 256 {
            self.render_scanline(slot);
        }

        if (visible || self.scanline == PRE_RENDER_SCANLINE) && self.rendering_enabled() {
            match self.cycle {
                256 => self.vram_addr.increment_y(),
                257 => self.vram_addr.copy_horizontal(self.temp_vram_addr),
                280..=304 if self.scanline == PRE_RENDER_SCANLINE => {
                    self.vram_addr.copy_vertical(self.temp_vram_addr)
                }
                _ => {}
            }
        }

        if self.cycle == 1 {
            if self.scanline == VBLANK_SCANLINE {
                self.ppustatus.insert(PPUSTATUS::VBLANK_STARTED);
                if self.ppuctrl.contains(PPUCTRL::GENERATE_NMI) {
                    self.nmi_pin = true
                }
                self.frame_complete = true;
                self.frame_count += 1;
                trace!(frame = self.frame_count, nmi = self.nmi_pin, "vblank");
            } else if self.scanline == PRE_RENDER_SCANLINE {
                self.ppustatus.remove(
                    PPUSTATUS::VBLANK_STARTED | PPUSTATUS::SPRITE_0_HIT | PPUSTATUS::SPRITE_OVERFLOW,
                );
            }
        }
    }

    /// Consumes a pending NMI request.
    pub fn poll_generate_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pin)
    }

    // $2000-$2007, `reg` already reduced to 0..=7
    pub fn read_register(&mut self, reg: u16, slot: &MapperSlot) -> u8 {
        let value = match reg {
            2 => self.read_ppustatus(),
            4 => self.read_oamdata(),
            7 => self.read_ppudata(slot),
            // write-only registers read back whatever the latch holds
            _ => self.io_latch,
        };
        self.io_latch = value;
        value
    }

    pub fn write_register(&mut self, reg: u16, data: u8, slot: &mut MapperSlot) {
        self.io_latch = data;
        match reg {
            0 => self.write_ppuctrl(data),
            1 => self.ppumask.update(data),
            2 => {}
            3 => self.oamaddr = data,
            4 => self.write_oamdata(data),
            5 => self.write_ppuscroll(data),
            6 => self.write_ppuaddr(data),
            _ => self.write_ppudata(slot, data),
        }
    }

    fn write_ppuctrl(&mut self, data: u8) {
        let prev_nmi_out = self.ppuctrl.contains(PPUCTRL::GENERATE_NMI);
        self.ppuctrl.update(data);
        self.temp_vram_addr.set_nametable(self.ppuctrl.nametable_bits());
        if !prev_nmi_out
            && self.ppuctrl.contains(PPUCTRL::GENERATE_NMI)
            && self.ppustatus.contains(PPUSTATUS::VBLANK_STARTED)
        {
            self.nmi_pin = true
        }
    }

    fn read_ppustatus(&mut self) -> u8 {
        let value = self.ppustatus.bits() | (self.io_latch & 0x1f);
        self.ppustatus.remove(PPUSTATUS::VBLANK_STARTED);
        self.write_toggle = false;
        value
    }

    fn read_oamdata(&self) -> u8 {
        self.oam[self.oamaddr as usize]
    }

    fn write_oamdata(&mut self, data: u8) {
        self.oam[self.oamaddr as usize] = data;
        self.oamaddr = self.oamaddr.wrapping_add(1)
    }

    fn write_ppuscroll(&mut self, data: u8) {
        if !self.write_toggle {
            self.temp_vram_addr.set_coarse_x(data >> 3);
            self.fine_x_scroll = data & 0x07;
        } else {
            self.temp_vram_addr.set_coarse_y(data >> 3);
            self.temp_vram_addr.set_fine_y(data & 0x07);
        }
        self.write_toggle = !self.write_toggle;
    }

    fn write_ppuaddr(&mut self, data: u8) {
        if !self.write_toggle {
            self.temp_vram_addr.set_high(data);
        } else {
            self.temp_vram_addr.set_low(data);
            self.vram_addr = self.temp_vram_addr;
        }
        self.write_toggle = !self.write_toggle;
    }

    fn increment_vram_addr(&mut self) {
        self.vram_addr.increment_by(self.ppuctrl.vram_increment())
    }

    // Reads lag one behind, except palette reads which are answered at once
    // (the buffer is refilled from the nametable underneath the palette).
    fn read_ppudata(&mut self, slot: &MapperSlot) -> u8 {
        let addr = self.vram_addr.get() & 0x3fff;
        let read = if addr >= 0x3f00 {
            self.data_buffer = self.bus.read_memory(slot, addr - 0x1000);
            self.bus.read_memory(slot, addr)
        } else {
            let read = self.data_buffer;
            self.data_buffer = self.bus.read_memory(slot, addr);
            read
        };
        self.increment_vram_addr();
        read
    }

    fn write_ppudata(&mut self, slot: &mut MapperSlot, data: u8) {
        self.bus.write_memory(slot, self.vram_addr.get(), data);
        self.increment_vram_addr()
    }

    /// OAM DMA: the page lands at OAMADDR and wraps around.
    pub fn write_dma(&mut self, bytes: &[u8; 256]) {
        bytes.iter().enumerate().for_each(|(i, byte)| {
            let idx = self.oamaddr.wrapping_add(i as u8);
            self.oam[idx as usize] = *byte
        })
    }

    /// Hands out the finished frame once per vblank.
    pub fn take_frame(&mut self) -> Option<&[u8; FRAME_BYTES]> {
        if !self.frame_complete {
            return None;
        }
        self.frame_complete = false;
        Some(self.curr_frame.data())
    }

    pub fn frame(&self) -> &Frame {
        &self.curr_frame
    }
    pub fn frame_complete(&self) -> bool {
        self.frame_complete
    }
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
    pub fn scanline(&self) -> u16 {
        self.scanline
    }
    pub fn cycle(&self) -> u16 {
        self.cycle
    }
    pub fn status(&self) -> PPUSTATUS {
        self.ppustatus
    }
    pub fn vram_addr(&self) -> u16 {
        self.vram_addr.get()
    }
    pub fn temp_vram_addr(&self) -> u16 {
        self.temp_vram_addr.get()
    }
    pub fn fine_x_scroll(&self) -> u8 {
        self.fine_x_scroll
    }
    pub fn write_toggle(&self) -> bool {
        self.write_toggle
    }
    pub fn data_buffer(&self) -> u8 {
        self.data_buffer
    }
    pub fn oam(&self) -> &[u8; 256] {
        &self.oam
    }
}

impl Default for PPU {
    fn default() -> Self {
        PPU::new()
    }
}
