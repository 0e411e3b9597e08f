//! CPU address space. Owns RAM, the PPU and the cartridge slot, so the CPU
//! reaches the PPU only through register reads and writes here.

use tracing::{debug, trace, warn};

use crate::{
    cartridge::Mirroring,
    cpu::CpuBus,
    mapper::{Mapper, MapperSlot},
    ppu::PPU,
};

const CPU_INTERNAL_RAM: usize = 2048;
const PPU_DOTS_PER_CPU_CYCLE: u32 = 3;
const OAM_DMA_CYCLES: u32 = 513;

const OAMDMA: u16 = 0x4014;

pub struct Bus {
    ram: [u8; CPU_INTERNAL_RAM],
    ppu: PPU,
    mapper: MapperSlot,
    // CPU cycles seen by `tick`, used for the DMA odd-cycle penalty
    cycles: u64,
    // page copied, stall not yet charged to the CPU
    dma_pending: bool,
}

impl Bus {
    pub fn new() -> Bus {
        Bus {
            ram: [0; CPU_INTERNAL_RAM],
            ppu: PPU::new(),
            mapper: None,
            cycles: 0,
            dma_pending: false,
        }
    }

    /// Plugs in a cartridge. The PPU starts over since its nametable layout
    /// depends on the board.
    pub fn insert(&mut self, mapper: Box<dyn Mapper>) {
        if mapper.mirroring() == Mirroring::FourScreen {
            warn!("four-screen VRAM not supported, using vertical mirroring");
        }
        self.mapper = Some(mapper);
        self.ppu = PPU::new();
    }

    pub fn eject(&mut self) -> Option<Box<dyn Mapper>> {
        self.mapper.take()
    }

    pub fn has_cartridge(&self) -> bool {
        self.mapper.is_some()
    }

    /// Console reset: PPU registers and timing start over, RAM and VRAM keep
    /// their contents.
    pub fn reset(&mut self) {
        self.ppu.reset();
        self.cycles = 0;
        self.dma_pending = false;
    }

    // Everything below $2000 is 2KB of RAM repeated four times
    fn mirror_ram(addr: u16) -> usize {
        (addr & 0x07ff) as usize
    }

    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1fff => self.ram[Bus::mirror_ram(addr)],
            0x2000..=0x3fff => self.ppu.read_register(addr & 0x07, &self.mapper),
            // APU and controller ports
            0x4000..=0x4017 => 0,
            0x4018..=0x7fff => 0,
            0x8000..=0xffff => self.mapper.as_ref().map_or(0, |m| m.read_prg(addr)),
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1fff => self.ram[Bus::mirror_ram(addr)] = value,
            0x2000..=0x3fff => self.ppu.write_register(addr & 0x07, value, &mut self.mapper),
            OAMDMA => self.oam_dma(value),
            0x4000..=0x4017 => {}
            0x4018..=0x7fff => trace!(addr = format_args!("{:#06x}", addr), "write to unmapped area"),
            0x8000..=0xffff => {
                if let Some(mapper) = self.mapper.as_mut() {
                    mapper.write_prg(addr, value)
                }
            }
        }
    }

    /// Reads without side effects. PPU registers read as 0.
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1fff => self.ram[Bus::mirror_ram(addr)],
            0x8000..=0xffff => self.mapper.as_ref().map_or(0, |m| m.read_prg(addr)),
            _ => 0,
        }
    }

    fn oam_dma(&mut self, page: u8) {
        let base = (page as u16) << 8;
        let mut bytes = [0u8; 256];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.cpu_read(base | i as u16);
        }
        self.ppu.write_dma(&bytes);
        self.dma_pending = true;
        debug!(page = format_args!("{:#04x}", page), "OAM DMA");
    }

    /// Runs the PPU for `cycles` CPU cycles.
    pub fn tick(&mut self, cycles: u32) {
        for _ in 0..cycles * PPU_DOTS_PER_CPU_CYCLE {
            self.ppu.step(&self.mapper);
        }
        self.cycles += cycles as u64;
    }

    pub fn poll_nmi(&mut self) -> bool {
        self.ppu.poll_generate_nmi()
    }

    /// Cycles the CPU sits out for a DMA started by the last instruction.
    /// The transfer begins once that instruction has been ticked, so the
    /// odd-cycle penalty is decided against the count at that point.
    pub fn take_dma_stall(&mut self) -> u32 {
        if !std::mem::take(&mut self.dma_pending) {
            return 0;
        }
        let stall = OAM_DMA_CYCLES + (self.cycles & 1) as u32;
        trace!(cycle = self.cycles, stall, "DMA stall");
        stall
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn ppu(&self) -> &PPU {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut PPU {
        &mut self.ppu
    }
}

impl Default for Bus {
    fn default() -> Self {
        Bus::new()
    }
}

impl CpuBus for Bus {
    fn read(&mut self, addr: u16) -> u8 {
        self.cpu_read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.cpu_write(addr, value)
    }

    fn peek(&self, addr: u16) -> u8 {
        Bus::peek(self, addr)
    }

    fn poll_nmi(&mut self) -> bool {
        Bus::poll_nmi(self)
    }

    fn take_dma_stall(&mut self) -> u32 {
        Bus::take_dma_stall(self)
    }
}
