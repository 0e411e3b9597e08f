use tracing::{enabled, info, trace, Level};

use crate::{
    bus::Bus,
    cartridge::{Cartridge, LoadError},
    cpu::{CpuError, CPU},
    debug,
    mapper,
    ppu::frame::{Frame, FRAME_BYTES},
};

/// A console: CPU plus a bus that owns everything else.
pub struct Emulator {
    cpu: CPU,
    bus: Bus,
}

impl Emulator {
    pub fn new() -> Emulator {
        Emulator {
            cpu: CPU::new(),
            bus: Bus::new(),
        }
    }

    /// Parses an iNES image, swaps in its mapper and resets. On error the
    /// current cartridge and machine state are left alone.
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        let cart = Cartridge::load(bytes)?;
        let mapper = mapper::from_cartridge(cart)?;
        self.bus.insert(mapper);
        self.reset();
        Ok(())
    }

    pub fn unload(&mut self) {
        self.bus.eject();
    }

    pub fn is_loaded(&self) -> bool {
        self.bus.has_cartridge()
    }

    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
        info!(pc = format_args!("{:#06x}", self.cpu.pc), "reset");
    }

    /// One CPU step (instruction, interrupt entry or DMA stall) with the PPU
    /// caught up behind it.
    pub fn step_instruction(&mut self) -> Result<u32, CpuError> {
        if enabled!(Level::TRACE) {
            trace!("{}", debug::trace(&self.cpu, &self.bus));
        }
        let cycles = self.cpu.step(&mut self.bus)?;
        self.bus.tick(cycles);
        Ok(cycles)
    }

    /// Steps until the PPU finishes a frame. Returns the CPU cycles spent.
    pub fn run_frame(&mut self) -> Result<u64, CpuError> {
        let start = self.bus.ppu().frame_count();
        let mut cycles = 0u64;
        while self.bus.ppu().frame_count() == start {
            cycles += self.step_instruction()? as u64;
        }
        Ok(cycles)
    }

    /// The finished frame, once per vblank.
    pub fn get_frame(&mut self) -> Option<&[u8; FRAME_BYTES]> {
        self.bus.ppu_mut().take_frame()
    }

    /// The frame buffer as it stands, finished or not.
    pub fn frame(&self) -> &Frame {
        self.bus.ppu().frame()
    }

    /// No APU yet, so never any samples.
    pub fn audio_samples(&self) -> &[f32] {
        &[]
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Emulator::new()
    }
}
