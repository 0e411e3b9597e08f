//! In-memory iNES images for tests.

use crate::{
    bus::Bus,
    cartridge::{Cartridge, CHR_BANK_SIZE, PRG_BANK_SIZE, TRAINER_SIZE},
    mapper,
};

pub struct InesBuilder {
    pub prg: Vec<u8>,
    pub chr: Vec<u8>,
    flags6: u8,
    flags7: u8,
}

impl InesBuilder {
    /// One 16KB PRG bank and one 8KB CHR bank, all zero.
    pub fn new() -> InesBuilder {
        InesBuilder {
            prg: vec![0; PRG_BANK_SIZE],
            chr: vec![0; CHR_BANK_SIZE],
            flags6: 0,
            flags7: 0,
        }
    }

    pub fn prg_banks(mut self, n: usize) -> Self {
        self.prg.resize(n * PRG_BANK_SIZE, 0);
        self
    }

    pub fn chr_banks(mut self, n: usize) -> Self {
        self.chr.resize(n * CHR_BANK_SIZE, 0);
        self
    }

    pub fn flags6(mut self, flags: u8) -> Self {
        self.flags6 = flags;
        self
    }

    pub fn flags7(mut self, flags: u8) -> Self {
        self.flags7 = flags;
        self
    }

    /// Copies `program` to $8000 and points the reset vector at it. NMI and
    /// IRQ vectors default to $9000 and $A000.
    pub fn program(mut self, program: &[u8]) -> Self {
        self.prg[..program.len()].copy_from_slice(program);
        self.vectors(0x9000, 0x8000, 0xa000)
    }

    /// Writes the vectors into the last PRG bank ($FFFA-$FFFF).
    pub fn vectors(mut self, nmi: u16, reset: u16, irq: u16) -> Self {
        let top = self.prg.len();
        for (i, v) in [nmi, reset, irq].into_iter().enumerate() {
            self.prg[top - 6 + i * 2] = (v & 0xff) as u8;
            self.prg[top - 5 + i * 2] = (v >> 8) as u8;
        }
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut rom = Vec::with_capacity(16 + self.prg.len() + self.chr.len());
        rom.extend_from_slice(b"NES\x1a");
        rom.push((self.prg.len() / PRG_BANK_SIZE) as u8);
        rom.push((self.chr.len() / CHR_BANK_SIZE) as u8);
        rom.push(self.flags6);
        rom.push(self.flags7);
        rom.extend_from_slice(&[0; 8]);
        if self.flags6 & 0x04 != 0 {
            rom.extend_from_slice(&[0xee; TRAINER_SIZE]);
        }
        rom.extend_from_slice(&self.prg);
        rom.extend_from_slice(&self.chr);
        rom
    }

    /// A bus with this image inserted.
    pub fn bus(&self) -> Bus {
        let mut bus = Bus::new();
        let cart = Cartridge::load(&self.build()).expect("valid test image");
        bus.insert(mapper::from_cartridge(cart).expect("mapper 0"));
        bus
    }
}
