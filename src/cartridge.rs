//! iNES loader.
//!
//! Layout: 16 byte header, optional 512 byte trainer, PRG ROM in 16KB banks,
//! CHR ROM in 8KB banks (no CHR banks means the board carries 8KB of CHR RAM).

use std::{error::Error, fmt};

use tracing::{debug, info};

pub const HEADER_SIZE: usize = 16;
pub const TRAINER_SIZE: usize = 512;
pub const PRG_BANK_SIZE: usize = 0x4000;
pub const CHR_BANK_SIZE: usize = 0x2000;

const MAGIC: [u8; 4] = *b"NES\x1a";

// flags 6
const MIRRORING_VERTICAL: u8 = 0x01;
const HAS_BATTERY: u8 = 0x02;
const HAS_TRAINER: u8 = 0x04;
const FOUR_SCREEN: u8 = 0x08;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Missing or wrong `NES\x1A` magic, or fewer than 16 header bytes.
    InvalidHeader,
    UnsupportedMapper(u8),
    /// The image ends before the banks announced by the header.
    Truncated { expected: usize, actual: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::InvalidHeader => write!(f, "invalid iNES header"),
            LoadError::UnsupportedMapper(n) => write!(f, "unsupported mapper {}", n),
            LoadError::Truncated { expected, actual } => write!(
                f,
                "truncated iNES image: expected {} bytes, got {}",
                expected, actual
            ),
        }
    }
}

impl Error for LoadError {}

/// A parsed ROM image. Immutable once loaded; handed to a mapper which takes
/// ownership of the PRG/CHR data.
#[derive(Debug, Clone)]
pub struct Cartridge {
    pub prg_rom: Vec<u8>,
    pub chr: Vec<u8>,
    pub is_chr_ram: bool,
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    pub has_battery: bool,
    pub has_trainer: bool,
}

impl Cartridge {
    pub fn load(bytes: &[u8]) -> Result<Cartridge, LoadError> {
        if bytes.len() < HEADER_SIZE || bytes[0..4] != MAGIC {
            return Err(LoadError::InvalidHeader);
        }

        let prg_banks = bytes[4] as usize;
        let chr_banks = bytes[5] as usize;
        let flags6 = bytes[6];
        let flags7 = bytes[7];

        let mapper_id = (flags7 & 0xf0) | (flags6 >> 4);
        if mapper_id != 0 {
            return Err(LoadError::UnsupportedMapper(mapper_id));
        }

        let has_trainer = flags6 & HAS_TRAINER != 0;
        let prg_start = HEADER_SIZE + if has_trainer { TRAINER_SIZE } else { 0 };
        let prg_end = prg_start + prg_banks * PRG_BANK_SIZE;
        let chr_end = prg_end + chr_banks * CHR_BANK_SIZE;
        if bytes.len() < chr_end {
            return Err(LoadError::Truncated {
                expected: chr_end,
                actual: bytes.len(),
            });
        }
        if has_trainer {
            debug!("skipping {} byte trainer", TRAINER_SIZE);
        }

        let prg_rom = bytes[prg_start..prg_end].to_vec();
        let is_chr_ram = chr_banks == 0;
        let chr = if is_chr_ram {
            vec![0; CHR_BANK_SIZE]
        } else {
            bytes[prg_end..chr_end].to_vec()
        };

        let mirroring = if flags6 & FOUR_SCREEN != 0 {
            Mirroring::FourScreen
        } else if flags6 & MIRRORING_VERTICAL != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        info!(
            prg_banks,
            chr_banks,
            mapper = mapper_id,
            ?mirroring,
            "loaded iNES image"
        );

        Ok(Cartridge {
            prg_rom,
            chr,
            is_chr_ram,
            mapper_id,
            mirroring,
            has_battery: flags6 & HAS_BATTERY != 0,
            has_trainer,
        })
    }
}
