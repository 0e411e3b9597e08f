//! 2C02 picture unit: register file, dot/scanline timing, scanline renderer.

pub mod frame;
pub mod palette;
mod ppu;
pub mod ppubus;
pub mod registers;
mod render;

pub use frame::{Frame, FRAME_BYTES, HEIGHT, WIDTH};
pub use ppu::{PPU, DOTS_PER_SCANLINE, SCANLINES_PER_FRAME};
